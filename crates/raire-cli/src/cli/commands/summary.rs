use super::{exit_codes, report_service_error, with_store};
use crate::cli::args::SummaryArgs;
use raire_core::errors::ServiceError;
use std::path::PathBuf;

pub async fn run(args: SummaryArgs, db: PathBuf) -> anyhow::Result<i32> {
    match args.contest {
        Some(contest) => {
            let name = contest.clone();
            let found = with_store(db, move |store| store.fetch_summary(&name)).await??;
            match found {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => {
                    return report_service_error(&ServiceError::no_assertions(format!(
                        "No assertions have been generated for contest '{}'.",
                        contest
                    )))
                }
            }
        }
        None => {
            let all = with_store(db, |store| store.list_summaries()).await??;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(exit_codes::OK)
}

use super::{exit_codes, report_service_error, with_store};
use crate::cli::args::GenerateArgs;
use raire_core::coordinator::generate;
use raire_core::model::GenerationRequest;
use raire_core::solver::load_solver_result;
use std::path::PathBuf;

pub async fn run(args: GenerateArgs, db: PathBuf) -> anyhow::Result<i32> {
    let result = load_solver_result(&args.solver_result)?;
    let request = GenerationRequest {
        contest_name: args.contest,
        total_auditable_ballots: args.universe_size,
        candidates: args.candidates,
    };

    match with_store(db, move |store| generate(store, &request, &result)).await? {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(exit_codes::OK)
        }
        Err(e) => report_service_error(&e),
    }
}

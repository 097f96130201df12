use super::{exit_codes, report_service_error, with_store};
use crate::cli::args::ProgressArgs;
use raire_core::coordinator::record_audit_progress;
use raire_core::model::AuditProgress;
use std::path::PathBuf;

pub async fn run(args: ProgressArgs, db: PathBuf) -> anyhow::Result<i32> {
    let progress = AuditProgress {
        current_risk: args.risk,
        estimated_samples_to_audit: args.estimated_samples,
        optimistic_samples_to_audit: args.optimistic_samples,
        two_vote_over_count: args.two_vote_over,
        one_vote_over_count: args.one_vote_over,
        other_count: args.other,
        one_vote_under_count: args.one_vote_under,
        two_vote_under_count: args.two_vote_under,
    };
    let (contest, id, expected) = (args.contest.clone(), args.assertion_id, args.expected_version);

    let outcome = with_store(db, move |store| {
        record_audit_progress(store, &contest, id, &progress, expected)
    })
    .await?;

    match outcome {
        Ok(version) => {
            println!(
                "{}",
                serde_json::json!({
                    "contest": args.contest,
                    "assertion_id": id,
                    "version": version,
                })
            );
            Ok(exit_codes::OK)
        }
        Err(e) => report_service_error(&e),
    }
}

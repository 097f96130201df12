use crate::errors::ServiceError;
use crate::model::{AuditProgress, ContestSummary, GenerationRequest};
use crate::solver::SolverResult;
use crate::storage::Store;
use crate::translate::{translate, TranslatedResult};

/// Replace everything stored for `contest_name` with `result` in one
/// transaction. The latest completed call determines what readers see.
pub fn persist(
    store: &Store,
    contest_name: &str,
    result: &TranslatedResult,
) -> Result<ContestSummary, ServiceError> {
    if result.contest_name() != contest_name {
        return Err(ServiceError::internal(format!(
            "translated result for '{}' cannot replace contest '{}'",
            result.contest_name(),
            contest_name
        )));
    }

    let stored = store
        .replace_contest(&result.summary, &result.assertions)
        .map_err(|e| ServiceError::storage("failed to store assertions", e))?;

    tracing::info!(
        event = "raire.persist",
        contest = %contest_name,
        assertions = result.assertions.len(),
        error_code = %stored.error_code.map(|c| c.as_str()).unwrap_or(""),
        "stored generation result"
    );
    Ok(stored)
}

/// Translate an engine result and store it.
///
/// Engine failures are stored as a zero-assertion summary and then returned
/// as `Err`, so later exports report the same failure. Local inconsistencies
/// are returned without touching the store.
pub fn generate(
    store: &Store,
    request: &GenerationRequest,
    result: &SolverResult,
) -> Result<ContestSummary, ServiceError> {
    let translated = match translate(request, result) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(
                event = "raire.translate.rejected",
                contest = %request.contest_name,
                code = %e.code,
                message = %e.message,
                "solver result rejected; nothing stored"
            );
            return Err(e);
        }
    };

    let stored = persist(store, &request.contest_name, &translated)?;
    match stored.stored_error() {
        Some(err) => Err(err),
        None => Ok(stored),
    }
}

/// Record audit progress for one stored assertion on behalf of the auditing
/// process. Returns the assertion's new version.
pub fn record_audit_progress(
    store: &Store,
    contest_name: &str,
    assertion_id: i64,
    progress: &AuditProgress,
    expected_version: Option<i64>,
) -> Result<i64, ServiceError> {
    progress.validate()?;
    let version = store
        .update_audit_progress(contest_name, assertion_id, progress, expected_version)
        .map_err(|e| ServiceError::storage("failed to record audit progress", e))?;

    match version {
        Some(v) => {
            tracing::info!(
                event = "raire.progress",
                contest = %contest_name,
                assertion_id,
                version = v,
                risk = progress.current_risk,
            );
            Ok(v)
        }
        None => Err(ServiceError::internal(format!(
            "no assertion {} for contest '{}'{}",
            assertion_id,
            contest_name,
            expected_version
                .map(|v| format!(" at version {}", v))
                .unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::model::AssertionShape;
    use crate::solver::{RawAssertion, RawAssertionWithDifficulty, SolverError, SolverSolution};

    fn store() -> Store {
        let s = Store::memory().unwrap();
        s.init_schema().unwrap();
        s
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            contest_name: "Mayor".into(),
            total_auditable_ballots: 1000,
            candidates: vec!["Alice".into(), "Bob".into()],
        }
    }

    fn ok_result(margin: i64) -> SolverResult {
        Ok(SolverSolution {
            assertions: vec![RawAssertionWithDifficulty {
                assertion: RawAssertion::NotEliminatedBefore {
                    winner: 0,
                    loser: 1,
                },
                difficulty: 1000.0 / margin as f64,
                margin,
            }],
            difficulty: 1000.0 / margin as f64,
            margin,
            winner: 0,
            num_candidates: 2,
            warning_trim_timed_out: false,
            time_to_determine_winners: None,
            time_to_find_assertions: None,
            time_to_trim_assertions: None,
        })
    }

    #[test]
    fn persist_refuses_mismatched_contest() {
        let s = store();
        let t = translate(&request(), &ok_result(320)).unwrap();
        let err = persist(&s, "Council", &t).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(s.count_rows("contest_summaries").unwrap(), 0);
    }

    #[test]
    fn generate_stores_and_returns_success_summary() {
        let s = store();
        let summary = generate(&s, &request(), &ok_result(320)).unwrap();
        assert_eq!(summary.winner, "Alice");
        let rows = s.fetch_assertions("Mayor").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].shape,
            AssertionShape::NotEliminatedBefore {
                winner: "Alice".into(),
                loser: "Bob".into()
            }
        );
    }

    #[test]
    fn solver_failure_is_stored_then_returned() {
        let s = store();
        generate(&s, &request(), &ok_result(320)).unwrap();
        let err = generate(&s, &request(), &Err(SolverError::TimeoutCheckingWinner)).unwrap_err();
        assert_eq!(err.code, ErrorCode::TimeoutCheckingWinner);

        let summary = s.fetch_summary("Mayor").unwrap().unwrap();
        assert_eq!(summary.error_code, Some(ErrorCode::TimeoutCheckingWinner));
        assert_eq!(s.count_rows("assertions").unwrap(), 0);
    }

    #[test]
    fn progress_for_unknown_assertion_is_an_error() {
        let s = store();
        let err = record_audit_progress(&s, "Mayor", 99, &AuditProgress::default(), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }
}

use crate::errors::ServiceError;
use crate::extrema::{compute_extrema, ExtremaTable};
use crate::model::{ContestSummary, ExportRequest, StoredAssertion};
use crate::report::csv::render_csv;
use crate::report::json::{render_json, StructuredExport};
use crate::report::ExportContext;
use crate::storage::{ContestSnapshot, Store};
use std::collections::HashSet;

/// A contest's stored result, checked and ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ContestExport {
    pub summary: ContestSummary,
    pub assertions: Vec<StoredAssertion>,
    pub extrema: ExtremaTable,
}

impl ContestExport {
    pub fn context<'a>(&'a self, request: &'a ExportRequest) -> ExportContext<'a> {
        ExportContext {
            request,
            summary: &self.summary,
            assertions: &self.assertions,
            extrema: &self.extrema,
        }
    }
}

pub fn load_export(store: &Store, request: &ExportRequest) -> Result<ContestExport, ServiceError> {
    let contest = request.contest_name.as_str();
    let snapshot = store
        .load_contest(contest)
        .map_err(|e| ServiceError::storage("failed to load assertions", e))?;

    let (summary, assertions) = check_lifecycle(contest, snapshot)?;
    check_candidates(request, &assertions)?;
    let extrema = compute_extrema(&assertions)?;

    tracing::debug!(
        event = "raire.export.loaded",
        contest = %contest,
        assertions = assertions.len(),
    );
    Ok(ContestExport {
        summary,
        assertions,
        extrema,
    })
}

pub fn export_json(store: &Store, request: &ExportRequest) -> Result<StructuredExport, ServiceError> {
    let loaded = load_export(store, request)?;
    render_json(&loaded.context(request))
}

pub fn export_csv(store: &Store, request: &ExportRequest) -> Result<String, ServiceError> {
    let loaded = load_export(store, request)?;
    Ok(render_csv(&loaded.context(request)))
}

fn check_lifecycle(
    contest: &str,
    snapshot: ContestSnapshot,
) -> Result<(ContestSummary, Vec<StoredAssertion>), ServiceError> {
    let ContestSnapshot {
        summary,
        assertions,
    } = snapshot;

    match summary {
        None if assertions.is_empty() => Err(ServiceError::no_assertions(format!(
            "No assertions have been generated for contest '{}'.",
            contest
        ))),
        None => {
            tracing::error!(
                event = "raire.export.inconsistent",
                contest = %contest,
                assertions = assertions.len(),
                "assertions stored without a summary"
            );
            Err(ServiceError::no_assertions(format!(
                "Contest '{}' has {} stored assertions but no generation summary.",
                contest,
                assertions.len()
            )))
        }
        Some(s) => {
            if let Some(err) = s.stored_error() {
                return Err(err);
            }
            if assertions.is_empty() {
                return Err(ServiceError::no_assertions(format!(
                    "Contest '{}' has a generation summary but no stored assertions.",
                    contest
                )));
            }
            Ok((s, assertions))
        }
    }
}

fn check_candidates(
    request: &ExportRequest,
    assertions: &[StoredAssertion],
) -> Result<(), ServiceError> {
    let known: HashSet<&str> = request.candidates.iter().map(String::as_str).collect();
    for a in assertions {
        if let Some(name) = a.shape.mentioned().find(|n| !known.contains(n)) {
            return Err(ServiceError::wrong_candidate_names(format!(
                "Candidate '{}' in stored assertions for contest '{}' is not in the supplied candidate list.",
                name, request.contest_name
            )));
        }
    }
    Ok(())
}

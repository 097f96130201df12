//! Turns an engine result into rows ready for the coordinator.
//!
//! Candidate indices are resolved to names here and nowhere else. Any
//! invariant violation aborts the whole translation so the coordinator never
//! sees a partial assertion set.

use crate::errors::{ErrorCode, ServiceError};
use crate::model::{AssertionShape, ContestSummary, GenerationRequest, NewAssertion};
use crate::solver::{RawAssertion, RawAssertionWithDifficulty, SolverResult, SolverSolution};

/// What the coordinator writes for one contest: exactly one summary and the
/// (possibly empty) assertion set that goes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedResult {
    pub summary: ContestSummary,
    pub assertions: Vec<NewAssertion>,
}

impl TranslatedResult {
    pub fn contest_name(&self) -> &str {
        &self.summary.contest_name
    }
}

/// Engine failures translate to `Ok` with a failure summary (they are
/// persisted). `Err` means a local inconsistency: nothing may be written.
pub fn translate(
    request: &GenerationRequest,
    result: &SolverResult,
) -> Result<TranslatedResult, ServiceError> {
    match result {
        Ok(solution) => translate_solution(request, solution),
        Err(solver_err) => {
            let err = ServiceError::from_solver(solver_err, &request.candidates);
            Ok(TranslatedResult {
                summary: ContestSummary::failure(&request.contest_name, &err),
                assertions: Vec::new(),
            })
        }
    }
}

fn translate_solution(
    request: &GenerationRequest,
    solution: &SolverSolution,
) -> Result<TranslatedResult, ServiceError> {
    let universe = request.total_auditable_ballots;
    if universe <= 0 {
        return Err(ServiceError::internal(format!(
            "universe size must be positive for contest '{}', got {}",
            request.contest_name, universe
        )));
    }

    if solution.num_candidates != request.candidates.len() {
        return Err(ServiceError::wrong_candidate_names(format!(
            "contest '{}': assertion engine saw {} candidates but {} were supplied",
            request.contest_name,
            solution.num_candidates,
            request.candidates.len()
        )));
    }

    let winner = request.candidates.get(solution.winner).ok_or_else(|| {
        ServiceError::internal(format!(
            "contest '{}': winner index {} is outside the candidate list",
            request.contest_name, solution.winner
        ))
    })?;

    // only an unopposed candidate wins without assertions
    if solution.assertions.is_empty() && request.candidates.len() > 1 {
        return Err(ServiceError::internal(format!(
            "contest '{}': assertion engine reported a winner among {} candidates but no assertions",
            request.contest_name,
            request.candidates.len()
        )));
    }

    let assertions = solution
        .assertions
        .iter()
        .enumerate()
        .map(|(i, raw)| translate_assertion(request, universe, raw).map_err(|e| at(i, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let warning = solution
        .warning_trim_timed_out
        .then_some(ErrorCode::TimeoutTrimmingAssertions);

    Ok(TranslatedResult {
        summary: ContestSummary::success(&request.contest_name, winner, warning),
        assertions,
    })
}

fn translate_assertion(
    request: &GenerationRequest,
    universe: i64,
    raw: &RawAssertionWithDifficulty,
) -> Result<NewAssertion, ServiceError> {
    let names = &request.candidates;
    let (w, l) = (raw.assertion.winner(), raw.assertion.loser());

    if w == l {
        return Err(ServiceError::internal(format!(
            "winner and loser are the same candidate (index {})",
            w
        )));
    }
    let winner = resolve(names, w)?;
    let loser = resolve(names, l)?;

    if raw.margin < 0 || raw.margin >= universe {
        return Err(ServiceError::internal(format!(
            "margin {} is outside [0, {})",
            raw.margin, universe
        )));
    }
    if !raw.difficulty.is_finite() || raw.difficulty <= 0.0 {
        return Err(ServiceError::internal(format!(
            "difficulty must be a positive number, got {}",
            raw.difficulty
        )));
    }

    let shape = match &raw.assertion {
        RawAssertion::NotEliminatedBefore { .. } => AssertionShape::NotEliminatedBefore {
            winner: winner.to_string(),
            loser: loser.to_string(),
        },
        RawAssertion::NotEliminatedNext { continuing, .. } => {
            if !continuing.contains(&w) || !continuing.contains(&l) {
                return Err(ServiceError::internal(format!(
                    "NEN continuing set {:?} must contain winner {} and loser {}",
                    continuing, w, l
                )));
            }
            let continuing = continuing
                .iter()
                .map(|&c| resolve(names, c).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            AssertionShape::NotEliminatedNext {
                winner: winner.to_string(),
                loser: loser.to_string(),
                continuing,
            }
        }
    };

    Ok(NewAssertion {
        contest_name: request.contest_name.clone(),
        shape,
        margin: raw.margin,
        diluted_margin: raw.margin as f64 / universe as f64,
        difficulty: raw.difficulty,
    })
}

fn resolve(names: &[String], idx: usize) -> Result<&str, ServiceError> {
    names.get(idx).map(String::as_str).ok_or_else(|| {
        ServiceError::internal(format!(
            "candidate index {} is outside the candidate list of {}",
            idx,
            names.len()
        ))
    })
}

fn at(index: usize, err: ServiceError) -> ServiceError {
    ServiceError::new(err.code, format!("assertion {}: {}", index, err.message))
}

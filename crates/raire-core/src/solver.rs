//! Wire shapes of the assertion-generation engine's result.
//!
//! The engine reports either `{"Ok": {...}}` or `{"Err": ...}`, which is
//! exactly serde's external representation of `Result`, so [`SolverResult`]
//! deserializes straight from the engine's JSON output.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub type SolverResult = Result<SolverSolution, SolverError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSolution {
    pub assertions: Vec<RawAssertionWithDifficulty>,
    /// Difficulty of the hardest assertion.
    pub difficulty: f64,
    /// Smallest margin over all assertions.
    pub margin: i64,
    /// Index of the winner in the candidate list.
    pub winner: usize,
    pub num_candidates: usize,
    #[serde(default)]
    pub warning_trim_timed_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_determine_winners: Option<TimeTaken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_find_assertions: Option<TimeTaken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_trim_assertions: Option<TimeTaken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeTaken {
    pub work: u64,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAssertionWithDifficulty {
    #[serde(flatten)]
    pub assertion: RawAssertion,
    pub difficulty: f64,
    pub margin: i64,
}

/// An assertion as produced by the engine, candidates given by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawAssertion {
    #[serde(rename = "NEB")]
    NotEliminatedBefore { winner: usize, loser: usize },
    #[serde(rename = "NEN")]
    NotEliminatedNext {
        winner: usize,
        loser: usize,
        continuing: Vec<usize>,
    },
}

impl RawAssertion {
    pub fn winner(&self) -> usize {
        match self {
            RawAssertion::NotEliminatedBefore { winner, .. }
            | RawAssertion::NotEliminatedNext { winner, .. } => *winner,
        }
    }

    pub fn loser(&self) -> usize {
        match self {
            RawAssertion::NotEliminatedBefore { loser, .. }
            | RawAssertion::NotEliminatedNext { loser, .. } => *loser,
        }
    }
}

/// Every failure the engine can report. This set is closed: a new variant
/// must be given a code in `errors::ServiceError::from_solver` before the
/// crate builds again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolverError {
    InvalidNumberOfCandidates,
    InvalidTimeout,
    /// A ballot referenced a candidate index beyond the declared count.
    InvalidCandidateNumber,
    TimeoutCheckingWinner,
    /// Carries the difficulty reached when time ran out.
    TimeoutFindingAssertions(f64),
    TimeoutTrimmingAssertions,
    TiedWinners(Vec<usize>),
    WrongWinner(Vec<usize>),
    CouldNotRuleOut(Vec<usize>),
    CouldNotParseWinner,
    InternalErrorRuledOutWinner,
    InternalErrorDidntRuleOutLoser,
    InternalErrorTrimming,
}

pub fn load_solver_result(path: &Path) -> anyhow::Result<SolverResult> {
    use anyhow::Context;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read solver result {}", path.display()))?;
    parse_solver_result(&raw)
        .with_context(|| format!("failed to parse solver result {}", path.display()))
}

pub fn parse_solver_result(raw: &str) -> anyhow::Result<SolverResult> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_with_both_assertion_kinds() {
        let raw = r#"{"Ok": {
            "assertions": [
                {"type": "NEB", "winner": 0, "loser": 1, "difficulty": 3.125, "margin": 320},
                {"type": "NEN", "winner": 0, "loser": 2, "continuing": [0, 2], "difficulty": 1.5, "margin": 500}
            ],
            "difficulty": 3.125,
            "margin": 320,
            "winner": 0,
            "num_candidates": 3,
            "time_to_determine_winners": {"work": 2, "seconds": 0.01}
        }}"#;

        let sol = parse_solver_result(raw).unwrap().unwrap();
        assert_eq!(sol.assertions.len(), 2);
        assert!(!sol.warning_trim_timed_out);
        assert_eq!(
            sol.assertions[0].assertion,
            RawAssertion::NotEliminatedBefore {
                winner: 0,
                loser: 1
            }
        );
        assert_eq!(
            sol.assertions[1].assertion,
            RawAssertion::NotEliminatedNext {
                winner: 0,
                loser: 2,
                continuing: vec![0, 2]
            }
        );
        assert_eq!(sol.assertions[1].margin, 500);
    }

    #[test]
    fn parses_unit_and_payload_failures() {
        let err = parse_solver_result(r#"{"Err": "TimeoutCheckingWinner"}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(err, SolverError::TimeoutCheckingWinner);

        let err = parse_solver_result(r#"{"Err": {"TiedWinners": [0, 2]}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(err, SolverError::TiedWinners(vec![0, 2]));

        let err = parse_solver_result(r#"{"Err": {"TimeoutFindingAssertions": 71.5}}"#)
            .unwrap()
            .unwrap_err();
        assert_eq!(err, SolverError::TimeoutFindingAssertions(71.5));
    }

    #[test]
    fn rejects_unknown_failure_tag() {
        assert!(parse_solver_result(r#"{"Err": "SomethingNew"}"#).is_err());
    }
}

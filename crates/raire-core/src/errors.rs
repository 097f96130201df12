use crate::solver::SolverError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error vocabulary shared by generation, storage and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TiedWinners,
    TimeoutFindingAssertions,
    TimeoutTrimmingAssertions,
    TimeoutCheckingWinner,
    CouldNotRuleOutAlternative,
    WrongCandidateNames,
    NoAssertionsPresent,
    InternalError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::TiedWinners,
        ErrorCode::TimeoutFindingAssertions,
        ErrorCode::TimeoutTrimmingAssertions,
        ErrorCode::TimeoutCheckingWinner,
        ErrorCode::CouldNotRuleOutAlternative,
        ErrorCode::WrongCandidateNames,
        ErrorCode::NoAssertionsPresent,
        ErrorCode::InternalError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TiedWinners => "TIED_WINNERS",
            ErrorCode::TimeoutFindingAssertions => "TIMEOUT_FINDING_ASSERTIONS",
            ErrorCode::TimeoutTrimmingAssertions => "TIMEOUT_TRIMMING_ASSERTIONS",
            ErrorCode::TimeoutCheckingWinner => "TIMEOUT_CHECKING_WINNER",
            ErrorCode::CouldNotRuleOutAlternative => "COULD_NOT_RULE_OUT_ALTERNATIVE",
            ErrorCode::WrongCandidateNames => "WRONG_CANDIDATE_NAMES",
            ErrorCode::NoAssertionsPresent => "NO_ASSERTIONS_PRESENT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Whether the operator can act on this code (retry, fix inputs) as
    /// opposed to a programming or configuration fault.
    pub fn is_user_actionable(&self) -> bool {
        !matches!(self, ErrorCode::InternalError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn no_assertions(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoAssertionsPresent, message)
    }

    pub fn wrong_candidate_names(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::WrongCandidateNames, message)
    }

    /// Storage failures surface as INTERNAL_ERROR; the full chain goes to the log.
    pub fn storage(context: &str, err: anyhow::Error) -> Self {
        tracing::error!(
            event = "raire.storage.failed",
            context = %context,
            error = ?err,
            "storage failure: {}", context
        );
        Self::internal(format!("{}: {:#}", context, err))
    }

    /// Map an engine failure onto the service vocabulary. Candidate indices
    /// carried by the failure are rendered through `candidates`.
    pub fn from_solver(err: &SolverError, candidates: &[String]) -> Self {
        match err {
            SolverError::TiedWinners(tied) => Self::new(
                ErrorCode::TiedWinners,
                format!("Tied winners: {}.", candidate_list(tied, candidates)),
            ),
            SolverError::TimeoutFindingAssertions(difficulty) => Self::new(
                ErrorCode::TimeoutFindingAssertions,
                format!(
                    "Time out finding assertions (difficulty reached: {}); retry with a longer time limit.",
                    difficulty
                ),
            ),
            SolverError::TimeoutTrimmingAssertions => Self::new(
                ErrorCode::TimeoutTrimmingAssertions,
                "Time out trimming assertions; the assertions are usable but could be reduced with more trimming time.",
            ),
            SolverError::TimeoutCheckingWinner => Self::new(
                ErrorCode::TimeoutCheckingWinner,
                "Time out checking winners; the contest may be too close or too complicated to audit.",
            ),
            SolverError::CouldNotRuleOut(order) => Self::new(
                ErrorCode::CouldNotRuleOutAlternative,
                format!(
                    "Could not rule out alternative elimination order: {}.",
                    candidate_list(order, candidates)
                ),
            ),
            SolverError::InvalidCandidateNumber => Self::wrong_candidate_names(
                "Candidate list does not match the candidates referenced by the stored ballots.",
            ),
            SolverError::InvalidNumberOfCandidates
            | SolverError::InvalidTimeout
            | SolverError::CouldNotParseWinner
            | SolverError::WrongWinner(_)
            | SolverError::InternalErrorRuledOutWinner
            | SolverError::InternalErrorDidntRuleOutLoser
            | SolverError::InternalErrorTrimming => {
                tracing::warn!(
                    event = "raire.solver.internal_error",
                    reason = ?err,
                    "assertion engine reported an internal failure"
                );
                Self::internal(format!("Assertion generation failed: {:?}", err))
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_code: self.code,
            message: self.message.clone(),
        }
    }
}

/// Error body for outer surfaces; `error_code` is a dedicated field so callers
/// can branch on it without parsing `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub message: String,
}

fn candidate_list(indices: &[usize], candidates: &[String]) -> String {
    indices
        .iter()
        .map(|&i| match candidates.get(i) {
            Some(name) => name.clone(),
            None => format!("#{}", i),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

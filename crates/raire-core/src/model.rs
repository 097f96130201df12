use crate::errors::{ErrorCode, ServiceError};
use serde::{Deserialize, Serialize};

/// Winner recorded on a summary when generation did not determine one.
pub const UNKNOWN_WINNER: &str = "unknown";

/// Risk an assertion carries before any ballots have been audited.
pub const INITIAL_RISK: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub contest_name: String,
    /// Total auditable ballots for the contest (the margin's universe).
    pub total_auditable_ballots: i64,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub contest_name: String,
    pub risk_limit: f64,
    pub candidates: Vec<String>,
}

/// The logical claim an assertion makes, candidates given by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AssertionShape {
    #[serde(rename = "NEB")]
    NotEliminatedBefore { winner: String, loser: String },
    #[serde(rename = "NEN")]
    NotEliminatedNext {
        winner: String,
        loser: String,
        continuing: Vec<String>,
    },
}

impl AssertionShape {
    pub fn type_tag(&self) -> &'static str {
        match self {
            AssertionShape::NotEliminatedBefore { .. } => "NEB",
            AssertionShape::NotEliminatedNext { .. } => "NEN",
        }
    }

    pub fn winner(&self) -> &str {
        match self {
            AssertionShape::NotEliminatedBefore { winner, .. }
            | AssertionShape::NotEliminatedNext { winner, .. } => winner,
        }
    }

    pub fn loser(&self) -> &str {
        match self {
            AssertionShape::NotEliminatedBefore { loser, .. }
            | AssertionShape::NotEliminatedNext { loser, .. } => loser,
        }
    }

    /// Assumed-continuing candidates; empty for NEB.
    pub fn continuing(&self) -> &[String] {
        match self {
            AssertionShape::NotEliminatedBefore { .. } => &[],
            AssertionShape::NotEliminatedNext { continuing, .. } => continuing,
        }
    }

    /// Every candidate name this assertion mentions.
    pub fn mentioned(&self) -> impl Iterator<Item = &str> + '_ {
        [self.winner(), self.loser()]
            .into_iter()
            .chain(self.continuing().iter().map(String::as_str))
    }
}

/// A translated assertion that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssertion {
    pub contest_name: String,
    pub shape: AssertionShape,
    pub margin: i64,
    pub diluted_margin: f64,
    pub difficulty: f64,
}

/// Audit-in-progress state, maintained by the auditing process after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditProgress {
    pub current_risk: f64,
    pub estimated_samples_to_audit: i64,
    pub optimistic_samples_to_audit: i64,
    pub two_vote_over_count: i64,
    pub one_vote_over_count: i64,
    pub other_count: i64,
    pub one_vote_under_count: i64,
    pub two_vote_under_count: i64,
}

impl Default for AuditProgress {
    fn default() -> Self {
        Self {
            current_risk: INITIAL_RISK,
            estimated_samples_to_audit: 0,
            optimistic_samples_to_audit: 0,
            two_vote_over_count: 0,
            one_vote_over_count: 0,
            other_count: 0,
            one_vote_under_count: 0,
            two_vote_under_count: 0,
        }
    }
}

impl AuditProgress {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !self.current_risk.is_finite() || self.current_risk < 0.0 {
            return Err(ServiceError::internal(format!(
                "current risk must be a non-negative number, got {}",
                self.current_risk
            )));
        }
        let counters = [
            ("estimated_samples_to_audit", self.estimated_samples_to_audit),
            ("optimistic_samples_to_audit", self.optimistic_samples_to_audit),
            ("two_vote_over_count", self.two_vote_over_count),
            ("one_vote_over_count", self.one_vote_over_count),
            ("other_count", self.other_count),
            ("one_vote_under_count", self.one_vote_under_count),
            ("two_vote_under_count", self.two_vote_under_count),
        ];
        if let Some((name, v)) = counters.iter().find(|(_, v)| *v < 0) {
            return Err(ServiceError::internal(format!(
                "{} must not be negative, got {}",
                name, v
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAssertion {
    /// Storage-time identifier; orders assertions, carries no audit meaning.
    pub id: i64,
    pub contest_name: String,
    pub shape: AssertionShape,
    pub margin: i64,
    pub diluted_margin: f64,
    pub difficulty: f64,
    pub progress: AuditProgress,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestSummary {
    pub contest_name: String,
    pub winner: String,
    /// `None` when the last generation attempt succeeded.
    pub error_code: Option<ErrorCode>,
    pub warning: String,
    pub message: String,
    /// Set when the summary is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl ContestSummary {
    pub fn success(contest_name: &str, winner: &str, warning: Option<ErrorCode>) -> Self {
        Self {
            contest_name: contest_name.to_string(),
            winner: winner.to_string(),
            error_code: None,
            warning: warning.map(|w| w.as_str().to_string()).unwrap_or_default(),
            message: String::new(),
            generated_at: None,
        }
    }

    pub fn failure(contest_name: &str, err: &ServiceError) -> Self {
        Self {
            contest_name: contest_name.to_string(),
            winner: UNKNOWN_WINNER.to_string(),
            error_code: Some(err.code),
            warning: String::new(),
            message: err.message.clone(),
            generated_at: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }

    /// The stored failure, if the last attempt failed.
    pub fn stored_error(&self) -> Option<ServiceError> {
        self.error_code
            .map(|code| ServiceError::new(code, self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_serializes_with_type_tag() {
        let nen = AssertionShape::NotEliminatedNext {
            winner: "Alice".into(),
            loser: "Bob".into(),
            continuing: vec!["Alice".into(), "Bob".into(), "Chuan".into()],
        };
        let v = serde_json::to_value(&nen).unwrap();
        assert_eq!(v["type"], "NEN");
        assert_eq!(v["continuing"][2], "Chuan");
        assert_eq!(nen.mentioned().count(), 5);

        let neb = AssertionShape::NotEliminatedBefore {
            winner: "Alice".into(),
            loser: "Bob".into(),
        };
        assert_eq!(neb.type_tag(), "NEB");
        assert!(neb.continuing().is_empty());
    }

    #[test]
    fn default_progress_is_audit_not_started() {
        let p = AuditProgress::default();
        assert_eq!(p.current_risk, 1.0);
        assert_eq!(p.estimated_samples_to_audit, 0);
        assert!(p.validate().is_ok());

        let bad = AuditProgress {
            other_count: -1,
            ..AuditProgress::default()
        };
        assert_eq!(bad.validate().unwrap_err().code, ErrorCode::InternalError);
    }

    #[test]
    fn failure_summary_records_code_and_unknown_winner() {
        let err = ServiceError::new(ErrorCode::TimeoutCheckingWinner, "too slow");
        let s = ContestSummary::failure("Mayor", &err);
        assert!(!s.is_success());
        assert_eq!(s.winner, UNKNOWN_WINNER);
        assert_eq!(s.stored_error(), Some(err));

        let ok = ContestSummary::success("Mayor", "Alice", Some(ErrorCode::TimeoutTrimmingAssertions));
        assert!(ok.is_success());
        assert_eq!(ok.warning, "TIMEOUT_TRIMMING_ASSERTIONS");
    }
}

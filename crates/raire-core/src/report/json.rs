use super::ExportContext;
use crate::errors::{ErrorCode, ServiceError};
use crate::extrema::Statistic;
use crate::model::{AssertionShape, AuditProgress, StoredAssertion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExport {
    pub metadata: ExportMetadata,
    pub solution: ExportSolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub contest: String,
    pub risk_limit: f64,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExportSolution {
    Ok(ExportedSolution),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSolution {
    pub assertions: Vec<ExportedAssertion>,
    /// Largest difficulty over `assertions`.
    pub difficulty: f64,
    /// Smallest margin over `assertions`.
    pub margin: i64,
    pub winner: String,
    pub num_candidates: usize,
    pub warning_trim_timed_out: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedAssertion {
    pub assertion: AssertionShape,
    pub difficulty: f64,
    pub margin: i64,
    pub diluted_margin: f64,
    pub status: AuditProgress,
}

impl From<&StoredAssertion> for ExportedAssertion {
    fn from(a: &StoredAssertion) -> Self {
        Self {
            assertion: a.shape.clone(),
            difficulty: a.difficulty,
            margin: a.margin,
            diluted_margin: a.diluted_margin,
            status: a.progress.clone(),
        }
    }
}

pub fn render_json(ctx: &ExportContext) -> Result<StructuredExport, ServiceError> {
    let difficulty = ctx.extrema.real_value(Statistic::Difficulty)?;
    let margin = ctx.extrema.int_value(Statistic::Margin)?;

    Ok(StructuredExport {
        metadata: ExportMetadata {
            contest: ctx.request.contest_name.clone(),
            risk_limit: ctx.request.risk_limit,
            candidates: ctx.request.candidates.clone(),
        },
        solution: ExportSolution::Ok(ExportedSolution {
            assertions: ctx.assertions.iter().map(ExportedAssertion::from).collect(),
            difficulty,
            margin,
            winner: ctx.summary.winner.clone(),
            num_candidates: ctx.request.candidates.len(),
            warning_trim_timed_out: ctx.summary.warning
                == ErrorCode::TimeoutTrimmingAssertions.as_str(),
        }),
    })
}

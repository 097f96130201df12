//! Tied extrema over a contest's stored assertions.
//!
//! Positions are 1-based indices into the id-ordered assertion list, which is
//! the only ordering the exports promise.

use crate::errors::ServiceError;
use crate::model::StoredAssertion;
use std::fmt;

/// Real-valued statistics within this distance of the extreme count as tied.
pub const REAL_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Margin,
    DilutedMargin,
    Difficulty,
    CurrentRisk,
    OptimisticSamples,
    EstimatedSamples,
}

impl Statistic {
    /// Export order.
    pub const ALL: [Statistic; 6] = [
        Statistic::Margin,
        Statistic::DilutedMargin,
        Statistic::Difficulty,
        Statistic::CurrentRisk,
        Statistic::OptimisticSamples,
        Statistic::EstimatedSamples,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Statistic::Margin => "Margin",
            Statistic::DilutedMargin => "Diluted margin",
            Statistic::Difficulty => "Raire difficulty",
            Statistic::CurrentRisk => "Current risk",
            Statistic::OptimisticSamples => "Optimistic samples to audit",
            Statistic::EstimatedSamples => "Estimated samples to audit",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Statistic::Margin | Statistic::DilutedMargin => Direction::Min,
            _ => Direction::Max,
        }
    }

    pub fn value_of(&self, a: &StoredAssertion) -> StatValue {
        match self {
            Statistic::Margin => StatValue::Int(a.margin),
            Statistic::DilutedMargin => StatValue::Real(a.diluted_margin),
            Statistic::Difficulty => StatValue::Real(a.difficulty),
            Statistic::CurrentRisk => StatValue::Real(a.progress.current_risk),
            Statistic::OptimisticSamples => StatValue::Int(a.progress.optimistic_samples_to_audit),
            Statistic::EstimatedSamples => StatValue::Int(a.progress.estimated_samples_to_audit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(i64),
    Real(f64),
}

impl StatValue {
    fn as_f64(self) -> f64 {
        match self {
            StatValue::Int(v) => v as f64,
            StatValue::Real(v) => v,
        }
    }

    fn ties(self, other: StatValue) -> bool {
        match (self, other) {
            (StatValue::Int(a), StatValue::Int(b)) => a == b,
            (a, b) => (a.as_f64() - b.as_f64()).abs() <= REAL_TOLERANCE,
        }
    }

    fn beats(self, current: StatValue, direction: Direction) -> bool {
        let ord = match (self, current) {
            (StatValue::Int(a), StatValue::Int(b)) => a.partial_cmp(&b),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        };
        match direction {
            Direction::Min => ord == Some(std::cmp::Ordering::Less),
            Direction::Max => ord == Some(std::cmp::Ordering::Greater),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{}", v),
            StatValue::Real(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub statistic: Statistic,
    pub value: StatValue,
    /// 1-based, ascending.
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaTable {
    pub entries: Vec<Extremum>,
}

impl ExtremaTable {
    pub fn get(&self, statistic: Statistic) -> Option<&Extremum> {
        self.entries.iter().find(|e| e.statistic == statistic)
    }

    /// Extreme value of an integer statistic.
    pub fn int_value(&self, statistic: Statistic) -> Result<i64, ServiceError> {
        match self.get(statistic).map(|e| e.value) {
            Some(StatValue::Int(v)) => Ok(v),
            other => Err(mistyped(statistic, "integer", other)),
        }
    }

    /// Extreme value of a real-valued statistic.
    pub fn real_value(&self, statistic: Statistic) -> Result<f64, ServiceError> {
        match self.get(statistic).map(|e| e.value) {
            Some(StatValue::Real(v)) => Ok(v),
            other => Err(mistyped(statistic, "real", other)),
        }
    }
}

fn mistyped(statistic: Statistic, expected: &str, found: Option<StatValue>) -> ServiceError {
    ServiceError::internal(format!(
        "extremum '{}' should be {}, found {:?}",
        statistic.label(),
        expected,
        found
    ))
}

/// Single pass over `assertions`, which must be non-empty and strictly
/// ascending by id.
pub fn compute_extrema(assertions: &[StoredAssertion]) -> Result<ExtremaTable, ServiceError> {
    let (first, rest) = assertions.split_first().ok_or_else(|| {
        ServiceError::internal("extrema requested over an empty assertion list")
    })?;
    if let Some(w) = assertions.windows(2).find(|w| w[0].id >= w[1].id) {
        return Err(ServiceError::internal(format!(
            "assertions not ordered by id ({} before {})",
            w[0].id, w[1].id
        )));
    }

    let mut entries: Vec<Extremum> = Statistic::ALL
        .iter()
        .map(|&statistic| Extremum {
            statistic,
            value: statistic.value_of(first),
            positions: vec![1],
        })
        .collect();

    for (offset, a) in rest.iter().enumerate() {
        let position = offset + 2;
        for e in entries.iter_mut() {
            let v = e.statistic.value_of(a);
            if v.ties(e.value) {
                e.positions.push(position);
            } else if v.beats(e.value, e.statistic.direction()) {
                e.value = v;
                e.positions = vec![position];
            }
        }
    }

    Ok(ExtremaTable { entries })
}

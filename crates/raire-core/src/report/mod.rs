use crate::extrema::ExtremaTable;
use crate::model::{ContestSummary, ExportRequest, StoredAssertion};

pub mod csv;
pub mod json;

/// Everything a renderer needs for one contest. `assertions` are ascending by
/// id and `extrema` was computed over exactly that slice.
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub request: &'a ExportRequest,
    pub summary: &'a ContestSummary,
    pub assertions: &'a [StoredAssertion],
    pub extrema: &'a ExtremaTable,
}

//! Response body for operations that push ACL changes

use serde::Serialize;

use crate::infrastructure::access::{PropagationReport, PropagationResult};

/// Counts plus the per-resource log of one propagation pass
#[derive(Debug, Clone, Serialize)]
pub struct PropagationResponse {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<PropagationResult>,
}

impl From<PropagationReport> for PropagationResponse {
    fn from(report: PropagationReport) -> Self {
        Self {
            updated: report.updated_count(),
            unchanged: report.unchanged_count(),
            failed: report.failed_count(),
            total: report.total(),
            results: report.results,
        }
    }
}

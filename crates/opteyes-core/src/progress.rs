use crate::reconciler::ReconciliationReport;
use crate::storage::DatapointUpdate;
use std::path::Path;

/// Trait for reporting reconciliation events.
///
/// The CLI implements it with indicatif. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_pass_start(&self, _root: &Path) {}
    fn on_dataset_added(&self, _name: &str, _id: i64) {}
    fn on_datapoint_added(&self, _id: i64, _label: &str) {}
    fn on_datapoint_updated(&self, _id: i64, _update: &DatapointUpdate) {}
    fn on_malformed_entry(&self, _path: &Path) {}
    fn on_datapoint_removed(&self, _id: i64) {}
    fn on_dataset_removed(&self, _id: i64) {}
    fn on_pass_complete(&self, _report: &ReconciliationReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

pub mod config;
pub mod error;
pub mod ingest;
pub mod progress;
pub mod reconciler;
pub mod scanner;
pub mod storage;

pub use crate::config::AppConfig;
pub use error::Error;
pub use ingest::add_datapoint;
pub use progress::{ProgressReporter, SilentReporter};
pub use reconciler::{reconcile, ReconciliationReport, Reconciler};
pub use storage::{Database, IndexStore, IndexTx};

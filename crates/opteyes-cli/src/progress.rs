use indicatif::{ProgressBar, ProgressStyle};
use opteyes_core::storage::DatapointUpdate;
use opteyes_core::{ProgressReporter, ReconciliationReport};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// CLI progress reporter: a spinner while the tree is walked, a summary line at the end.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    visited: AtomicUsize,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            visited: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let visited = self.visited.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(format!("Syncing... {} changes", visited));
            }
        }
    }

    pub fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_pass_start(&self, root: &Path) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(format!("Syncing {}...", root.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_dataset_added(&self, _name: &str, _id: i64) {
        self.tick();
    }

    fn on_datapoint_added(&self, _id: i64, _label: &str) {
        self.tick();
    }

    fn on_datapoint_updated(&self, _id: i64, _update: &DatapointUpdate) {
        self.tick();
    }

    fn on_datapoint_removed(&self, _id: i64) {
        self.tick();
    }

    fn on_dataset_removed(&self, _id: i64) {
        self.tick();
    }

    fn on_pass_complete(&self, report: &ReconciliationReport) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Sync complete: {} changes in {:.2}s",
            report.total_changes(),
            report.duration.as_secs_f64()
        );
    }
}

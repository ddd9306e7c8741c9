use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::scanner::{DatasetDir, DiscoveredDatapoint, LabelCache, Scanner};
use crate::storage::{Database, DatapointUpdate, IndexStore};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Counts of the changes applied by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub datasets_added: usize,
    pub datasets_removed: usize,
    pub datapoints_added: usize,
    pub datapoints_updated: usize,
    pub datapoints_removed: usize,
    pub malformed_entries: usize,
    pub duration: Duration,
}

impl ReconciliationReport {
    pub fn total_changes(&self) -> usize {
        self.datasets_added
            + self.datasets_removed
            + self.datapoints_added
            + self.datapoints_updated
            + self.datapoints_removed
    }

    /// True when the pass wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.total_changes() == 0
    }
}

/// State of a single reconciliation pass.
///
/// Datasets are visited in directory-name order, labels in name order, and
/// datapoints in file-name order. When the same datapoint id exists under two
/// datasets, the dataset visited last owns the row after the pass.
///
/// Passes must not overlap on the same store; nothing here locks.
pub struct Reconciler<'a> {
    reporter: &'a dyn ProgressReporter,
    labels: LabelCache,
    seen_datasets: HashSet<i64>,
    seen_datapoints: HashSet<i64>,
    report: ReconciliationReport,
}

impl<'a> Reconciler<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            reporter,
            labels: LabelCache::new(),
            seen_datasets: HashSet::new(),
            seen_datapoints: HashSet::new(),
            report: ReconciliationReport::default(),
        }
    }

    /// Run the pass inside one transaction on `db`. On any error the
    /// transaction is dropped and the index is left as it was.
    pub fn run(self, db: &Database, root: &Path) -> Result<ReconciliationReport> {
        let reporter = self.reporter;
        let tx = db.begin()?;
        let report = self.apply(&tx, root)?;
        tx.commit()?;
        log_report(&report);
        reporter.on_pass_complete(&report);
        Ok(report)
    }

    /// Apply the pass to `store` without committing.
    pub fn apply<S: IndexStore + ?Sized>(
        mut self,
        store: &S,
        root: &Path,
    ) -> Result<ReconciliationReport> {
        let start = Instant::now();
        let root = fs::canonicalize(root).map_err(|err| Error::scan(root, err))?;
        info!("Syncing index with {}", root.display());
        self.reporter.on_pass_start(&root);

        let scanner = Scanner::new(&root);
        for dataset in scanner.datasets()? {
            let dataset = dataset?;
            self.sync_dataset(store, &dataset)?;
        }

        // Datapoints first so no surviving row points at a dataset about to go.
        self.remove_orphan_datapoints(store)?;
        self.remove_orphan_datasets(store)?;

        self.report.duration = start.elapsed();
        Ok(self.report)
    }

    fn sync_dataset<S: IndexStore + ?Sized>(
        &mut self,
        store: &S,
        dataset: &DatasetDir,
    ) -> Result<()> {
        let path = dataset.path.to_string_lossy();
        let dataset_id = match store.find_dataset_by_path(&path)? {
            Some(existing) => existing.id,
            None => {
                let id = store.insert_dataset(&dataset.name, &path)?;
                info!("added dataset \"{}\", id={}", dataset.name, id);
                self.report.datasets_added += 1;
                self.reporter.on_dataset_added(&dataset.name, id);
                id
            }
        };
        self.seen_datasets.insert(dataset_id);

        let mut datapoints = dataset.datapoints(&mut self.labels)?;
        for discovered in datapoints.by_ref() {
            let discovered = discovered?;
            self.sync_datapoint(store, dataset_id, &discovered)?;
        }

        for entry in datapoints.malformed() {
            self.report.malformed_entries += 1;
            self.reporter.on_malformed_entry(entry);
        }
        Ok(())
    }

    fn sync_datapoint<S: IndexStore + ?Sized>(
        &mut self,
        store: &S,
        dataset_id: i64,
        discovered: &DiscoveredDatapoint,
    ) -> Result<()> {
        let path = discovered.path.to_string_lossy();
        match store.find_datapoint_by_id(discovered.id)? {
            None => {
                store.insert_datapoint(discovered.id, &path, dataset_id)?;
                info!(
                    "added datapoint id={} with label=\"{}\"",
                    discovered.id, discovered.label
                );
                self.report.datapoints_added += 1;
                self.reporter
                    .on_datapoint_added(discovered.id, &discovered.label);
            }
            Some(current) => {
                let update = DatapointUpdate::diff(&current, &path, dataset_id);
                if store.update_datapoint(discovered.id, &update)? {
                    info!("updated datapoint id={} {:?}", discovered.id, update);
                    self.report.datapoints_updated += 1;
                    self.reporter.on_datapoint_updated(discovered.id, &update);
                }
            }
        }
        self.seen_datapoints.insert(discovered.id);
        Ok(())
    }

    fn remove_orphan_datapoints<S: IndexStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        for datapoint in store.list_datapoints()? {
            if self.seen_datapoints.contains(&datapoint.id) {
                continue;
            }
            if store.delete_datapoint(datapoint.id)? {
                debug!("removed datapoint id={} ({})", datapoint.id, datapoint.path);
                self.report.datapoints_removed += 1;
                self.reporter.on_datapoint_removed(datapoint.id);
            }
        }
        Ok(())
    }

    fn remove_orphan_datasets<S: IndexStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        for dataset in store.list_datasets()? {
            if self.seen_datasets.contains(&dataset.id) {
                continue;
            }
            if store.delete_dataset(dataset.id)? {
                info!("removed dataset \"{}\", id={}", dataset.name, dataset.id);
                self.report.datasets_removed += 1;
                self.reporter.on_dataset_removed(dataset.id);
            }
        }
        Ok(())
    }
}

fn log_report(report: &ReconciliationReport) {
    info!(
        "Sync complete in {:.2}s: datasets +{} -{}, datapoints +{} ~{} -{}, {} malformed",
        report.duration.as_secs_f64(),
        report.datasets_added,
        report.datasets_removed,
        report.datapoints_added,
        report.datapoints_updated,
        report.datapoints_removed,
        report.malformed_entries,
    );
}

/// Bring the index in `db` in line with the tree under `root`, atomically.
pub fn reconcile(
    db: &Database,
    root: &Path,
    reporter: &dyn ProgressReporter,
) -> Result<ReconciliationReport> {
    Reconciler::new(reporter).run(db, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let report = ReconciliationReport {
            datasets_added: 1,
            datapoints_added: 4,
            datapoints_updated: 2,
            malformed_entries: 3,
            ..Default::default()
        };
        assert_eq!(report.total_changes(), 7);
        assert!(!report.is_noop());

        let quiet = ReconciliationReport {
            malformed_entries: 5,
            ..Default::default()
        };
        assert!(quiet.is_noop());
    }
}

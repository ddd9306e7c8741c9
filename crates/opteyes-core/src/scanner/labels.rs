use super::walk::list_dir;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A grouping directory beneath a dataset. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub path: PathBuf,
}

/// Label directories per dataset path, memoized for the lifetime of the cache.
///
/// Create one per reconciliation pass (or per ingest call) so a later pass
/// always sees what is on disk now.
#[derive(Debug, Default)]
pub struct LabelCache {
    by_dataset: HashMap<PathBuf, Vec<Label>>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct subdirectories of `dataset_path`, sorted by name.
    pub fn labels(&mut self, dataset_path: &Path) -> Result<&[Label]> {
        if !self.by_dataset.contains_key(dataset_path) {
            let labels = read_labels(dataset_path)?;
            self.by_dataset.insert(dataset_path.to_path_buf(), labels);
        } else {
            trace!("Label cache hit for {}", dataset_path.display());
        }
        Ok(self
            .by_dataset
            .get(dataset_path)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn contains(&mut self, dataset_path: &Path, label: &str) -> Result<bool> {
        Ok(self
            .labels(dataset_path)?
            .iter()
            .any(|l| l.name == label))
    }
}

fn read_labels(dataset_path: &Path) -> Result<Vec<Label>> {
    let mut labels = Vec::new();
    for entry in list_dir(dataset_path) {
        let entry = entry.map_err(|err| Error::from_walk(dataset_path, err))?;
        if !entry.file_type().is_dir() {
            trace!("Skipping non-directory {}", entry.path().display());
            continue;
        }
        labels.push(Label {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        });
    }
    Ok(labels)
}

use crate::error::{Error, Result};
use crate::scanner::LabelCache;
use crate::storage::{Database, IndexStore};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Add a datapoint to `dataset_name` under `label` and write its images.
///
/// The row is inserted first to obtain an id, the directory
/// `{dataset}/{label}/{id}` is created, and the row's path is set. Those three
/// steps commit together; images are written as `{index}.png` afterwards.
///
/// Fails with [`Error::Io`] and leaves no row behind if the directory for the
/// new id already exists on disk.
///
/// Must not run concurrently with a reconciliation pass on the same index.
pub fn add_datapoint(
    db: &Database,
    dataset_name: &str,
    label: &str,
    images: &[Vec<u8>],
) -> Result<i64> {
    if images.is_empty() {
        return Err(Error::NoImages);
    }

    let dataset = db
        .find_dataset_by_name(dataset_name)?
        .ok_or_else(|| Error::UnknownDataset(dataset_name.to_string()))?;

    let dataset_path = Path::new(&dataset.path);
    let mut labels = LabelCache::new();
    if !labels.contains(dataset_path, label)? {
        return Err(Error::UnknownLabel {
            dataset: dataset_name.to_string(),
            label: label.to_string(),
        });
    }

    let tx = db.begin()?;
    let id = tx.insert_datapoint_auto_id(dataset.id)?;
    let dir = dataset_path.join(label).join(id.to_string());
    if let Some(label_dir) = dir.parent() {
        fs::create_dir_all(label_dir)?;
    }
    // An existing directory belongs to the tree, never adopt it.
    fs::create_dir(&dir)?;
    tx.update_path(id, &dir.to_string_lossy())?;
    tx.commit()?;
    debug!("Datapoint {} committed at {}", id, dir.display());

    for (index, image) in images.iter().enumerate() {
        fs::write(dir.join(format!("{}.png", index)), image)?;
    }

    info!(
        "added datapoint id={} to dataset \"{}\" with label=\"{}\" ({} images)",
        id,
        dataset_name,
        label,
        images.len()
    );
    Ok(id)
}

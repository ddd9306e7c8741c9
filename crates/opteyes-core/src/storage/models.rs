/// A top-level directory of the data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub path: String,
}

/// A numbered directory under `{dataset}/{label}/`.
///
/// The id is the directory name when discovered by reconciliation, or
/// assigned by the store when created through ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datapoint {
    pub id: i64,
    pub path: String,
    pub dataset_id: i64,
}

/// Partial update of a datapoint row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatapointUpdate {
    pub path: Option<String>,
    pub dataset_id: Option<i64>,
}

impl DatapointUpdate {
    /// Build the update needed to bring `current` in line with what was found on disk.
    pub fn diff(current: &Datapoint, path: &str, dataset_id: i64) -> Self {
        Self {
            path: (current.path != path).then(|| path.to_string()),
            dataset_id: (current.dataset_id != dataset_id).then_some(dataset_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.dataset_id.is_none()
    }
}

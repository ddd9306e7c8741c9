use super::labels::{Label, LabelCache};
use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};
use walkdir::WalkDir;

/// Direct children of `dir`, sorted by file name. Symlinks are followed so a
/// linked directory counts as a directory.
pub(crate) fn list_dir(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
}

/// A datapoint directory name is a base-10 non-negative integer that fits in `i64`.
pub fn parse_datapoint_id(name: &str) -> Option<i64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Walks `{root}/{dataset}/{label}/{datapoint-id}`.
///
/// Nothing is cached between calls: every call to [`Scanner::datasets`]
/// re-reads the root from disk.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn datasets(&self) -> Result<DatasetIter> {
        if !self.root.is_dir() {
            return Err(Error::scan(
                &self.root,
                io::Error::new(io::ErrorKind::NotFound, "data root is not a directory"),
            ));
        }
        Ok(DatasetIter {
            root: self.root.clone(),
            entries: list_dir(&self.root),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDir {
    pub name: String,
    pub path: PathBuf,
}

impl DatasetDir {
    /// Datapoints under every label of this dataset, label by label.
    pub fn datapoints(&self, labels: &mut LabelCache) -> Result<DatapointIter> {
        let labels = labels.labels(&self.path)?.to_vec();
        Ok(DatapointIter {
            labels: labels.into_iter(),
            current: None,
            malformed: Vec::new(),
        })
    }
}

/// Dataset directories of the root in name order. Stray files are skipped.
pub struct DatasetIter {
    root: PathBuf,
    entries: walkdir::IntoIter,
}

impl Iterator for DatasetIter {
    type Item = Result<DatasetDir>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(Error::from_walk(&self.root, err))),
            };
            if !entry.file_type().is_dir() {
                trace!("Skipping non-directory {}", entry.path().display());
                continue;
            }
            return Some(Ok(DatasetDir {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.into_path(),
            }));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDatapoint {
    pub id: i64,
    pub label: String,
    pub path: PathBuf,
}

/// Numeric entries of each label directory of one dataset.
///
/// Entries with a non-numeric name, or numeric names that are not
/// directories, are logged and collected in [`DatapointIter::malformed`]
/// instead of being yielded.
pub struct DatapointIter {
    labels: std::vec::IntoIter<Label>,
    current: Option<(Label, walkdir::IntoIter)>,
    malformed: Vec<PathBuf>,
}

impl DatapointIter {
    pub fn malformed(&self) -> &[PathBuf] {
        &self.malformed
    }
}

impl Iterator for DatapointIter {
    type Item = Result<DiscoveredDatapoint>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let label = self.labels.next()?;
                let entries = list_dir(&label.path);
                self.current = Some((label, entries));
            }
            let (label, entries) = self.current.as_mut()?;

            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => return Some(Err(Error::from_walk(&label.path, err))),
                None => {
                    self.current = None;
                    continue;
                }
            };

            let id = entry.file_name().to_str().and_then(parse_datapoint_id);
            match id {
                Some(id) if entry.file_type().is_dir() => {
                    return Some(Ok(DiscoveredDatapoint {
                        id,
                        label: label.name.clone(),
                        path: entry.into_path(),
                    }));
                }
                _ => {
                    warn!(
                        "Ignoring \"{}\", not a valid datapoint directory",
                        entry.path().display()
                    );
                    self.malformed.push(entry.into_path());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_datapoint_id() {
        assert_eq!(parse_datapoint_id("0"), Some(0));
        assert_eq!(parse_datapoint_id("1113"), Some(1113));
        assert_eq!(parse_datapoint_id("007"), Some(7));
        assert_eq!(parse_datapoint_id(""), None);
        assert_eq!(parse_datapoint_id("-1"), None);
        assert_eq!(parse_datapoint_id("+1"), None);
        assert_eq!(parse_datapoint_id("12a"), None);
        assert_eq!(parse_datapoint_id(" 12"), None);
        assert_eq!(parse_datapoint_id("٣"), None);
        assert_eq!(parse_datapoint_id("99999999999999999999"), None);
    }

    #[test]
    fn test_datasets_skip_files_and_sort_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("b_set")).unwrap();
        fs::create_dir(tmp.path().join("a_set")).unwrap();
        fs::write(tmp.path().join("notes.txt"), "stray").unwrap();

        let scanner = Scanner::new(tmp.path());
        let names: Vec<_> = scanner
            .datasets()
            .unwrap()
            .map(|ds| ds.unwrap().name)
            .collect();
        assert_eq!(names, vec!["a_set", "b_set"]);
    }

    #[test]
    fn test_datapoints_filter_malformed_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let label = tmp.path().join("ds").join("cats");
        fs::create_dir_all(label.join("4")).unwrap();
        fs::create_dir_all(label.join("thumbnails")).unwrap();
        fs::write(label.join("5"), "numeric file, not a directory").unwrap();

        let dataset = DatasetDir {
            name: "ds".to_string(),
            path: tmp.path().join("ds"),
        };
        let mut cache = LabelCache::new();
        let mut iter = dataset.datapoints(&mut cache).unwrap();
        let found: Vec<_> = iter.by_ref().map(|dp| dp.unwrap()).collect();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 4);
        assert_eq!(found[0].label, "cats");
        assert_eq!(found[0].path, label.join("4"));
        assert_eq!(iter.malformed().len(), 2);
    }

    #[test]
    fn test_missing_root_is_scan_error() {
        let tmp = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(tmp.path().join("missing"));
        assert!(matches!(scanner.datasets(), Err(Error::Scan { .. })));
    }

    #[test]
    fn test_rescan_sees_new_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(tmp.path());
        assert_eq!(scanner.datasets().unwrap().count(), 0);
        fs::create_dir(tmp.path().join("late")).unwrap();
        assert_eq!(scanner.datasets().unwrap().count(), 1);
    }
}

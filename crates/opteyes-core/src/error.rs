use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A directory that must be listed could not be opened. Aborts the pass.
    #[error("Scan error at {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A datapoint referenced a dataset that does not exist.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Dataset '{0}' not valid")]
    UnknownDataset(String),

    #[error("Label '{label}' not valid for dataset '{dataset}'")]
    UnknownLabel { dataset: String, label: String },

    /// A datapoint with id `i64::MAX` exists, so no further id can be assigned.
    #[error("No datapoint id left to assign (highest id is {})", i64::MAX)]
    IdsExhausted,

    #[error("Datapoint must have at least one image")]
    NoImages,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref msg)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::Constraint(
                    msg.clone()
                        .unwrap_or_else(|| "FOREIGN KEY constraint failed".to_string()),
                )
            }
            other => Error::Database(other),
        }
    }
}

impl Error {
    pub(crate) fn scan(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Scan {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn from_walk(dir: &Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.to_path_buf());
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
        Error::Scan { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

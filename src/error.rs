use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce the canonical table. Either variant is fatal to the
/// session: nothing downstream runs on partial data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("data file not found: {}", path.display())]
    Unavailable { path: PathBuf },
    #[error("cannot read {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl DataError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DataError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from loading or compiling the dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("synonym table has a cycle through '{0}'")]
    SynonymCycle(String),
    #[error("{0} must not be blank")]
    BlankLabel(&'static str),
}

/// Errors from writing the filtered CSV export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

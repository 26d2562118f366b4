use std::path::{Path, PathBuf};
use thiserror::Error;

/// Read, write or stat failure, with the path it happened on
#[derive(Error, Debug)]
#[error("I/O error on {}: {source}", path.display())]
pub struct IoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Failure that did not come from the OS, such as an injected test fault
    pub fn other(path: &Path, message: impl Into<String>) -> Self {
        Self::new(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, message.into()),
        )
    }
}

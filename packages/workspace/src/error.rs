use arbor_common::IoError;
use arbor_library::LibraryError;
use arbor_model::{ComponentId, NamingConflictError, StructuralError};
use arbor_parser::CodecError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("{}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    NamingConflict(#[from] NamingConflictError),

    #[error("Opening {} was aborted; components differ from the library: {}", path.display(), join(ids))]
    OpenAborted {
        path: PathBuf,
        ids: BTreeSet<ComponentId>,
    },

    #[error("Component '{id}' is invalid: {source}")]
    Invalid {
        id: ComponentId,
        #[source]
        source: StructuralError,
    },

    #[error("Component '{id}' cannot be embedded: {source}")]
    Incompatible {
        id: ComponentId,
        #[source]
        source: StructuralError,
    },

    #[error("Component '{0}' is not in the library")]
    ComponentNotFound(ComponentId),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn join(ids: &BTreeSet<ComponentId>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl WorkspaceError {
    pub fn codec(path: impl Into<PathBuf>, source: CodecError) -> Self {
        Self::Codec {
            path: path.into(),
            source,
        }
    }
}

use crate::error::WorkspaceError;
use arbor_common::{DocumentFilter, FileSystem};
use arbor_library::LIBRARY_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "arbor.config.json";

/// Workspace configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Document file extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names never descended into
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Serializer indentation width in spaces
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_extensions() -> Vec<String> {
    vec!["xml".to_string()]
}

fn default_exclude() -> Vec<String> {
    [".git", "node_modules", "target"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_indent() -> usize {
    2
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: default_exclude(),
            indent: default_indent(),
        }
    }
}

impl WorkspaceConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load the config of the workspace at `root`. A missing file yields the defaults.
    pub async fn load<F: FileSystem + ?Sized>(fs: &F, root: &Path) -> Result<Self, WorkspaceError> {
        let path = root.join(CONFIG_FILE_NAME);
        match fs.read_file(&path).await? {
            Some(file) => Self::from_json(&file.content)
                .map_err(|source| WorkspaceError::Config { path, source }),
            None => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Filter selecting this workspace's documents. The library file is never a document.
    pub fn document_filter(&self) -> DocumentFilter {
        DocumentFilter::new(self.extensions.clone(), self.exclude.clone()).ignoring(LIBRARY_FILE_NAME)
    }
}

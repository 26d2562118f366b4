//! Bookkeeping of the document files in a workspace folder. Holds no graph
//! data, only paths and their last observed modification markers.

use arbor_common::{DocumentFilter, FileEntry, FileSystem, IoError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFile {
    pub path: PathBuf,
    pub name: String,
    pub last_known_modified_time: DateTime<Utc>,
}

impl From<FileEntry> for IndexedFile {
    fn from(entry: FileEntry) -> Self {
        Self {
            path: entry.path,
            name: entry.name,
            last_known_modified_time: entry.modified_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceIndex {
    root_path: PathBuf,
    files: Vec<IndexedFile>,
}

impl WorkspaceIndex {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            files: Vec::new(),
        }
    }

    /// Enumerate the documents below `root_path`
    pub async fn build<F: FileSystem + ?Sized>(
        fs: &F,
        root_path: impl Into<PathBuf>,
        filter: &DocumentFilter,
    ) -> Result<Self, IoError> {
        let root_path = root_path.into();
        let entries = fs.list_document_files(&root_path, filter).await?;
        debug!(root = %root_path.display(), files = entries.len(), "Indexed workspace");
        Ok(Self {
            root_path,
            files: entries.into_iter().map(IndexedFile::from).collect(),
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn files(&self) -> &[IndexedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&IndexedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Paths of every indexed file except `path`, in index order
    pub fn others(&self, path: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.path != path)
            .map(|f| f.path.clone())
            .collect()
    }

    /// Record a newly observed modification marker, adding the file if it
    /// is not indexed yet
    pub fn record(&mut self, path: &Path, modified_time: DateTime<Utc>) {
        match self.files.iter_mut().find(|f| f.path == path) {
            Some(file) => file.last_known_modified_time = modified_time,
            None => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.files.push(IndexedFile {
                    path: path.to_path_buf(),
                    name,
                    last_known_modified_time: modified_time,
                });
                self.files.sort_by(|a, b| a.path.cmp(&b.path));
            }
        }
    }
}

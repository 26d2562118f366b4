//! Filesystem contract consumed from the host.
//!
//! The engine never touches the disk directly. Everything goes through
//! [`FileSystem`], so an editor host can supply its own implementation and
//! tests can run against [`MemoryFileSystem`].

use crate::error::IoError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// A document file found in a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub modified_time: DateTime<Utc>,
}

/// Content of a file together with its modification marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub content: String,
    pub modified_time: DateTime<Utc>,
}

/// Decides which files in a folder are documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Accepted extensions, without the dot
    pub extensions: Vec<String>,
    /// Directory names never descended into
    pub exclude: Vec<String>,
    /// File names skipped wherever they appear
    pub ignored_files: Vec<String>,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::new(vec!["xml".to_string()], Vec::new())
    }
}

impl DocumentFilter {
    pub fn new(extensions: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            extensions,
            exclude,
            ignored_files: Vec::new(),
        }
    }

    pub fn ignoring(mut self, file_name: impl Into<String>) -> Self {
        self.ignored_files.push(file_name.into());
        self
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }

    fn accepts_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if self.ignored_files.iter().any(|f| f == name) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// True if `path`, somewhere below `folder`, is a document
    pub fn matches(&self, folder: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(folder) else {
            return false;
        };
        let mut dirs = relative.parent().into_iter().flat_map(|p| p.components());
        let in_excluded_dir = dirs.any(|c| self.is_excluded_dir(&c.as_os_str().to_string_lossy()));
        !in_excluded_dir && self.accepts_file(path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Host filesystem operations. All of them suspend the caller.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Every document below `folder`, sorted by path
    async fn list_document_files(
        &self,
        folder: &Path,
        filter: &DocumentFilter,
    ) -> Result<Vec<FileEntry>, IoError>;

    /// `None` when the file does not exist
    async fn read_file(&self, path: &Path) -> Result<Option<FileContent>, IoError>;

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), IoError>;

    /// `None` when the file does not exist
    async fn modified_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, IoError>;
}

/// Real file system implementation over tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn list_document_files(
        &self,
        folder: &Path,
        filter: &DocumentFilter,
    ) -> Result<Vec<FileEntry>, IoError> {
        let root = folder.to_path_buf();
        let filter = filter.clone();

        let walked = tokio::task::spawn_blocking(move || walk_documents(&root, &filter))
            .await
            .map_err(|e| IoError::other(folder, e.to_string()))?;

        let mut entries = walked?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn read_file(&self, path: &Path) -> Result<Option<FileContent>, IoError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IoError::new(path, e)),
        };
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| IoError::new(path, e))?;
        let modified = metadata.modified().map_err(|e| IoError::new(path, e))?;

        Ok(Some(FileContent {
            content,
            modified_time: modified.into(),
        }))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), IoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IoError::new(parent, e))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| IoError::new(path, e))
    }

    async fn modified_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, IoError> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => {
                let modified = metadata.modified().map_err(|e| IoError::new(path, e))?;
                Ok(Some(modified.into()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IoError::new(path, e)),
        }
    }
}

fn walk_documents(root: &Path, filter: &DocumentFilter) -> Result<Vec<FileEntry>, IoError> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !filter.is_excluded_dir(&entry.file_name().to_string_lossy())
    });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            IoError::other(&path, e.to_string())
        })?;
        if !entry.file_type().is_file() || !filter.accepts_file(entry.path()) {
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| IoError::other(entry.path(), e.to_string()))?;
        let modified = metadata
            .modified()
            .map_err(|e| IoError::new(entry.path(), e))?;

        entries.push(FileEntry {
            path: entry.path().to_path_buf(),
            name: file_name(entry.path()),
            modified_time: modified.into(),
        });
    }

    Ok(entries)
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified_time: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, MemoryFile>,
    clock: u64,
    reads: Vec<PathBuf>,
    writes: Vec<PathBuf>,
    failing_reads: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
}

impl MemoryState {
    /// Every change advances the clock by one second
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        let time: SystemTime = UNIX_EPOCH + Duration::from_secs(self.clock);
        time.into()
    }

    fn put(&mut self, path: PathBuf, content: String) {
        let modified_time = self.tick();
        self.files.insert(path, MemoryFile { content, modified_time });
    }
}

/// In-memory file system for testing, with a logical clock, an access log
/// and per-path failure injection
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: Mutex<MemoryState>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Put a file without recording a write
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.lock().put(path.into(), content.into());
    }

    pub fn content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).map(|f| f.content.clone())
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.lock().files.contains_key(path.as_ref())
    }

    /// Paths written through the trait, in order
    pub fn writes(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    /// Paths read through the trait, in order
    pub fn reads(&self) -> Vec<PathBuf> {
        self.lock().reads.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.reads.clear();
        state.writes.clear();
    }

    /// Make every later write to `path` fail
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        self.lock().failing_writes.insert(path.into());
    }

    /// Make every later read of `path` fail
    pub fn fail_reads_from(&self, path: impl Into<PathBuf>) {
        self.lock().failing_reads.insert(path.into());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn list_document_files(
        &self,
        folder: &Path,
        filter: &DocumentFilter,
    ) -> Result<Vec<FileEntry>, IoError> {
        let state = self.lock();
        Ok(state
            .files
            .iter()
            .filter(|(path, _)| filter.matches(folder, path))
            .map(|(path, file)| FileEntry {
                path: path.clone(),
                name: file_name(path),
                modified_time: file.modified_time,
            })
            .collect())
    }

    async fn read_file(&self, path: &Path) -> Result<Option<FileContent>, IoError> {
        let mut state = self.lock();
        if state.failing_reads.contains(path) {
            return Err(IoError::other(path, "simulated read failure"));
        }
        state.reads.push(path.to_path_buf());
        Ok(state.files.get(path).map(|file| FileContent {
            content: file.content.clone(),
            modified_time: file.modified_time,
        }))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<(), IoError> {
        let mut state = self.lock();
        if state.failing_writes.contains(path) {
            return Err(IoError::other(path, "simulated write failure"));
        }
        state.writes.push(path.to_path_buf());
        state.put(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn modified_time(&self, path: &Path) -> Result<Option<DateTime<Utc>>, IoError> {
        Ok(self.lock().files.get(path).map(|f| f.modified_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> DocumentFilter {
        DocumentFilter::new(vec!["xml".to_string()], vec!["target".to_string()])
            .ignoring("library.xml")
    }

    #[test]
    fn test_filter_matches() {
        let root = Path::new("/ws");
        let filter = filter();
        assert!(filter.matches(root, Path::new("/ws/a.xml")));
        assert!(filter.matches(root, Path::new("/ws/sub/b.XML")));
        assert!(!filter.matches(root, Path::new("/ws/notes.txt")));
        assert!(!filter.matches(root, Path::new("/ws/target/c.xml")));
        assert!(!filter.matches(root, Path::new("/ws/library.xml")));
        assert!(!filter.matches(root, Path::new("/other/a.xml")));
    }

    #[tokio::test]
    async fn test_memory_fs_clock_advances_on_write() {
        let fs = MemoryFileSystem::new().with_file("/ws/a.xml", "one");
        let before = fs.modified_time(Path::new("/ws/a.xml")).await.unwrap().unwrap();

        fs.write_file(Path::new("/ws/a.xml"), "two").await.unwrap();
        let after = fs.modified_time(Path::new("/ws/a.xml")).await.unwrap().unwrap();

        assert!(after > before);
        assert_eq!(fs.content("/ws/a.xml").as_deref(), Some("two"));
        assert_eq!(fs.writes(), vec![PathBuf::from("/ws/a.xml")]);
    }

    #[tokio::test]
    async fn test_memory_fs_missing_file() {
        let fs = MemoryFileSystem::new();
        assert_eq!(fs.read_file(Path::new("/nope.xml")).await.unwrap(), None);
        assert_eq!(fs.modified_time(Path::new("/nope.xml")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_fs_failure_injection() {
        let fs = MemoryFileSystem::new().with_file("/ws/a.xml", "one");
        fs.fail_writes_to("/ws/a.xml");
        fs.fail_reads_from("/ws/a.xml");

        assert!(fs.write_file(Path::new("/ws/a.xml"), "two").await.is_err());
        assert!(fs.read_file(Path::new("/ws/a.xml")).await.is_err());
        assert_eq!(fs.content("/ws/a.xml").as_deref(), Some("one"));
        assert!(fs.writes().is_empty());
    }

    #[tokio::test]
    async fn test_memory_fs_listing() {
        let fs = MemoryFileSystem::new()
            .with_file("/ws/b.xml", "")
            .with_file("/ws/a.xml", "")
            .with_file("/ws/library.xml", "")
            .with_file("/ws/target/c.xml", "");

        let files = fs.list_document_files(Path::new("/ws"), &filter()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }

    #[tokio::test]
    async fn test_real_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        let path = dir.path().join("nested").join("a.xml");

        assert_eq!(fs.read_file(&path).await.unwrap(), None);
        fs.write_file(&path, "<root/>").await.unwrap();

        let read = fs.read_file(&path).await.unwrap().unwrap();
        assert_eq!(read.content, "<root/>");
        assert!(fs.modified_time(&path).await.unwrap().is_some());

        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target").join("skip.xml"), "").unwrap();
        std::fs::write(dir.path().join("readme.md"), "").unwrap();

        let files = fs.list_document_files(dir.path(), &filter()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.xml");
    }
}

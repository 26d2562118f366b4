//! # Save pipeline
//!
//! ```text
//! 1. validate, write the document to its own path (failure aborts the save)
//! 2. merge its components into the library, write the library file
//! 3. for each other indexed file, in index order:
//!      read → parse → refs ∩ modified ids?
//!        no  → untouched, never written
//!        yes → upsert library copies → serialize → write
//!    a failure (including a component whose node types clash with the
//!    file's) is recorded and the next file is processed
//! ```
//!
//! Phase 2 always completes before phase 3 reads anything, so propagated
//! copies are the freshly merged canonical ones. Files are processed one at a
//! time. Nothing is rolled back when a peripheral file fails.

use crate::error::WorkspaceError;
use crate::index::WorkspaceIndex;
use arbor_common::FileSystem;
use arbor_library::LibraryStore;
use arbor_model::{ComponentId, Document};
use arbor_parser::{parse, Serializer};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a peripheral file failed during propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Parse,
    Merge,
    Write,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            FailureStage::Read => "read",
            FailureStage::Parse => "parse",
            FailureStage::Merge => "merge",
            FailureStage::Write => "write",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub message: String,
}

impl PropagationFailure {
    fn new(path: &Path, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            stage,
            message: message.into(),
        }
    }
}

/// Result of a save. The save itself succeeded; `failures` lists the other
/// files that could not be brought up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub rewritten: Vec<PathBuf>,
    pub untouched: Vec<PathBuf>,
    pub failures: Vec<PropagationFailure>,
}

impl SaveOutcome {
    /// True when every file that needed the update received it
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Propagator<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    library_path: &'a Path,
    indent: usize,
}

impl<'a, F: FileSystem + ?Sized> Propagator<'a, F> {
    pub fn new(fs: &'a F, library_path: &'a Path, indent: usize) -> Self {
        Self {
            fs,
            library_path,
            indent,
        }
    }

    fn serializer(&self) -> Serializer {
        Serializer::with_indent(self.indent)
    }

    /// Save `document` to `path` and cascade its modified components
    pub async fn save(
        &self,
        document: &mut Document,
        path: &Path,
        index: &mut WorkspaceIndex,
        library: &mut LibraryStore,
    ) -> Result<SaveOutcome, WorkspaceError> {
        // Phase 1
        document
            .validate()
            .map_err(|(id, source)| WorkspaceError::Invalid { id, source })?;
        let text = self.serializer().serialize(document);
        self.fs.write_file(path, &text).await?;
        self.refresh_marker(index, path).await;
        info!(path = %path.display(), "Saved document");

        // Phase 2
        library.merge(document.embedded_components.values());
        library.persist(self.fs, self.library_path, self.indent).await?;

        // Phase 3
        let mut outcome = SaveOutcome::default();
        let modified = &document.modified_component_ids;
        let others = index.others(path);

        if modified.is_empty() {
            debug!("No modified components, skipping propagation");
            outcome.untouched = others;
        } else {
            for other in others {
                match self.propagate_to(&other, modified, library).await {
                    Ok(true) => {
                        self.refresh_marker(index, &other).await;
                        outcome.rewritten.push(other);
                    }
                    Ok(false) => outcome.untouched.push(other),
                    Err(failure) => {
                        warn!(
                            path = %failure.path.display(),
                            stage = %failure.stage,
                            error = %failure.message,
                            "Propagation skipped file"
                        );
                        outcome.failures.push(failure);
                    }
                }
            }
        }

        info!(
            rewritten = outcome.rewritten.len(),
            untouched = outcome.untouched.len(),
            failed = outcome.failures.len(),
            "Propagation finished"
        );
        document.mark_saved();
        Ok(outcome)
    }

    /// Bring one file up to date. `Ok(false)` means it references none of
    /// the modified components and was left alone.
    async fn propagate_to(
        &self,
        path: &Path,
        modified: &BTreeSet<ComponentId>,
        library: &LibraryStore,
    ) -> Result<bool, PropagationFailure> {
        let file = self
            .fs
            .read_file(path)
            .await
            .map_err(|e| PropagationFailure::new(path, FailureStage::Read, e.to_string()))?
            .ok_or_else(|| PropagationFailure::new(path, FailureStage::Read, "file no longer exists"))?;

        let mut document = parse(&file.content)
            .map_err(|e| PropagationFailure::new(path, FailureStage::Parse, e.to_string()))?;

        let affected: Vec<ComponentId> = document
            .referenced_component_ids()
            .into_iter()
            .filter(|id| modified.contains(id) && id != document.main_id() && library.contains(id))
            .collect();

        if affected.is_empty() {
            debug!(path = %path.display(), "No modified references");
            return Ok(false);
        }

        for id in &affected {
            if let Some(canonical) = library.checkout(id) {
                document
                    .check_tag_categories_with(&canonical)
                    .map_err(|e| PropagationFailure::new(path, FailureStage::Merge, e.to_string()))?;
                document.replace_component(canonical);
            }
        }

        let text = self.serializer().serialize(&document);
        self.fs
            .write_file(path, &text)
            .await
            .map_err(|e| PropagationFailure::new(path, FailureStage::Write, e.to_string()))?;

        debug!(path = %path.display(), components = ?affected, "Propagated components");
        Ok(true)
    }

    /// Record the file's current modification marker. A failed stat only
    /// leaves the old marker in place.
    async fn refresh_marker(&self, index: &mut WorkspaceIndex, path: &Path) {
        match self.fs.modified_time(path).await {
            Ok(Some(time)) => index.record(path, time),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not stat file"),
        }
    }
}

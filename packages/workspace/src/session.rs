use crate::config::WorkspaceConfig;
use crate::error::WorkspaceError;
use crate::index::WorkspaceIndex;
use crate::propagate::{Propagator, SaveOutcome};
use crate::reconcile::{
    detect_discrepancy, resolve, ComponentComparator, DiscrepancyReport, ReconcilePolicy,
    ShapeComparator,
};
use arbor_common::FileSystem;
use arbor_library::{LibraryStore, LIBRARY_FILE_NAME};
use arbor_model::{ComponentDefinition, ComponentId, Document, NamingConflictError};
use arbor_parser::parse;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An open workspace folder: its config, document index and library
pub struct Workspace<F: FileSystem> {
    fs: F,
    root: PathBuf,
    config: WorkspaceConfig,
    index: WorkspaceIndex,
    library: LibraryStore,
    library_path: PathBuf,
    comparator: Box<dyn ComponentComparator>,
}

impl<F: FileSystem> Workspace<F> {
    /// Open the workspace at `root`. A missing library file is created empty.
    pub async fn open(fs: F, root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let root = root.into();
        let config = WorkspaceConfig::load(&fs, &root).await?;
        let index = WorkspaceIndex::build(&fs, root.clone(), &config.document_filter()).await?;
        let library_path = root.join(LIBRARY_FILE_NAME);

        let library = match LibraryStore::try_load(&fs, &library_path).await? {
            Some(library) => library,
            None => {
                let library = LibraryStore::new();
                library.persist(&fs, &library_path, config.indent).await?;
                info!(path = %library_path.display(), "Created empty library");
                library
            }
        };

        info!(
            root = %root.display(),
            documents = index.len(),
            components = library.len(),
            "Opened workspace"
        );

        Ok(Self {
            fs,
            root,
            config,
            index,
            library,
            library_path,
            comparator: Box::new(ShapeComparator),
        })
    }

    /// Swap the check used to detect diverging components
    pub fn with_comparator(mut self, comparator: impl ComponentComparator + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn index(&self) -> &WorkspaceIndex {
        &self.index
    }

    pub fn library(&self) -> &LibraryStore {
        &self.library
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn comparator(&self) -> &dyn ComponentComparator {
        self.comparator.as_ref()
    }

    /// Relative paths are taken relative to the workspace root
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read and parse a document, reconciling it against the library.
    ///
    /// `decide` is only consulted when at least one embedded component
    /// differs from its library copy. Parse and structural errors abort.
    pub async fn open_document<D>(&self, path: impl AsRef<Path>, decide: D) -> Result<Document, WorkspaceError>
    where
        D: FnOnce(&DiscrepancyReport) -> ReconcilePolicy,
    {
        let path = self.resolve_path(path);
        let file = self
            .fs
            .read_file(&path)
            .await?
            .ok_or_else(|| WorkspaceError::FileNotFound(path.clone()))?;

        let document = parse(&file.content).map_err(|e| WorkspaceError::codec(&path, e))?;

        let ids = self.detect(&document);
        if ids.is_empty() {
            debug!(path = %path.display(), "Document agrees with library");
            return Ok(document);
        }

        let report = DiscrepancyReport::new(&document, &self.library, &ids);
        let policy = decide(&report);
        info!(path = %path.display(), ?policy, components = ids.len(), "Reconciling document");

        resolve(document, &self.library, &ids, policy).map_err(|aborted| WorkspaceError::OpenAborted {
            path,
            ids: aborted.ids,
        })
    }

    /// Ids of the document's embedded components that diverge from the library
    pub fn detect(&self, document: &Document) -> BTreeSet<ComponentId> {
        detect_discrepancy(&document.embedded_components, &self.library, self.comparator.as_ref())
    }

    /// Add a new empty component to `document`. The id must be free in both
    /// the document and the library.
    pub fn create_component(&self, document: &mut Document, id: impl Into<ComponentId>) -> Result<(), WorkspaceError> {
        let id = id.into();
        if document.has_component(&id) || self.library.contains(&id) {
            return Err(NamingConflictError::new(id).into());
        }

        document.insert_component(ComponentDefinition::new(id.clone()))?;
        document.mark_modified(id);
        Ok(())
    }

    /// Embed a copy of a library component into `document`
    pub fn import_component(&self, document: &mut Document, id: &str) -> Result<(), WorkspaceError> {
        if document.has_component(id) {
            return Err(NamingConflictError::new(id).into());
        }

        let component = self
            .library
            .checkout(id)
            .ok_or_else(|| WorkspaceError::ComponentNotFound(id.to_string()))?;
        document
            .check_tag_categories_with(&component)
            .map_err(|source| WorkspaceError::Incompatible {
                id: id.to_string(),
                source,
            })?;
        document.insert_component(component)?;
        Ok(())
    }

    /// Save `document` at `path` and propagate its modified components to
    /// every other document that references them
    pub async fn save_document(
        &mut self,
        path: impl AsRef<Path>,
        document: &mut Document,
    ) -> Result<SaveOutcome, WorkspaceError> {
        let path = self.resolve_path(path);
        Propagator::new(&self.fs, &self.library_path, self.config.indent)
            .save(document, &path, &mut self.index, &mut self.library)
            .await
    }

    /// Re-enumerate the documents on disk
    pub async fn refresh_index(&mut self) -> Result<(), WorkspaceError> {
        self.index = WorkspaceIndex::build(&self.fs, self.root.clone(), &self.config.document_filter()).await?;
        Ok(())
    }
}

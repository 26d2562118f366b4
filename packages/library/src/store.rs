use crate::error::LibraryError;
use arbor_common::FileSystem;
use arbor_model::{ComponentDefinition, ComponentId, ComponentMap};
use arbor_parser::{parse_components, Serializer};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info};

/// Workspace-relative name of the library file
pub const LIBRARY_FILE_NAME: &str = "arbor.library.xml";

/// Canonical components of one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryStore {
    components: ComponentMap,
    last_modified: DateTime<Utc>,
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::from_components(ComponentMap::new(), Utc::now())
    }

    pub fn from_components(components: ComponentMap, last_modified: DateTime<Utc>) -> Self {
        Self {
            components,
            last_modified,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ComponentDefinition> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Value copy of a component, for instantiating it into a document
    pub fn checkout(&self, id: &str) -> Option<ComponentDefinition> {
        self.components.get(id).cloned()
    }

    pub fn components(&self) -> &ComponentMap {
        &self.components
    }

    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.components.keys()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Upsert every given component by id and refresh `last_modified`.
    /// New ids are appended; existing ids keep their position.
    pub fn merge<'a>(&mut self, components: impl IntoIterator<Item = &'a ComponentDefinition>) {
        let mut count = 0;
        for component in components {
            self.components.insert(component.id.clone(), component.clone());
            count += 1;
        }
        self.last_modified = Utc::now();
        debug!(count, "Merged components into library");
    }

    /// Decode library text
    pub fn from_text(text: &str, last_modified: DateTime<Utc>) -> Result<Self, arbor_parser::CodecError> {
        Ok(Self::from_components(parse_components(text)?, last_modified))
    }

    pub fn to_text(&self, indent: usize) -> String {
        Serializer::with_indent(indent).serialize_components(self.components.values())
    }

    /// Read the library file. `None` when it does not exist.
    pub async fn try_load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Option<Self>, LibraryError> {
        let Some(file) = fs.read_file(path).await? else {
            return Ok(None);
        };

        let store = Self::from_text(&file.content, file.modified_time).map_err(|source| {
            LibraryError::Codec {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!(path = %path.display(), components = store.len(), "Loaded library");
        Ok(Some(store))
    }

    /// Read the library file, or an empty store when it does not exist
    pub async fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Self, LibraryError> {
        Ok(Self::try_load(fs, path).await?.unwrap_or_default())
    }

    /// Write the library file
    pub async fn persist<F: FileSystem + ?Sized>(&self, fs: &F, path: &Path, indent: usize) -> Result<(), LibraryError> {
        fs.write_file(path, &self.to_text(indent)).await?;
        info!(path = %path.display(), components = self.len(), "Wrote library");
        Ok(())
    }
}

use crate::core::io::pdb::{PdbFile, StructureFileError};
use crate::core::io::traits::StructureFile;
use crate::core::models::selector::{IndexSelector, ResidueResolver, ResolvedResidue};
use crate::core::models::structure::Structure;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const STRUCTURE_EXTENSION: &str = "pdb";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Structure '{0}' is not available")]
    NotFound(String),

    #[error("Residue {selector:?} does not exist in structure '{id}'")]
    MissingResidue { id: String, selector: IndexSelector },

    #[error("Failed to read structure '{id}' from '{path}': {source}")]
    Read {
        id: String,
        path: PathBuf,
        #[source]
        source: StructureFileError,
    },

    #[error("Failed to list structures in '{path}': {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of structure coordinates for indexing and hit scoring.
pub trait StructureProvider: Send + Sync {
    /// Every structure id this provider can serve, sorted.
    fn ids(&self) -> Result<Vec<String>, ProviderError>;

    fn structure(&self, id: &str) -> Result<Arc<Structure>, ProviderError>;

    /// Typed, operator-transformed residues of one structure.
    fn resolve(
        &self,
        id: &str,
        selectors: &[IndexSelector],
    ) -> Result<Vec<ResolvedResidue>, ProviderError> {
        let resolver = ResidueResolver::new(self.structure(id)?);
        selectors
            .iter()
            .map(|selector| {
                resolver
                    .resolve(selector)
                    .ok_or_else(|| ProviderError::MissingResidue {
                        id: id.to_string(),
                        selector: selector.clone(),
                    })
            })
            .collect()
    }
}

/// Structures held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    structures: BTreeMap<String, Arc<Structure>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, structure: Structure) {
        self.structures
            .insert(structure.id.clone(), Arc::new(structure));
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<Structure>> {
        self.structures.remove(id)
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

impl FromIterator<Structure> for InMemoryProvider {
    fn from_iter<I: IntoIterator<Item = Structure>>(iter: I) -> Self {
        let mut provider = Self::new();
        for structure in iter {
            provider.insert(structure);
        }
        provider
    }
}

impl StructureProvider for InMemoryProvider {
    fn ids(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.structures.keys().cloned().collect())
    }

    fn structure(&self, id: &str) -> Result<Arc<Structure>, ProviderError> {
        self.structures
            .get(id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

/// Reads `<dir>/<id>.pdb` on every request.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    dir: PathBuf,
}

impl DirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{STRUCTURE_EXTENSION}"))
    }
}

impl StructureProvider for DirectoryProvider {
    fn ids(&self) -> Result<Vec<String>, ProviderError> {
        let list_error = |source| ProviderError::List {
            path: self.dir.clone(),
            source,
        };
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(list_error)? {
            let path = entry.map_err(list_error)?.path();
            let is_structure = path
                .extension()
                .is_some_and(|ext| ext == STRUCTURE_EXTENSION);
            if !path.is_file() || !is_structure {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => ids.push(stem.to_string()),
                None => debug!(path = %path.display(), "Skipping file with non UTF-8 name"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn structure(&self, id: &str) -> Result<Arc<Structure>, ProviderError> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        PdbFile::read_from_path(&path)
            .map(Arc::new)
            .map_err(|source| ProviderError::Read {
                id: id.to_string(),
                path,
                source,
            })
    }
}

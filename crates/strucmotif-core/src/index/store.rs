use super::bucket::{Bucket, BucketBuilder};
use super::error::IndexError;
use super::manifest::{IndexManifest, IndexSettings};
use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::descriptor::occurrence::ResiduePairOccurrence;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const MANIFEST_FILE: &str = "index.toml";
pub const BUCKET_DIR: &str = "buckets";
const SHARD_COUNT: u32 = 256;

/// What a query does when a bucket cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IoFailurePolicy {
    /// Abort the query with the underlying error.
    #[default]
    FailQuery,
    /// Record the segment for reinitialization, treat it as empty and keep serving.
    MarkForReinitialization,
}

/// Occurrences of one or more structures waiting to be committed.
#[derive(Debug, Default)]
pub struct IndexBatch {
    buckets: BTreeMap<ResiduePairDescriptor, BucketBuilder>,
    structures: usize,
    occurrences: usize,
}

impl IndexBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_structure<I>(&mut self, structure_index: u32, occurrences: I)
    where
        I: IntoIterator<Item = ResiduePairOccurrence>,
    {
        self.structures += 1;
        for occurrence in occurrences {
            self.occurrences += 1;
            self.buckets
                .entry(occurrence.descriptor)
                .or_default()
                .add(structure_index, occurrence.identifier);
        }
    }

    pub fn structure_count(&self) -> usize {
        self.structures
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrences
    }

    pub fn is_empty(&self) -> bool {
        self.structures == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitSummary {
    pub structures: usize,
    pub occurrences: usize,
    pub buckets_written: usize,
}

/// Persistent map from residue-pair descriptor to [`Bucket`].
///
/// Layout below the root directory:
///
/// ```text
/// index.toml                               manifest: settings and structure registry
/// buckets/<descriptor % 256>/<descriptor>.bkt
/// ```
///
/// Reads never modify files. Writes only happen in [`InvertedIndex::commit`], which
/// reserves the batch's structure indices in the manifest, replaces each touched file
/// atomically and writes the full manifest last.
#[derive(Debug)]
pub struct InvertedIndex {
    root: PathBuf,
    manifest: IndexManifest,
    persisted: IndexManifest,
    failure_policy: IoFailurePolicy,
    reinitialize: Mutex<BTreeSet<ResiduePairDescriptor>>,
    retired: BTreeSet<u32>,
}

impl InvertedIndex {
    /// Opens the index at `root`, creating it with `settings` when no manifest exists.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::SettingsMismatch`] if an existing index was built with
    /// incompatible settings.
    pub fn create(root: impl AsRef<Path>, settings: IndexSettings) -> Result<Self, IndexError> {
        let root = root.as_ref();
        if root.join(MANIFEST_FILE).is_file() {
            let mut index = Self::open(root)?;
            index.manifest.settings().check_compatible(&settings)?;
            index.manifest = index.manifest.with_commit_interval(settings.commit_interval);
            index.persisted = index.manifest.clone();
            return Ok(index);
        }
        fs::create_dir_all(root.join(BUCKET_DIR)).map_err(IndexError::io(root))?;
        let index = Self::from_manifest(root, IndexManifest::new(settings));
        index.write_manifest()?;
        info!(root = %root.display(), "Created new index");
        Ok(index)
    }

    /// Opens an existing index.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, IndexError> {
        let root = root.as_ref();
        let path = root.join(MANIFEST_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::NotFound(path));
            }
            Err(e) => return Err(IndexError::io(&path)(e)),
        };
        let manifest = IndexManifest::from_toml(&text, &path)?;
        debug!(
            root = %root.display(),
            structures = manifest.structure_count(),
            "Opened index"
        );
        Ok(Self::from_manifest(root, manifest))
    }

    fn from_manifest(root: &Path, manifest: IndexManifest) -> Self {
        let retired: BTreeSet<u32> = manifest.retired_indices().collect();
        if !retired.is_empty() {
            debug!(retired = retired.len(), "Stale structure indices will be dropped on commit");
        }
        Self {
            root: root.to_path_buf(),
            persisted: manifest.clone(),
            manifest,
            failure_policy: IoFailurePolicy::default(),
            reinitialize: Mutex::new(BTreeSet::new()),
            retired,
        }
    }

    pub fn with_failure_policy(mut self, policy: IoFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &IndexSettings {
        self.manifest.settings()
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn failure_policy(&self) -> IoFailurePolicy {
        self.failure_policy
    }

    pub fn structure_count(&self) -> usize {
        self.manifest.structure_count()
    }

    pub fn structure_id(&self, index: u32) -> Option<&str> {
        self.manifest.structure_id(index)
    }

    pub fn structure_index(&self, id: &str) -> Option<u32> {
        self.manifest.structure_index(id)
    }

    pub fn bucket_path(&self, descriptor: ResiduePairDescriptor) -> PathBuf {
        let packed = descriptor.packed();
        self.root
            .join(BUCKET_DIR)
            .join(format!("{:02x}", packed % SHARD_COUNT))
            .join(format!("{packed}.bkt"))
    }

    /// All occurrences stored for `descriptor`. A descriptor never seen yields an empty
    /// bucket.
    ///
    /// # Errors
    ///
    /// Under [`IoFailurePolicy::FailQuery`], an unreadable or corrupt bucket file is
    /// returned as an error. Under [`IoFailurePolicy::MarkForReinitialization`] it is
    /// recorded and treated as empty.
    pub fn select(&self, descriptor: ResiduePairDescriptor) -> Result<Bucket, IndexError> {
        if self.failure_policy == IoFailurePolicy::MarkForReinitialization
            && self.reinitialize.lock().contains(&descriptor)
        {
            return Ok(Bucket::default());
        }
        match self.read_bucket(descriptor) {
            Ok(bucket) => Ok(bucket),
            Err(error) => match self.failure_policy {
                IoFailurePolicy::FailQuery => Err(error),
                IoFailurePolicy::MarkForReinitialization => {
                    warn!(
                        %descriptor,
                        %error,
                        "Bucket unreadable, marking segment for reinitialization"
                    );
                    self.reinitialize.lock().insert(descriptor);
                    Ok(Bucket::default())
                }
            },
        }
    }

    /// Segments that failed to load since the index was opened.
    pub fn segments_to_reinitialize(&self) -> Vec<ResiduePairDescriptor> {
        self.reinitialize.lock().iter().copied().collect()
    }

    fn read_bucket(&self, descriptor: ResiduePairDescriptor) -> Result<Bucket, IndexError> {
        let path = self.bucket_path(descriptor);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Bucket::default()),
            Err(e) => return Err(IndexError::io(path)(e)),
        };
        self.settings()
            .codec
            .decode(&bytes)
            .map_err(|source| IndexError::Codec {
                descriptor,
                path,
                source,
            })
    }

    /// Assigns the next structure index to `id`. Indexing an id again retires its old index;
    /// the retired occurrences are dropped from every bucket the next commits touch.
    pub fn register(&mut self, id: &str) -> u32 {
        let (index, retired) = self.manifest.register(id);
        if let Some(old) = retired {
            debug!(structure = id, old, new = index, "Structure re-indexed");
            self.retired.insert(old);
        }
        index
    }

    /// Merges `batch` into the stored buckets and persists the manifest.
    ///
    /// Every touched bucket is read, merged and replaced through a temporary file and a
    /// rename, so a failed commit leaves each file either old or new, never partial.
    /// Before any bucket is touched the manifest on disk reserves the batch's indices, so
    /// occurrences left behind by a failed commit can never be attributed to a structure
    /// registered later. The full manifest is written after all buckets.
    pub fn commit(&mut self, batch: IndexBatch) -> Result<CommitSummary, IndexError> {
        let bound = self.manifest.index_bound();
        if self.persisted.index_bound() < bound {
            self.persisted.reserve(bound);
            write_manifest_file(&self.root, &self.persisted)?;
        }

        let summary = CommitSummary {
            structures: batch.structure_count(),
            occurrences: batch.occurrence_count(),
            buckets_written: batch.buckets.len(),
        };
        let work: Vec<(ResiduePairDescriptor, Bucket)> = batch
            .buckets
            .into_iter()
            .map(|(descriptor, builder)| (descriptor, builder.build()))
            .collect();

        let iterator = work.iter();

        #[cfg(feature = "parallel")]
        let iterator = work.par_iter();

        iterator
            .map(|(descriptor, bucket)| self.merge_into_file(*descriptor, bucket))
            .collect::<Result<Vec<()>, IndexError>>()?;

        self.write_manifest()?;
        self.persisted = self.manifest.clone();
        info!(
            structures = summary.structures,
            occurrences = summary.occurrences,
            buckets = summary.buckets_written,
            "Committed batch"
        );
        Ok(summary)
    }

    fn merge_into_file(
        &self,
        descriptor: ResiduePairDescriptor,
        batch: &Bucket,
    ) -> Result<(), IndexError> {
        let stored = self.read_bucket(descriptor)?;
        let stored = if self.retired.is_empty() {
            stored
        } else {
            stored.without_structures(&self.retired)
        };
        let merged = stored.merge(batch);
        let path = self.bucket_path(descriptor);
        let bytes = self
            .settings()
            .codec
            .encode(&merged)
            .map_err(|source| IndexError::Codec {
                descriptor,
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, &bytes)
    }

    fn write_manifest(&self) -> Result<(), IndexError> {
        write_manifest_file(&self.root, &self.manifest)
    }
}

fn write_manifest_file(root: &Path, manifest: &IndexManifest) -> Result<(), IndexError> {
    let text = manifest.to_toml()?;
    write_atomic(&root.join(MANIFEST_FILE), text.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(IndexError::io(dir))?;
    let mut file = NamedTempFile::new_in(dir).map_err(IndexError::io(dir))?;
    file.write_all(bytes).map_err(IndexError::io(path))?;
    file.as_file().sync_all().map_err(IndexError::io(path))?;
    file.persist(path)
        .map_err(|e| IndexError::io(path)(e.error))?;
    Ok(())
}

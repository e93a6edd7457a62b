use super::codec::BucketCodecKind;
use super::error::IndexError;
use crate::core::graph::builder::DEFAULT_CUTOFF;
use crate::core::graph::policy::InclusionPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;
pub const DEFAULT_COMMIT_INTERVAL: usize = 400;

/// Parameters fixed at index creation. Every structure in an index is extracted with the
/// same cutoff and inclusion policy and stored with the same codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct IndexSettings {
    pub cutoff: f64,
    pub codec: BucketCodecKind,
    pub commit_interval: usize,
    pub policy: InclusionPolicy,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            codec: BucketCodecKind::default(),
            commit_interval: DEFAULT_COMMIT_INTERVAL,
            policy: InclusionPolicy::default(),
        }
    }
}

impl IndexSettings {
    /// Checks that `requested` can extend an index built with `self`. The commit interval
    /// only affects batching and may differ.
    pub fn check_compatible(&self, requested: &IndexSettings) -> Result<(), IndexError> {
        let mismatch = |setting, stored: String, requested: String| {
            Err(IndexError::SettingsMismatch {
                setting,
                stored,
                requested,
            })
        };
        if (self.cutoff - requested.cutoff).abs() > f64::EPSILON {
            return mismatch("cutoff", self.cutoff.to_string(), requested.cutoff.to_string());
        }
        if self.policy != requested.policy {
            return mismatch(
                "policy",
                format!("{:?}", self.policy),
                format!("{:?}", requested.policy),
            );
        }
        if self.codec != requested.codec {
            return mismatch("codec", self.codec.to_string(), requested.codec.to_string());
        }
        Ok(())
    }
}

/// Contents of `index.toml`: settings plus the registry of indexed structures.
///
/// Structures get dense indices in registration order. Re-registering an id retires its
/// previous index, so stale occurrences still stored under it no longer resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexManifest {
    version: u32,
    next_index: u32,
    settings: IndexSettings,
    #[serde(default)]
    structures: BTreeMap<String, u32>,
    #[serde(skip)]
    ids_by_index: HashMap<u32, String>,
}

impl IndexManifest {
    pub fn new(settings: IndexSettings) -> Self {
        Self {
            version: FORMAT_VERSION,
            next_index: 0,
            settings,
            structures: BTreeMap::new(),
            ids_by_index: HashMap::new(),
        }
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, IndexError> {
        let mut manifest: IndexManifest =
            toml::from_str(text).map_err(|source| IndexError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        if manifest.version != FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion(manifest.version));
        }
        for (id, &index) in &manifest.structures {
            if index >= manifest.next_index {
                return Err(IndexError::Manifest(format!(
                    "structure '{id}' has index {index}, but only {} were assigned",
                    manifest.next_index
                )));
            }
            if let Some(other) = manifest.ids_by_index.insert(index, id.clone()) {
                return Err(IndexError::Manifest(format!(
                    "structures '{other}' and '{id}' share index {index}"
                )));
            }
        }
        Ok(manifest)
    }

    pub fn to_toml(&self) -> Result<String, IndexError> {
        Ok(toml::to_string(self)?)
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn with_commit_interval(mut self, commit_interval: usize) -> Self {
        self.settings.commit_interval = commit_interval;
        self
    }

    /// Number of live structures.
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Upper bound of all indices ever assigned.
    pub fn index_bound(&self) -> u32 {
        self.next_index
    }

    pub fn structure_id(&self, index: u32) -> Option<&str> {
        self.ids_by_index.get(&index).map(String::as_str)
    }

    pub fn structure_index(&self, id: &str) -> Option<u32> {
        self.structures.get(id).copied()
    }

    pub fn structure_ids(&self) -> impl Iterator<Item = (&str, u32)> {
        self.structures.iter().map(|(id, &index)| (id.as_str(), index))
    }

    /// Raises the index bound to at least `bound` without registering anything. Indices
    /// reserved this way and never registered count as retired.
    pub fn reserve(&mut self, bound: u32) {
        self.next_index = self.next_index.max(bound);
    }

    /// Indices below the bound that no live structure holds: re-indexed structures and
    /// reservations whose commit never completed.
    pub fn retired_indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.next_index).filter(|index| !self.ids_by_index.contains_key(index))
    }

    /// Assigns a fresh index to `id`. Returns the new index and the retired one, if any.
    pub fn register(&mut self, id: &str) -> (u32, Option<u32>) {
        let index = self.next_index;
        self.next_index += 1;
        let retired = self.structures.insert(id.to_string(), index);
        if let Some(old) = retired {
            self.ids_by_index.remove(&old);
        }
        self.ids_by_index.insert(index, id.to_string());
        (index, retired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::selector::LabelSelector;

    #[test]
    fn registry_assigns_dense_indices() {
        let mut manifest = IndexManifest::new(IndexSettings::default());
        assert_eq!(manifest.register("1abc"), (0, None));
        assert_eq!(manifest.register("2xyz"), (1, None));
        assert_eq!(manifest.structure_id(1), Some("2xyz"));
        assert_eq!(manifest.structure_index("1abc"), Some(0));
        assert_eq!(manifest.structure_count(), 2);
    }

    #[test]
    fn reregistering_retires_the_old_index() {
        let mut manifest = IndexManifest::new(IndexSettings::default());
        manifest.register("1abc");
        assert_eq!(manifest.register("1abc"), (1, Some(0)));
        assert_eq!(manifest.structure_id(0), None);
        assert_eq!(manifest.structure_id(1), Some("1abc"));
        assert_eq!(manifest.structure_count(), 1);
        assert_eq!(manifest.index_bound(), 2);
    }

    #[test]
    fn reserved_indices_are_retired_and_never_reassigned() {
        let mut manifest = IndexManifest::new(IndexSettings::default());
        manifest.register("1abc");
        manifest.reserve(3);
        manifest.reserve(2);
        assert_eq!(manifest.index_bound(), 3);
        assert_eq!(manifest.retired_indices().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(manifest.register("2xyz"), (3, None));
        manifest.register("1abc");
        assert_eq!(manifest.retired_indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn toml_round_trip_rebuilds_reverse_lookup() {
        let settings = IndexSettings {
            cutoff: 15.5,
            codec: BucketCodecKind::MessagePack,
            commit_interval: 10,
            policy: InclusionPolicy::Selection(vec![LabelSelector::new("A", 3)]),
        };
        let mut manifest = IndexManifest::new(settings);
        manifest.register("1abc");
        manifest.register("4hhb");
        let text = manifest.to_toml().unwrap();
        assert!(text.contains("codec = \"message-pack\""));
        let parsed = IndexManifest::from_toml(&text, Path::new("index.toml")).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.structure_id(1), Some("4hhb"));
    }

    #[test]
    fn rejects_duplicate_indices() {
        let text = r#"
            version = 1
            next-index = 2

            [settings]
            cutoff = 20.0
            codec = "compact"
            commit-interval = 400
            policy = "deposited"

            [structures]
            a = 1
            b = 1
        "#;
        assert!(matches!(
            IndexManifest::from_toml(text, Path::new("index.toml")),
            Err(IndexError::Manifest(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut manifest = IndexManifest::new(IndexSettings::default());
        manifest.version = 7;
        let text = manifest.to_toml().unwrap();
        assert!(matches!(
            IndexManifest::from_toml(&text, Path::new("index.toml")),
            Err(IndexError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn compatibility_ignores_commit_interval_only() {
        let stored = IndexSettings::default();
        let mut requested = stored.clone();
        requested.commit_interval = 5;
        assert!(stored.check_compatible(&requested).is_ok());
        requested.codec = BucketCodecKind::MessagePack;
        assert!(matches!(
            stored.check_compatible(&requested),
            Err(IndexError::SettingsMismatch { setting: "codec", .. })
        ));
        requested = stored.clone();
        requested.cutoff = 12.0;
        assert!(stored.check_compatible(&requested).is_err());
    }
}

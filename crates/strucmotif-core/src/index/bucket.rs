use super::codec::CodecError;
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::core::models::structure::OperatorId;
use std::collections::BTreeMap;

/// All occurrences of one descriptor, grouped by structure.
///
/// Stored as parallel arrays: ascending structure indices, the start offset of each
/// structure's run in the flat identifier array, the packed residue indices of every
/// occurrence, and a sparse overlay holding operator ids of non-identity endpoints.
/// An endpoint position is `2 * occurrence + endpoint`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    structure_indices: Vec<u32>,
    offsets: Vec<u32>,
    identifiers: Vec<u64>,
    operators: BTreeMap<u32, String>,
}

impl Bucket {
    /// Assembles a bucket from raw arrays, checking every structural invariant.
    pub fn from_parts(
        structure_indices: Vec<u32>,
        offsets: Vec<u32>,
        identifiers: Vec<u64>,
        operators: BTreeMap<u32, String>,
    ) -> Result<Self, CodecError> {
        let inconsistent = |message: &str| Err(CodecError::Inconsistent(message.to_string()));

        if structure_indices.len() != offsets.len() {
            return inconsistent("structure and offset arrays differ in length");
        }
        if structure_indices.windows(2).any(|w| w[0] >= w[1]) {
            return inconsistent("structure indices are not strictly increasing");
        }
        if offsets.first().is_some_and(|&first| first != 0) {
            return inconsistent("first offset is not zero");
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return inconsistent("offsets are not strictly increasing");
        }
        match offsets.last() {
            Some(&last) if last as usize >= identifiers.len() => {
                return inconsistent("last structure has no occurrences");
            }
            None if !identifiers.is_empty() => {
                return inconsistent("occurrences without a structure");
            }
            _ => {}
        }
        let endpoint_count = 2 * identifiers.len() as u64;
        if let Some((&position, _)) = operators.last_key_value() {
            if u64::from(position) >= endpoint_count {
                return inconsistent("operator overlay points past the last occurrence");
            }
        }
        if operators
            .values()
            .any(|operator| OperatorId::new(operator).is_identity())
        {
            return inconsistent("operator overlay stores the identity operator");
        }

        Ok(Self {
            structure_indices,
            offsets,
            identifiers,
            operators,
        })
    }

    pub fn structure_indices(&self) -> &[u32] {
        &self.structure_indices
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn identifiers(&self) -> &[u64] {
        &self.identifiers
    }

    pub fn operators(&self) -> &BTreeMap<u32, String> {
        &self.operators
    }

    pub fn structure_count(&self) -> usize {
        self.structure_indices.len()
    }

    pub fn occurrence_count(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure_indices.is_empty()
    }

    fn operator_at(&self, position: u64) -> OperatorId {
        u32::try_from(position)
            .ok()
            .and_then(|position| self.operators.get(&position))
            .map(|operator| OperatorId::new(operator))
            .unwrap_or_default()
    }

    /// Full identifier of the occurrence at `occurrence` in the flat array.
    pub fn identifier(&self, occurrence: usize) -> Option<ResiduePairIdentifier> {
        let packed = *self.identifiers.get(occurrence)?;
        let position = 2 * occurrence as u64;
        Some(ResiduePairIdentifier::from_packed(
            packed,
            self.operator_at(position),
            self.operator_at(position + 1),
        ))
    }

    fn occurrence_range(&self, structure_position: usize) -> std::ops::Range<usize> {
        let start = self.offsets[structure_position] as usize;
        let end = self
            .offsets
            .get(structure_position + 1)
            .map_or(self.identifiers.len(), |&next| next as usize);
        start..end
    }

    /// Identifiers of every occurrence, grouped by structure index.
    pub fn entries(&self) -> BTreeMap<u32, Vec<ResiduePairIdentifier>> {
        let mut entries = BTreeMap::new();
        let mut cursor = self.cursor();
        while let Some(structure_index) = cursor.move_structure() {
            let mut identifiers = Vec::new();
            while let Some(identifier) = cursor.move_occurrence() {
                identifiers.push(identifier);
            }
            entries.insert(structure_index, identifiers);
        }
        entries
    }

    pub fn cursor(&self) -> BucketCursor<'_> {
        BucketCursor {
            bucket: self,
            next_structure: 0,
            occurrences: 0..0,
        }
    }

    /// Combines two buckets. Structures present in both keep the occurrences of `newer`.
    pub fn merge(&self, newer: &Bucket) -> Bucket {
        if self.is_empty() {
            return newer.clone();
        }
        if newer.is_empty() {
            return self.clone();
        }
        let mut entries = self.entries();
        entries.extend(newer.entries());
        let mut builder = BucketBuilder::new();
        for (structure_index, identifiers) in entries {
            for identifier in identifiers {
                builder.add(structure_index, identifier);
            }
        }
        builder.build()
    }

    /// Copy of this bucket without the given structures.
    pub fn without_structures(&self, removed: &std::collections::BTreeSet<u32>) -> Bucket {
        let mut builder = BucketBuilder::new();
        for (structure_index, identifiers) in self.entries() {
            if removed.contains(&structure_index) {
                continue;
            }
            for identifier in identifiers {
                builder.add(structure_index, identifier);
            }
        }
        builder.build()
    }
}

/// Forward-only reader over a [`Bucket`].
///
/// ```ignore
/// let mut cursor = bucket.cursor();
/// while let Some(structure_index) = cursor.move_structure() {
///     while let Some(identifier) = cursor.move_occurrence() {
///         // ...
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BucketCursor<'a> {
    bucket: &'a Bucket,
    next_structure: usize,
    occurrences: std::ops::Range<usize>,
}

impl BucketCursor<'_> {
    pub fn has_next_structure(&self) -> bool {
        self.next_structure < self.bucket.structure_indices.len()
    }

    /// Advances to the next structure and returns its index. Unread occurrences of the
    /// current structure are skipped.
    pub fn move_structure(&mut self) -> Option<u32> {
        let structure_index = *self.bucket.structure_indices.get(self.next_structure)?;
        self.occurrences = self.bucket.occurrence_range(self.next_structure);
        self.next_structure += 1;
        Some(structure_index)
    }

    pub fn has_next_occurrence(&self) -> bool {
        !self.occurrences.is_empty()
    }

    pub fn move_occurrence(&mut self) -> Option<ResiduePairIdentifier> {
        let occurrence = self.occurrences.next()?;
        self.bucket.identifier(occurrence)
    }
}

/// Accumulates occurrences in any order and produces a canonical [`Bucket`].
#[derive(Debug, Clone, Default)]
pub struct BucketBuilder {
    entries: BTreeMap<u32, Vec<ResiduePairIdentifier>>,
}

impl BucketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, structure_index: u32, identifier: ResiduePairIdentifier) {
        self.entries.entry(structure_index).or_default().push(identifier);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self) -> Bucket {
        let mut bucket = Bucket::default();
        for (structure_index, identifiers) in self.entries {
            bucket.structure_indices.push(structure_index);
            bucket.offsets.push(bucket.identifiers.len() as u32);
            for identifier in identifiers {
                let position = 2 * bucket.identifiers.len() as u32;
                for (endpoint, selector) in [(0, &identifier.first), (1, &identifier.second)] {
                    if !selector.operator.is_identity() {
                        bucket
                            .operators
                            .insert(position + endpoint, selector.operator.as_str().to_string());
                    }
                }
                bucket.identifiers.push(identifier.packed_indices());
            }
        }
        bucket
    }
}

use super::atom::Atom;
use super::residue::ResidueType;
use super::structure::{OperatorId, Residue, Structure};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Human-facing residue address: label chain, operator and label sequence id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelSelector {
    pub chain_id: String,
    pub operator: OperatorId,
    pub seq_id: i32,
}

impl LabelSelector {
    pub fn new(chain_id: &str, seq_id: i32) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            operator: OperatorId::identity(),
            seq_id,
        }
    }

    pub fn with_operator(mut self, operator: OperatorId) -> Self {
        self.operator = operator;
        self
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_identity() {
            write!(f, "{}:{}", self.chain_id, self.seq_id)
        } else {
            write!(f, "{}:{}@{}", self.chain_id, self.seq_id, self.operator)
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid residue selector '{0}' (expected CHAIN:SEQ or CHAIN:SEQ@OPERATOR)")]
pub struct ParseSelectorError(pub String);

impl FromStr for LabelSelector {
    type Err = ParseSelectorError;

    /// Parses `A:57` or `A:57@2_555`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSelectorError(s.to_string());
        let (residue, operator) = match s.trim().split_once('@') {
            Some((residue, operator)) => (residue, OperatorId::new(operator)),
            None => (s.trim(), OperatorId::identity()),
        };
        let (chain_id, seq_id) = residue.split_once(':').ok_or_else(err)?;
        let chain_id = chain_id.trim();
        if chain_id.is_empty() {
            return Err(err());
        }
        let seq_id = seq_id.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self::new(chain_id, seq_id).with_operator(operator))
    }
}

impl TryFrom<String> for LabelSelector {
    type Error = ParseSelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LabelSelector> for String {
    fn from(selector: LabelSelector) -> Self {
        selector.to_string()
    }
}

/// Compact internal residue address: operator and dense residue index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexSelector {
    pub operator: OperatorId,
    pub index: u32,
}

impl IndexSelector {
    pub fn new(index: u32) -> Self {
        Self {
            operator: OperatorId::identity(),
            index,
        }
    }

    pub fn with_operator(mut self, operator: OperatorId) -> Self {
        self.operator = operator;
        self
    }
}

/// External-facing residue address using the depositor's numbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorSelector {
    pub chain_id: String,
    pub operator: OperatorId,
    pub seq_id: i32,
    pub insertion_code: Option<char>,
}

impl AuthorSelector {
    pub fn new(chain_id: &str, seq_id: i32, insertion_code: Option<char>) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            operator: OperatorId::identity(),
            seq_id,
            insertion_code,
        }
    }
}

/// A residue with coordinates already moved by its operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResidue {
    pub selector: LabelSelector,
    pub residue_type: ResidueType,
    pub atoms: Vec<Atom>,
}

impl ResolvedResidue {
    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    pub fn atom_position(&self, name: &str) -> Option<Point3<f64>> {
        self.atom(name).map(|atom| atom.position)
    }
}

/// Bidirectional mapping between selectors and residues of one structure.
///
/// Built once per structure and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ResidueResolver {
    structure: Arc<Structure>,
    label_map: HashMap<(String, i32), u32>,
    author_map: HashMap<(String, i32, Option<char>), u32>,
}

impl ResidueResolver {
    pub fn new(structure: Arc<Structure>) -> Self {
        let mut label_map = HashMap::with_capacity(structure.residue_count());
        let mut author_map = HashMap::with_capacity(structure.residue_count());
        for (index, residue) in structure.residues().iter().enumerate() {
            let index = index as u32;
            label_map
                .entry((residue.chain_id.clone(), residue.seq_id))
                .or_insert(index);
            author_map
                .entry((
                    residue.author_chain_id.clone(),
                    residue.author_seq_id,
                    residue.insertion_code,
                ))
                .or_insert(index);
        }
        Self {
            structure,
            label_map,
            author_map,
        }
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    fn knows_operator(&self, operator: &OperatorId) -> bool {
        self.structure.operator(operator).is_some()
    }

    pub fn index_of_label(&self, selector: &LabelSelector) -> Option<IndexSelector> {
        if !self.knows_operator(&selector.operator) {
            return None;
        }
        self.label_map
            .get(&(selector.chain_id.clone(), selector.seq_id))
            .map(|&index| IndexSelector::new(index).with_operator(selector.operator.clone()))
    }

    pub fn index_of_author(&self, selector: &AuthorSelector) -> Option<IndexSelector> {
        if !self.knows_operator(&selector.operator) {
            return None;
        }
        self.author_map
            .get(&(
                selector.chain_id.clone(),
                selector.seq_id,
                selector.insertion_code,
            ))
            .map(|&index| IndexSelector::new(index).with_operator(selector.operator.clone()))
    }

    pub fn residue(&self, selector: &IndexSelector) -> Option<&Residue> {
        self.structure.residue(selector.index)
    }

    pub fn label_of(&self, selector: &IndexSelector) -> Option<LabelSelector> {
        self.residue(selector).map(|residue| {
            LabelSelector::new(&residue.chain_id, residue.seq_id)
                .with_operator(selector.operator.clone())
        })
    }

    pub fn author_of(&self, selector: &IndexSelector) -> Option<AuthorSelector> {
        self.residue(selector).map(|residue| AuthorSelector {
            chain_id: residue.author_chain_id.clone(),
            operator: selector.operator.clone(),
            seq_id: residue.author_seq_id,
            insertion_code: residue.insertion_code,
        })
    }

    /// Resolves a residue to its typed, operator-transformed atoms.
    ///
    /// Returns `None` for unknown residues and operators and for residues without a
    /// supported residue type.
    pub fn resolve(&self, selector: &IndexSelector) -> Option<ResolvedResidue> {
        let residue = self.residue(selector)?;
        let residue_type = residue.residue_type?;
        let transformation = self.structure.operator(&selector.operator)?;
        let atoms = residue
            .atoms()
            .iter()
            .map(|atom| Atom {
                name: atom.name.clone(),
                role: atom.role,
                position: transformation.transform_point(&atom.position),
            })
            .collect();
        Some(ResolvedResidue {
            selector: LabelSelector::new(&residue.chain_id, residue.seq_id)
                .with_operator(selector.operator.clone()),
            residue_type,
            atoms,
        })
    }

    /// Atom name to transformed position for one residue.
    pub fn manifest_residue(
        &self,
        selector: &IndexSelector,
    ) -> Option<BTreeMap<String, Point3<f64>>> {
        let residue = self.residue(selector)?;
        let transformation = self.structure.operator(&selector.operator)?;
        Some(
            residue
                .atoms()
                .iter()
                .map(|atom| (atom.name.clone(), transformation.transform_point(&atom.position)))
                .collect(),
        )
    }
}

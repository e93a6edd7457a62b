use super::atom::Atom;
use super::residue::ResidueType;
use nalgebra::{Matrix4, Point3};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Id of the identity transformation, i.e. the deposited coordinates.
pub const IDENTITY_OPERATOR: &str = "1";

/// Id of a transformation (symmetry or bioassembly operator) applied to deposited coordinates.
///
/// The identity operator carries no payload, which keeps the common case free of
/// allocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(Option<Arc<str>>);

impl OperatorId {
    pub fn identity() -> Self {
        Self(None)
    }

    pub fn new(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() || id == IDENTITY_OPERATOR {
            Self(None)
        } else {
            Self(Some(Arc::from(id)))
        }
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(IDENTITY_OPERATOR)
    }
}

impl From<&str> for OperatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub chain_id: String,                // Label chain id
    pub seq_id: i32,                     // Label sequence id
    pub author_chain_id: String,         // Author chain id
    pub author_seq_id: i32,              // Author sequence number
    pub insertion_code: Option<char>,    // Author insertion code
    pub name: String,                    // Component name (e.g., "HIS", "DA")
    pub residue_type: Option<ResidueType>, // None for ligands, water and unknown components
    atoms: Vec<Atom>,
}

impl Residue {
    /// Creates a residue whose author numbering equals its label numbering.
    pub fn new(chain_id: &str, seq_id: i32, name: &str) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            seq_id,
            author_chain_id: chain_id.to_string(),
            author_seq_id: seq_id,
            insertion_code: None,
            name: name.to_string(),
            residue_type: ResidueType::from_three_letter(name),
            atoms: Vec::new(),
        }
    }

    pub fn with_author(
        mut self,
        chain_id: &str,
        seq_id: i32,
        insertion_code: Option<char>,
    ) -> Self {
        self.author_chain_id = chain_id.to_string();
        self.author_seq_id = seq_id;
        self.insertion_code = insertion_code;
        self
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.name == name)
    }

    pub fn atom_position(&self, name: &str) -> Option<Point3<f64>> {
        self.atom(name).map(|atom| atom.position)
    }
}

/// One generator of a bioassembly: every listed operator applied to every listed chain.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyGenerator {
    pub operators: Vec<OperatorId>,
    pub chains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub id: String,
    pub generators: Vec<AssemblyGenerator>,
}

impl Assembly {
    pub fn contains(&self, chain_id: &str, operator: &OperatorId) -> bool {
        self.generators.iter().any(|generator| {
            generator.operators.contains(operator)
                && generator.chains.iter().any(|chain| chain == chain_id)
        })
    }
}

/// A macromolecular structure: deposited residues plus the transformations that
/// generate symmetry mates and bioassemblies from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub id: String,
    residues: Vec<Residue>,
    operators: BTreeMap<OperatorId, Matrix4<f64>>,
    assemblies: Vec<Assembly>,
}

impl Structure {
    pub fn new(id: &str, residues: Vec<Residue>) -> Self {
        Self {
            id: id.to_string(),
            residues,
            operators: BTreeMap::new(),
            assemblies: Vec::new(),
        }
    }

    /// Registers a non-identity transformation. Registering the identity id is ignored.
    pub fn add_operator(&mut self, id: OperatorId, transformation: Matrix4<f64>) {
        if !id.is_identity() {
            self.operators.insert(id, transformation);
        }
    }

    pub fn add_assembly(&mut self, assembly: Assembly) {
        self.assemblies.push(assembly);
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, index: u32) -> Option<&Residue> {
        self.residues.get(index as usize)
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn assemblies(&self) -> &[Assembly] {
        &self.assemblies
    }

    pub fn assembly(&self, id: &str) -> Option<&Assembly> {
        self.assemblies.iter().find(|assembly| assembly.id == id)
    }

    /// All operator ids, identity first.
    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        std::iter::once(OperatorId::identity()).chain(self.operators.keys().cloned())
    }

    pub fn operator(&self, id: &OperatorId) -> Option<Matrix4<f64>> {
        if id.is_identity() {
            Some(Matrix4::identity())
        } else {
            self.operators.get(id).copied()
        }
    }

    pub fn transform(&self, id: &OperatorId, point: &Point3<f64>) -> Option<Point3<f64>> {
        if id.is_identity() {
            return Some(*point);
        }
        self.operators
            .get(id)
            .map(|matrix| matrix.transform_point(point))
    }
}

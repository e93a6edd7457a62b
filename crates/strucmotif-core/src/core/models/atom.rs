use crate::core::utils::identifiers::{is_backbone_atom, is_heavy_atom};
use nalgebra::Point3;
use std::str::FromStr;

/// Classification of an atom within its residue.
///
/// Used by the atom pairing schemes to restrict superpositions to backbone or
/// side-chain atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Main-chain atom (N, CA, C, O for amino acids; phosphate and sugar for nucleotides).
    Backbone,
    /// Side-chain or base atom.
    Sidechain,
    /// Hydrogens and anything else that never takes part in a superposition.
    #[default]
    Other,
}

/// A named atom position, in Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "OG", "C4'").
    pub name: String,
    /// The role of the atom within its residue.
    pub role: AtomRole,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom`, classifying its role from the atom name.
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        let name = name.trim();
        let role = if !is_heavy_atom(name) {
            AtomRole::Other
        } else if is_backbone_atom(name) {
            AtomRole::Backbone
        } else {
            AtomRole::Sidechain
        };
        Self {
            name: name.to_string(),
            role,
            position,
        }
    }
}

impl FromStr for AtomRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_classifies_backbone_atoms() {
        let atom = Atom::new("CA", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.role, AtomRole::Backbone);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(Atom::new("C4'", Point3::origin()).role, AtomRole::Backbone);
    }

    #[test]
    fn new_atom_classifies_side_chain_atoms_and_hydrogens() {
        assert_eq!(Atom::new("OG", Point3::origin()).role, AtomRole::Sidechain);
        assert_eq!(Atom::new("N7", Point3::origin()).role, AtomRole::Sidechain);
        assert_eq!(Atom::new("HG", Point3::origin()).role, AtomRole::Other);
    }

    #[test]
    fn new_atom_trims_names() {
        let atom = Atom::new(" CB ", Point3::origin());
        assert_eq!(atom.name, "CB");
        assert_eq!(atom.role, AtomRole::Sidechain);
    }

    #[test]
    fn from_str_parses_valid_roles() {
        assert_eq!(AtomRole::from_str("backbone"), Ok(AtomRole::Backbone));
        assert_eq!(AtomRole::from_str("Side-Chain"), Ok(AtomRole::Sidechain));
        assert_eq!(AtomRole::from_str("unknown"), Ok(AtomRole::Other));
        assert_eq!(AtomRole::from_str("ligand"), Err(()));
    }
}

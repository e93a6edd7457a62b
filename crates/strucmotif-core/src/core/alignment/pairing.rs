use super::error::AlignmentError;
use super::qcp::{self, Superposition};
use crate::core::models::atom::AtomRole;
use crate::core::models::residue::ResidueType;
use crate::core::models::selector::ResolvedResidue;
use crate::core::utils::identifiers::{is_ambiguous_atom, is_backbone_atom, residue_atom_order};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which atoms of two corresponding residues take part in a superposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AtomPairingScheme {
    /// Every heavy atom.
    #[default]
    All,
    /// Main-chain atoms only.
    Backbone,
    /// CA for amino acids, C4' for nucleotides.
    AlphaCarbon,
    /// CB for amino acids, C1' for nucleotides.
    BetaCarbon,
    /// Every heavy atom outside the backbone.
    SideChain,
    /// CA and CB for amino acids, P, C4' and C1' for nucleotides.
    PseudoAtoms,
}

impl AtomPairingScheme {
    pub fn accepts(self, residue_type: ResidueType, atom_name: &str) -> bool {
        match self {
            AtomPairingScheme::All => true,
            AtomPairingScheme::Backbone => is_backbone_atom(atom_name),
            AtomPairingScheme::AlphaCarbon => atom_name == residue_type.backbone_anchor(),
            AtomPairingScheme::BetaCarbon => atom_name == residue_type.side_chain_anchor(),
            AtomPairingScheme::SideChain => !is_backbone_atom(atom_name),
            AtomPairingScheme::PseudoAtoms => {
                if residue_type.is_amino_acid() {
                    matches!(atom_name, "CA" | "CB")
                } else {
                    matches!(atom_name, "P" | "C4'" | "C1'")
                }
            }
        }
    }
}

impl fmt::Display for AtomPairingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomPairingScheme::All => "all",
            AtomPairingScheme::Backbone => "backbone",
            AtomPairingScheme::AlphaCarbon => "alpha-carbon",
            AtomPairingScheme::BetaCarbon => "beta-carbon",
            AtomPairingScheme::SideChain => "side-chain",
            AtomPairingScheme::PseudoAtoms => "pseudo-atoms",
        };
        f.write_str(name)
    }
}

impl FromStr for AtomPairingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "all" => Ok(AtomPairingScheme::All),
            "backbone" => Ok(AtomPairingScheme::Backbone),
            "alpha-carbon" | "ca" => Ok(AtomPairingScheme::AlphaCarbon),
            "beta-carbon" | "cb" => Ok(AtomPairingScheme::BetaCarbon),
            "side-chain" | "sidechain" => Ok(AtomPairingScheme::SideChain),
            "pseudo-atoms" | "pseudo" => Ok(AtomPairingScheme::PseudoAtoms),
            other => Err(format!("unknown atom pairing scheme '{other}'")),
        }
    }
}

fn usable(residue: &ResolvedResidue, scheme: AtomPairingScheme, name: &str) -> bool {
    scheme.accepts(residue.residue_type, name) && !is_ambiguous_atom(residue.residue_type, name)
}

/// Collects corresponding atom positions for two residue lists in positional
/// correspondence.
///
/// Atoms are taken in canonical order from each reference residue and kept only when the
/// scheme accepts them for both residues and the candidate residue carries an atom of the
/// same name. Hydrogens and symmetry-ambiguous atoms never take part.
pub fn pair_atoms(
    reference: &[ResolvedResidue],
    candidate: &[ResolvedResidue],
    scheme: AtomPairingScheme,
) -> Result<(Vec<Point3<f64>>, Vec<Point3<f64>>), AlignmentError> {
    if reference.len() != candidate.len() {
        return Err(AlignmentError::LengthMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }

    let mut reference_points = Vec::new();
    let mut candidate_points = Vec::new();
    for (reference_residue, candidate_residue) in reference.iter().zip(candidate) {
        let mut atoms: Vec<_> = reference_residue
            .atoms
            .iter()
            .filter(|atom| atom.role != AtomRole::Other)
            .filter(|atom| usable(reference_residue, scheme, &atom.name))
            .collect();
        atoms.sort_by(|a, b| residue_atom_order(&a.name, &b.name));

        for atom in atoms {
            if !usable(candidate_residue, scheme, &atom.name) {
                continue;
            }
            if let Some(position) = candidate_residue.atom_position(&atom.name) {
                reference_points.push(atom.position);
                candidate_points.push(position);
            }
        }
    }

    if reference_points.is_empty() {
        return Err(AlignmentError::NoCommonAtoms);
    }
    Ok((reference_points, candidate_points))
}

/// Pairs atoms under `scheme` and superposes the candidate residues onto the reference.
pub fn align_residues(
    reference: &[ResolvedResidue],
    candidate: &[ResolvedResidue],
    scheme: AtomPairingScheme,
) -> Result<Superposition, AlignmentError> {
    let (reference_points, candidate_points) = pair_atoms(reference, candidate, scheme)?;
    qcp::superpose(&reference_points, &candidate_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::selector::LabelSelector;

    fn residue(
        seq_id: i32,
        residue_type: ResidueType,
        atoms: &[(&str, [f64; 3])],
    ) -> ResolvedResidue {
        ResolvedResidue {
            selector: LabelSelector::new("A", seq_id),
            residue_type,
            atoms: atoms
                .iter()
                .map(|(name, [x, y, z])| Atom::new(name, Point3::new(*x, *y, *z)))
                .collect(),
        }
    }

    fn asp(seq_id: i32, shift: f64) -> ResolvedResidue {
        residue(
            seq_id,
            ResidueType::AsparticAcid,
            &[
                ("N", [shift, 1.0, 0.0]),
                ("CA", [shift, 0.0, 0.0]),
                ("C", [shift + 1.5, 0.0, 0.0]),
                ("CB", [shift, -1.0, -1.0]),
                ("CG", [shift, -2.0, -1.5]),
                ("OD1", [shift, -2.5, -2.5]),
                ("OD2", [shift + 0.5, -2.5, -0.5]),
                ("HA", [shift - 0.5, 0.5, 0.5]),
            ],
        )
    }

    #[test]
    fn accepts_dispatches_per_scheme() {
        let his = ResidueType::Histidine;
        let gua = ResidueType::Guanosine;
        assert!(AtomPairingScheme::All.accepts(his, "NE2"));
        assert!(AtomPairingScheme::Backbone.accepts(his, "CA"));
        assert!(!AtomPairingScheme::Backbone.accepts(his, "CB"));
        assert!(AtomPairingScheme::AlphaCarbon.accepts(his, "CA"));
        assert!(AtomPairingScheme::AlphaCarbon.accepts(gua, "C4'"));
        assert!(!AtomPairingScheme::AlphaCarbon.accepts(gua, "CA"));
        assert!(AtomPairingScheme::BetaCarbon.accepts(gua, "C1'"));
        assert!(AtomPairingScheme::SideChain.accepts(his, "ND1"));
        assert!(!AtomPairingScheme::SideChain.accepts(his, "O"));
        assert!(AtomPairingScheme::PseudoAtoms.accepts(his, "CB"));
        assert!(AtomPairingScheme::PseudoAtoms.accepts(gua, "P"));
        assert!(!AtomPairingScheme::PseudoAtoms.accepts(gua, "N9"));
    }

    #[test]
    fn scheme_names_round_trip() {
        for scheme in [
            AtomPairingScheme::All,
            AtomPairingScheme::Backbone,
            AtomPairingScheme::AlphaCarbon,
            AtomPairingScheme::BetaCarbon,
            AtomPairingScheme::SideChain,
            AtomPairingScheme::PseudoAtoms,
        ] {
            assert_eq!(scheme.to_string().parse::<AtomPairingScheme>(), Ok(scheme));
        }
        assert!("everything".parse::<AtomPairingScheme>().is_err());
    }

    #[test]
    fn pair_atoms_skips_hydrogens_and_ambiguous_atoms() {
        let (reference, candidate) =
            pair_atoms(&[asp(1, 0.0)], &[asp(1, 5.0)], AtomPairingScheme::All).unwrap();
        // N, CA, C, CB, CG
        assert_eq!(reference.len(), 5);
        assert_eq!(candidate.len(), 5);
        assert_eq!(reference[0], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(candidate[1], Point3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn pair_atoms_keeps_only_shared_names() {
        let ser = residue(
            2,
            ResidueType::Serine,
            &[
                ("N", [0.0, 1.0, 0.0]),
                ("CA", [0.0, 0.0, 0.0]),
                ("CB", [0.0, -1.0, -1.0]),
                ("OG", [1.0, -2.0, -1.0]),
            ],
        );
        let (reference, candidate) =
            pair_atoms(&[asp(1, 0.0)], &[ser], AtomPairingScheme::All).unwrap();
        assert_eq!(reference.len(), 3);
        assert_eq!(candidate[2], Point3::new(0.0, -1.0, -1.0));
    }

    #[test]
    fn pair_atoms_fails_without_common_atoms() {
        let gly = residue(3, ResidueType::Glycine, &[("CA", [0.0, 0.0, 0.0])]);
        assert_eq!(
            pair_atoms(&[gly.clone()], &[gly], AtomPairingScheme::BetaCarbon),
            Err(AlignmentError::NoCommonAtoms)
        );
    }

    #[test]
    fn align_residues_scores_translated_copies_as_identical() {
        let reference = [asp(1, 0.0), asp(2, 4.0)];
        let candidate = [asp(1, 10.0), asp(2, 14.0)];
        let result = align_residues(&reference, &candidate, AtomPairingScheme::All).unwrap();
        assert!(result.rmsd < 1e-6);
        let moved = result.apply(&Point3::new(10.0, 0.0, 0.0));
        assert!((moved - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-6);
    }
}

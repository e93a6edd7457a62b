use crate::core::models::residue::ResidueType;
use phf::{Map, Set, phf_map, phf_set};
use std::cmp::Ordering;

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    // amino acids
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3",
    "HA2", "HA3", "HXT",
    // nucleotides
    "P", "OP1", "OP2", "OP3", "O5'", "C5'", "C4'", "O4'", "C3'", "O3'", "C2'", "O2'", "C1'",
    "H5'", "H5''", "H4'", "H3'", "H2'", "H2''", "HO2'", "H1'", "HO3'",
};

static ATOM_ORDER_WEIGHTS: Map<&'static str, i32> = phf_map! {
    "N" => 10, "CA" => 30, "C" => 40, "O" => 50, "OXT" => 60,
    "CB" => 110,
    "CG" => 210, "OG1" => 220, "CG1" => 230, "CG2" => 250, "SG" => 270, "OG" => 290,
    "CD" => 310, "ND1" => 330, "CD1" => 350, "CD2" => 370,
    "OD1" => 390, "OD2" => 400, "ND2" => 410, "SD" => 430,
    "CE" => 510, "NE" => 530, "NE1" => 550, "CE1" => 570, "OE1" => 590,
    "OE2" => 600, "NE2" => 610, "CE2" => 630, "CE3" => 650,
    "CZ" => 810, "NZ" => 830, "CZ2" => 850, "CZ3" => 870, "OH" => 880,
    "CH2" => 910, "NH1" => 950, "NH2" => 970,
    "P" => 1000, "OP1" => 1010, "OP2" => 1020, "OP3" => 1030,
    "O5'" => 1100, "C5'" => 1110, "C4'" => 1120, "O4'" => 1130, "C3'" => 1140,
    "O3'" => 1150, "C2'" => 1160, "O2'" => 1170, "C1'" => 1180,
    "N9" => 1200, "C8" => 1210, "N7" => 1220, "C5" => 1230, "C6" => 1240, "O6" => 1250,
    "N6" => 1255, "N1" => 1260, "C2" => 1270, "N2" => 1280, "O2" => 1285, "N3" => 1290,
    "C4" => 1300, "O4" => 1310, "N4" => 1320, "C7" => 1330,
};

/// Terminal atoms whose names are interchangeable by symmetry. Superposing them by name
/// would penalize a correct match whose labels happen to be flipped.
static AMBIGUOUS_ATOM_NAMES: Map<&'static str, &'static [&'static str]> = phf_map! {
    "ASP" => &["OD1", "OD2"],
    "GLU" => &["OE1", "OE2"],
    "ARG" => &["NH1", "NH2"],
    "PHE" => &["CD1", "CD2", "CE1", "CE2"],
    "TYR" => &["CD1", "CD2", "CE1", "CE2"],
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}

pub fn is_ambiguous_atom(residue_type: ResidueType, atom_name: &str) -> bool {
    AMBIGUOUS_ATOM_NAMES
        .get(residue_type.to_three_letter())
        .is_some_and(|names| names.contains(&atom_name.trim()))
}

/// Canonical atom ordering within a residue. Unknown names sort last, by name.
pub fn residue_atom_order(atom1_name: &str, atom2_name: &str) -> Ordering {
    let weight1 = ATOM_ORDER_WEIGHTS
        .get(atom1_name.trim())
        .unwrap_or(&i32::MAX);
    let weight2 = ATOM_ORDER_WEIGHTS
        .get(atom2_name.trim())
        .unwrap_or(&i32::MAX);
    weight1
        .cmp(weight2)
        .then_with(|| atom1_name.trim().cmp(atom2_name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_backbone_atom_recognizes_protein_and_nucleic_backbones() {
        assert!(is_backbone_atom("N"));
        assert!(is_backbone_atom("CA"));
        assert!(is_backbone_atom(" C "));
        assert!(is_backbone_atom("P"));
        assert!(is_backbone_atom("C4'"));
        assert!(!is_backbone_atom("CB"));
        assert!(!is_backbone_atom("N9"));
        assert!(!is_backbone_atom(""));
    }

    #[test]
    fn is_heavy_atom_returns_false_for_hydrogen_and_deuterium() {
        assert!(!is_heavy_atom("H"));
        assert!(!is_heavy_atom("HA"));
        assert!(!is_heavy_atom("D2"));
        assert!(is_heavy_atom("CA"));
        assert!(is_heavy_atom(" SG "));
    }

    #[test]
    fn ambiguous_atoms_are_residue_specific() {
        assert!(is_ambiguous_atom(ResidueType::AsparticAcid, "OD1"));
        assert!(is_ambiguous_atom(ResidueType::AsparticAcid, "OD2"));
        assert!(!is_ambiguous_atom(ResidueType::Asparagine, "OD1"));
        assert!(is_ambiguous_atom(ResidueType::Arginine, "NH2"));
        assert!(!is_ambiguous_atom(ResidueType::Arginine, "NE"));
        assert!(!is_ambiguous_atom(ResidueType::Histidine, "CD2"));
    }

    #[test]
    fn residue_atom_order_returns_ordering_based_on_weights() {
        use std::cmp::Ordering::*;
        assert_eq!(residue_atom_order("N", "CA"), Less);
        assert_eq!(residue_atom_order("O", "C"), Greater);
        assert_eq!(residue_atom_order("CA", "CA"), Equal);
        assert_eq!(residue_atom_order("C4'", "C1'"), Less);
    }

    #[test]
    fn residue_atom_order_sorts_unknown_atoms_last_by_name() {
        use std::cmp::Ordering::*;
        assert_eq!(residue_atom_order("N", "UNKNOWN"), Less);
        assert_eq!(residue_atom_order("UNKNOWN", "N"), Greater);
        assert_eq!(residue_atom_order("XA", "XB"), Less);
        assert_eq!(residue_atom_order(" XA ", "XA"), Equal);
    }
}

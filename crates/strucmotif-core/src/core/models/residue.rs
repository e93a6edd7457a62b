use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of residue types. Ordinals fit into 5 bits of a packed descriptor.
pub const RESIDUE_TYPE_COUNT: usize = 28;

/// The closed set of residue types that can take part in a residue-pair descriptor.
///
/// The declaration order is the canonical ordering used when packing descriptors, so
/// variants must never be reordered once an index has been written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ResidueType {
    // --- Amino Acids ---
    Alanine,
    Arginine,
    Asparagine,
    AsparticAcid,
    Cysteine,
    Glutamine,
    GlutamicAcid,
    Glycine,
    Histidine,
    Isoleucine,
    Leucine,
    Lysine,
    Methionine,
    Phenylalanine,
    Proline,
    Serine,
    Threonine,
    Tryptophan,
    Tyrosine,
    Valine,

    // --- Ribonucleotides ---
    Adenosine,
    Cytidine,
    Guanosine,
    Uridine,

    // --- Deoxyribonucleotides ---
    Deoxyadenosine,
    Deoxycytidine,
    Deoxyguanosine,
    Deoxythymidine,
}

static THREE_LETTER_CODES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "ARG" => ResidueType::Arginine,
    "ASN" => ResidueType::Asparagine,
    "ASP" => ResidueType::AsparticAcid,
    "CYS" => ResidueType::Cysteine,
    "GLN" => ResidueType::Glutamine,
    "GLU" => ResidueType::GlutamicAcid,
    "GLY" => ResidueType::Glycine,
    "HIS" => ResidueType::Histidine,
    "HSD" => ResidueType::Histidine,
    "HSE" => ResidueType::Histidine,
    "HSP" => ResidueType::Histidine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "LYS" => ResidueType::Lysine,
    "MET" => ResidueType::Methionine,
    "MSE" => ResidueType::Methionine,
    "PHE" => ResidueType::Phenylalanine,
    "PRO" => ResidueType::Proline,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "VAL" => ResidueType::Valine,
    "A" => ResidueType::Adenosine,
    "C" => ResidueType::Cytidine,
    "G" => ResidueType::Guanosine,
    "U" => ResidueType::Uridine,
    "DA" => ResidueType::Deoxyadenosine,
    "DC" => ResidueType::Deoxycytidine,
    "DG" => ResidueType::Deoxyguanosine,
    "DT" => ResidueType::Deoxythymidine,
};

const ALL_TYPES: [ResidueType; RESIDUE_TYPE_COUNT] = [
    ResidueType::Alanine,
    ResidueType::Arginine,
    ResidueType::Asparagine,
    ResidueType::AsparticAcid,
    ResidueType::Cysteine,
    ResidueType::Glutamine,
    ResidueType::GlutamicAcid,
    ResidueType::Glycine,
    ResidueType::Histidine,
    ResidueType::Isoleucine,
    ResidueType::Leucine,
    ResidueType::Lysine,
    ResidueType::Methionine,
    ResidueType::Phenylalanine,
    ResidueType::Proline,
    ResidueType::Serine,
    ResidueType::Threonine,
    ResidueType::Tryptophan,
    ResidueType::Tyrosine,
    ResidueType::Valine,
    ResidueType::Adenosine,
    ResidueType::Cytidine,
    ResidueType::Guanosine,
    ResidueType::Uridine,
    ResidueType::Deoxyadenosine,
    ResidueType::Deoxycytidine,
    ResidueType::Deoxyguanosine,
    ResidueType::Deoxythymidine,
];

impl ResidueType {
    pub fn all() -> &'static [ResidueType; RESIDUE_TYPE_COUNT] {
        &ALL_TYPES
    }

    /// Canonical position of this type, `0..RESIDUE_TYPE_COUNT`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        ALL_TYPES.get(ordinal as usize).copied()
    }

    pub fn from_three_letter(code: &str) -> Option<Self> {
        THREE_LETTER_CODES
            .get(code.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn to_three_letter(self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Arginine => "ARG",
            ResidueType::Asparagine => "ASN",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Glycine => "GLY",
            ResidueType::Histidine => "HIS",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Lysine => "LYS",
            ResidueType::Methionine => "MET",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Proline => "PRO",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Valine => "VAL",
            ResidueType::Adenosine => "A",
            ResidueType::Cytidine => "C",
            ResidueType::Guanosine => "G",
            ResidueType::Uridine => "U",
            ResidueType::Deoxyadenosine => "DA",
            ResidueType::Deoxycytidine => "DC",
            ResidueType::Deoxyguanosine => "DG",
            ResidueType::Deoxythymidine => "DT",
        }
    }

    pub fn is_amino_acid(self) -> bool {
        self.ordinal() < ResidueType::Adenosine.ordinal()
    }

    pub fn is_nucleotide(self) -> bool {
        !self.is_amino_acid()
    }

    /// Atom that stands in for the backbone position of this residue.
    pub fn backbone_anchor(self) -> &'static str {
        if self.is_amino_acid() { "CA" } else { "C4'" }
    }

    /// Atom that stands in for the side-chain (or base) position of this residue.
    pub fn side_chain_anchor(self) -> &'static str {
        if self.is_amino_acid() { "CB" } else { "C1'" }
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown residue type '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_three_letter(s).ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_dense_and_round_trip() {
        for (i, ty) in ResidueType::all().iter().enumerate() {
            assert_eq!(ty.ordinal() as usize, i);
            assert_eq!(ResidueType::from_ordinal(i as u8), Some(*ty));
        }
        assert_eq!(ResidueType::from_ordinal(RESIDUE_TYPE_COUNT as u8), None);
    }

    #[test]
    fn ordinals_fit_into_five_bits() {
        assert!(RESIDUE_TYPE_COUNT <= 32);
    }

    #[test]
    fn three_letter_codes_round_trip() {
        for ty in ResidueType::all() {
            assert_eq!(ResidueType::from_three_letter(ty.to_three_letter()), Some(*ty));
        }
    }

    #[test]
    fn parsing_is_case_insensitive_and_accepts_aliases() {
        assert_eq!("his".parse::<ResidueType>(), Ok(ResidueType::Histidine));
        assert_eq!("HSE".parse::<ResidueType>(), Ok(ResidueType::Histidine));
        assert_eq!("MSE".parse::<ResidueType>(), Ok(ResidueType::Methionine));
        assert_eq!(" dt ".parse::<ResidueType>(), Ok(ResidueType::Deoxythymidine));
        assert!("HOH".parse::<ResidueType>().is_err());
    }

    #[test]
    fn anchors_depend_on_polymer_kind() {
        assert_eq!(ResidueType::Serine.backbone_anchor(), "CA");
        assert_eq!(ResidueType::Serine.side_chain_anchor(), "CB");
        assert_eq!(ResidueType::Guanosine.backbone_anchor(), "C4'");
        assert_eq!(ResidueType::Guanosine.side_chain_anchor(), "C1'");
        assert!(ResidueType::Valine.is_amino_acid());
        assert!(ResidueType::Uridine.is_nucleotide());
    }
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("No atoms are shared between the residues under the selected pairing scheme")]
    NoCommonAtoms,

    #[error("Coordinate sets differ in length (reference: {reference}, candidate: {candidate})")]
    LengthMismatch { reference: usize, candidate: usize },
}

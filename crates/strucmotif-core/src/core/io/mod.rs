//! Reading and writing coordinate files.
//!
//! Only what the search engine needs is parsed: residues, heavy-atom coordinates and the
//! bioassembly transformations of a structure.

pub mod pdb;
pub mod traits;

//! # Residue Graph Module
//!
//! Turns a structure into the set of residue-pair occurrences that the index stores and
//! that motif queries are expressed in.
//!
//! - [`policy`] - Which residue copies (deposited, operator-generated, assembly, selection)
//!   take part
//! - [`builder`] - Anchor computation, k-d tree contact search and descriptor encoding

pub mod builder;
pub mod policy;

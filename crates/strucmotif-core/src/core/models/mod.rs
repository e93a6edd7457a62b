//! # Core Models Module
//!
//! Data structures describing macromolecular structures as seen by the search engine.
//!
//! - [`residue`] - The closed set of residue types and their canonical ordering
//! - [`atom`] - Named atom positions
//! - [`structure`] - Structures, residues, operators and bioassemblies
//! - [`selector`] - Label, index and author residue selectors and the per-structure resolver
//!
//! ```ignore
//! use strucmotif::core::models::structure::{Residue, Structure};
//! use strucmotif::core::models::selector::{LabelSelector, ResidueResolver};
//!
//! let structure = Structure::new("1abc", residues);
//! let resolver = ResidueResolver::new(Arc::new(structure));
//! let index = resolver.index_of_label(&LabelSelector::new("A", 57))?;
//! ```

pub mod atom;
pub mod residue;
pub mod selector;
pub mod structure;

#[cfg(test)]
pub(crate) mod fixtures;

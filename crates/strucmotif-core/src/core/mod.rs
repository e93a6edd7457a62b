//! # Core Module
//!
//! The fundamental building blocks of motif search.
//!
//! - **Structure Representation** ([`models`]) - Residue types, atoms, structures
//!   and selectors
//! - **Residue-Pair Descriptors** ([`descriptor`]) - Packed geometric signatures and identifiers
//! - **Residue Graphs** ([`graph`]) - Contact detection and occurrence extraction
//! - **Superposition** ([`alignment`]) - Atom pairing schemes and the QCP algorithm
//! - **File I/O** ([`io`]) - Reading coordinate files
//! - **Utilities** ([`utils`]) - Atom-name tables and geometry helpers

pub mod alignment;
pub mod descriptor;
pub mod graph;
pub mod io;
pub mod models;
pub mod utils;

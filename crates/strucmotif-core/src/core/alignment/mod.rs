//! # Alignment Module
//!
//! Rigid superposition of motif residues.
//!
//! - [`pairing`] - Atom pairing schemes deciding which atoms of two residues are superposed
//! - [`qcp`] - The quaternion characteristic polynomial (QCP) algorithm for optimal RMSD
//!   and the corresponding transformation

pub mod error;
pub mod pairing;
pub mod qcp;

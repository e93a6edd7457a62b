//! # Residue-Pair Descriptor Module
//!
//! Geometric signatures of residue pairs and the identifiers that locate them.
//!
//! A residue pair is summarized by the types of both residues, the distance between their
//! backbone anchors, the distance between their side-chain anchors and the angle between
//! their backbone-to-side-chain orientations. Each geometric quantity is discretized into
//! a small bucket and the five fields are packed into one 32-bit integer, the key of the
//! inverted index.
//!
//! - [`codec`] - Packing, canonicalization and tolerance expansion of descriptors
//! - [`identifier`] - Residue-pair identifiers and their overlap relation
//! - [`occurrence`] - A descriptor together with the identifier it was observed at

pub mod codec;
pub mod identifier;
pub mod occurrence;

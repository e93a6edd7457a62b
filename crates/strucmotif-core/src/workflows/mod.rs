//! # Workflows Module
//!
//! High-level entry points tying the index and the engine together.
//!
//! - [`index`] - Extracts residue graphs from a structure provider and commits them to an
//!   inverted index in batches
//! - [`search`] - Prepares a motif query, collects candidates and streams scored hits to a
//!   sink

pub mod index;
pub mod search;

//! # strucmotif
//!
//! Sequence-independent search for small three-dimensional arrangements of residues
//! (structural motifs, e.g. catalytic triads) in large collections of macromolecular
//! structures.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, selectors), residue-pair
//!   descriptors, residue graph extraction and rigid superposition (QCP).
//!
//! - **[`index`]: Persistence.** The inverted index mapping residue-pair descriptors to
//!   buckets of occurrences, together with its two binary bucket encodings.
//!
//! - **[`engine`]: The Logic Core.** Query preparation (pruning, overlap profile), the
//!   generation-by-generation target assembler and hit scoring.
//!
//! - **[`workflows`]: The Public API.** Index construction and motif search entry points.

pub mod core;
pub mod engine;
pub mod index;
pub mod workflows;

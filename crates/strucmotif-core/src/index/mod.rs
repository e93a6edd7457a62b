//! Persistent inverted index from residue-pair descriptors to their occurrences.
//!
//! - [`bucket`] - In-memory bucket representation, builder and forward cursor
//! - [`codec`] - Compact and MessagePack bucket encodings
//! - [`manifest`] - Index settings and structure registry (`index.toml`)
//! - [`store`] - On-disk store with batched atomic commits

pub mod bucket;
pub mod codec;
pub mod error;
pub mod manifest;
pub mod store;

//! # Engine Module
//!
//! Query preparation, path assembly and hit scoring on top of an inverted index.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Search parameters and their builder
//! - **Error Handling** ([`error`]) - Query-definition and engine errors
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Structure Access** ([`provider`]) - Structure providers for indexing and scoring
//! - **Query Preparation** ([`context`], [`pruner`], [`profile`]) - Motif validation,
//!   pruning to a connected path, descriptor expansion and the overlap profile
//! - **Assembly** ([`assembler`], [`target`]) - Candidate collection and generation-wise
//!   path assembly per candidate structure
//! - **Scoring** ([`scorer`], [`hit`]) - Superposition of raw matches, hit sinks and
//!   cooperative cancellation

pub mod assembler;
pub mod config;
pub mod context;
pub mod error;
pub mod hit;
pub mod profile;
pub mod progress;
pub mod provider;
pub mod pruner;
pub mod scorer;
pub mod target;

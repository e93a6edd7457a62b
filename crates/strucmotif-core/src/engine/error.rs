use thiserror::Error;

use super::config::ConfigError;
use super::provider::ProviderError;
use crate::core::alignment::error::AlignmentError;
use crate::core::models::selector::LabelSelector;
use crate::index::error::IndexError;

/// Problems with the motif definition itself. All of them are detected before the index
/// is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Motif residues form no contacting pair within the index cutoff")]
    Empty,

    #[error("Motif residues do not form a connected contact graph")]
    Disconnected,

    #[error("Motif has {count} residues, at most {max} are supported")]
    TooManyResidues { count: usize, max: usize },

    #[error("Motif has {count} residues, at least {min} are required")]
    TooFewResidues { count: usize, min: usize },

    #[error("Residue {0} not found in query structure")]
    ResidueNotFound(LabelSelector),

    #[error("Residue {0} has no supported residue type or lacks coordinates")]
    UnsupportedResidue(LabelSelector),

    #[error("Residue {0} is listed more than once")]
    DuplicateResidue(LabelSelector),

    #[error("Exchange defined for {0}, which is not part of the motif")]
    ExchangeOutsideMotif(LabelSelector),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid query: {source}")]
    Query {
        #[from]
        source: QueryError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Index access failed: {source}")]
    Index {
        #[from]
        source: IndexError,
    },

    #[error("Structure unavailable: {source}")]
    Provider {
        #[from]
        source: ProviderError,
    },

    #[error("Superposition failed: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

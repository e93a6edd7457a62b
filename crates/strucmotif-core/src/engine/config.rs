use super::pruner::PruningStrategy;
use crate::core::alignment::pairing::AtomPairingScheme;
use crate::core::descriptor::codec::Tolerance;
use crate::core::models::residue::ResidueType;
use crate::core::models::selector::LabelSelector;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const DEFAULT_MAX_MOTIF_SIZE: usize = 10;
pub const MIN_MOTIF_SIZE: usize = 2;
pub const DEFAULT_MAX_TOLERANCE: u8 = 3;
pub const DEFAULT_TOLERANCE: u8 = 1;
pub const DEFAULT_RMSD_CUTOFF: f64 = 2.0;
pub const DEFAULT_CHUNK_SIZE: usize = 64;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Residue types accepted at a motif position in addition to the query residue's own type.
pub type ExchangeMap = BTreeMap<LabelSelector, Vec<ResidueType>>;

/// Which candidate structures a search may report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructureFilter {
    /// When set, only these structure ids are searched.
    pub allowed: Option<BTreeSet<String>>,
    pub denied: BTreeSet<String>,
}

impl StructureFilter {
    pub fn accepts(&self, id: &str) -> bool {
        !self.denied.contains(id)
            && self
                .allowed
                .as_ref()
                .is_none_or(|allowed| allowed.contains(id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Motif residues in the query structure, in the order hits report them.
    pub residues: Vec<LabelSelector>,
    pub exchanges: ExchangeMap,
    pub tolerance: Tolerance,
    pub scheme: AtomPairingScheme,
    pub rmsd_cutoff: f64,
    pub max_results: Option<usize>,
    pub pruning: PruningStrategy,
    pub filter: StructureFilter,
    pub max_motif_size: usize,
    /// Candidate structures assembled and scored per parallel round.
    pub chunk_size: usize,
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    residues: Option<Vec<LabelSelector>>,
    exchanges: ExchangeMap,
    tolerance: Option<Tolerance>,
    max_tolerance: Option<u8>,
    scheme: Option<AtomPairingScheme>,
    rmsd_cutoff: Option<f64>,
    max_results: Option<usize>,
    pruning: Option<PruningStrategy>,
    filter: StructureFilter,
    max_motif_size: Option<usize>,
    chunk_size: Option<usize>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn residues(mut self, residues: Vec<LabelSelector>) -> Self {
        self.residues = Some(residues);
        self
    }
    pub fn exchange(mut self, residue: LabelSelector, types: Vec<ResidueType>) -> Self {
        self.exchanges.entry(residue).or_default().extend(types);
        self
    }
    pub fn exchanges(mut self, exchanges: ExchangeMap) -> Self {
        self.exchanges = exchanges;
        self
    }
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn max_tolerance(mut self, max_tolerance: u8) -> Self {
        self.max_tolerance = Some(max_tolerance);
        self
    }
    pub fn scheme(mut self, scheme: AtomPairingScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }
    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = Some(cutoff);
        self
    }
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
    pub fn pruning(mut self, strategy: PruningStrategy) -> Self {
        self.pruning = Some(strategy);
        self
    }
    pub fn allowed_structures<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.filter.allowed = Some(ids.into_iter().collect());
        self
    }
    pub fn denied_structures<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.filter.denied.extend(ids);
        self
    }
    pub fn max_motif_size(mut self, size: usize) -> Self {
        self.max_motif_size = Some(size);
        self
    }
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let residues = self
            .residues
            .ok_or(ConfigError::MissingParameter("residues"))?;
        let tolerance = self
            .tolerance
            .unwrap_or(Tolerance::uniform(DEFAULT_TOLERANCE));
        let max_tolerance = self.max_tolerance.unwrap_or(DEFAULT_MAX_TOLERANCE);
        if tolerance.largest() > max_tolerance {
            return Err(ConfigError::InvalidValue {
                parameter: "tolerance",
                reason: format!(
                    "{} exceeds the upper bound of {max_tolerance}",
                    tolerance.largest()
                ),
            });
        }
        let rmsd_cutoff = self.rmsd_cutoff.unwrap_or(DEFAULT_RMSD_CUTOFF);
        if !rmsd_cutoff.is_finite() || rmsd_cutoff < 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "rmsd_cutoff",
                reason: format!("{rmsd_cutoff} is not a non-negative distance"),
            });
        }
        if self.max_results == Some(0) {
            return Err(ConfigError::InvalidValue {
                parameter: "max_results",
                reason: "must be at least 1".to_string(),
            });
        }
        let chunk_size = self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "chunk_size",
                reason: "must be at least 1".to_string(),
            });
        }
        let max_motif_size = self.max_motif_size.unwrap_or(DEFAULT_MAX_MOTIF_SIZE);
        if max_motif_size < MIN_MOTIF_SIZE {
            return Err(ConfigError::InvalidValue {
                parameter: "max_motif_size",
                reason: format!("must be at least {MIN_MOTIF_SIZE}"),
            });
        }

        Ok(SearchConfig {
            residues,
            exchanges: self.exchanges,
            tolerance,
            scheme: self.scheme.unwrap_or_default(),
            rmsd_cutoff,
            max_results: self.max_results,
            pruning: self.pruning.unwrap_or_default(),
            filter: self.filter,
            max_motif_size,
            chunk_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triad() -> Vec<LabelSelector> {
        vec![
            LabelSelector::new("A", 3),
            LabelSelector::new("A", 6),
            LabelSelector::new("A", 10),
        ]
    }

    #[test]
    fn defaults_apply_when_only_residues_are_given() {
        let config = SearchConfigBuilder::new().residues(triad()).build().unwrap();
        assert_eq!(config.tolerance, Tolerance::uniform(DEFAULT_TOLERANCE));
        assert_eq!(config.scheme, AtomPairingScheme::All);
        assert_eq!(config.pruning, PruningStrategy::MinimumSpanning);
        assert_eq!(config.max_results, None);
        assert_eq!(config.max_motif_size, DEFAULT_MAX_MOTIF_SIZE);
    }

    #[test]
    fn residues_are_required() {
        assert_eq!(
            SearchConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("residues"))
        );
    }

    #[test]
    fn tolerance_is_bounded() {
        let result = SearchConfigBuilder::new()
            .residues(triad())
            .tolerance(Tolerance::uniform(4))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { parameter: "tolerance", .. })
        ));
        let raised = SearchConfigBuilder::new()
            .residues(triad())
            .tolerance(Tolerance::uniform(4))
            .max_tolerance(4)
            .build();
        assert!(raised.is_ok());
    }

    #[test]
    fn rejects_nonsensical_limits() {
        for builder in [
            SearchConfigBuilder::new().rmsd_cutoff(-1.0),
            SearchConfigBuilder::new().rmsd_cutoff(f64::NAN),
            SearchConfigBuilder::new().max_results(0),
            SearchConfigBuilder::new().chunk_size(0),
            SearchConfigBuilder::new().max_motif_size(1),
        ] {
            assert!(builder.residues(triad()).build().is_err());
        }
    }

    #[test]
    fn exchanges_accumulate_per_residue() {
        let config = SearchConfigBuilder::new()
            .residues(triad())
            .exchange(LabelSelector::new("A", 3), vec![ResidueType::Tyrosine])
            .exchange(LabelSelector::new("A", 3), vec![ResidueType::Lysine])
            .build()
            .unwrap();
        assert_eq!(
            config.exchanges[&LabelSelector::new("A", 3)],
            vec![ResidueType::Tyrosine, ResidueType::Lysine]
        );
    }

    #[test]
    fn structure_filter_combines_allow_and_deny_lists() {
        let mut filter = StructureFilter::default();
        assert!(filter.accepts("1abc"));
        filter.denied.insert("1abc".to_string());
        assert!(!filter.accepts("1abc"));
        filter.allowed = Some(BTreeSet::from(["2xyz".to_string(), "1abc".to_string()]));
        assert!(filter.accepts("2xyz"));
        assert!(!filter.accepts("1abc"));
        assert!(!filter.accepts("3def"));
    }
}

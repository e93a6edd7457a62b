use super::config::SearchConfig;
use super::error::QueryError;
use super::profile::OverlapProfile;
use crate::core::alignment::pairing::AtomPairingScheme;
use crate::core::descriptor::codec::{ResiduePairDescriptor, allowed_types, expand};
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::core::graph::builder::ResidueGraphBuilder;
use crate::core::graph::policy::InclusionPolicy;
use crate::core::models::residue::ResidueType;
use crate::core::models::selector::{IndexSelector, ResidueResolver, ResolvedResidue};
use crate::core::models::structure::Structure;
use crate::index::manifest::IndexSettings;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// How a candidate identifier read from a bucket maps onto a query step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reversed,
    Both,
}

/// One residue pair of the pruned query path.
#[derive(Debug, Clone)]
pub struct QueryStep {
    pub identifier: ResiduePairIdentifier,
    pub descriptor: ResiduePairDescriptor,
    /// Descriptors a candidate for this step may carry, after tolerance and exchanges.
    pub descriptors: BTreeSet<ResiduePairDescriptor>,
    /// Residue types accepted at the first and second endpoint of `identifier`.
    pub allowed: [BTreeSet<ResidueType>; 2],
}

impl QueryStep {
    /// Orientations in which an occurrence stored under `descriptor` can stand in for this
    /// step. Stored identifiers carry `descriptor.type1()` at their first endpoint.
    pub fn orientation(&self, descriptor: ResiduePairDescriptor) -> Option<Orientation> {
        let (type1, type2) = (descriptor.type1(), descriptor.type2());
        let forward = self.allowed[0].contains(&type1) && self.allowed[1].contains(&type2);
        let reversed = self.allowed[0].contains(&type2) && self.allowed[1].contains(&type1);
        match (forward, reversed) {
            (true, true) => Some(Orientation::Both),
            (true, false) => Some(Orientation::Forward),
            (false, true) => Some(Orientation::Reversed),
            (false, false) => None,
        }
    }
}

/// Everything a search needs to know about its motif, derived once per query.
#[derive(Debug, Clone)]
pub struct QueryContext {
    structure: Arc<Structure>,
    motif: Vec<IndexSelector>,
    residues: Vec<ResolvedResidue>,
    steps: Vec<QueryStep>,
    profile: OverlapProfile,
    scheme: AtomPairingScheme,
    rmsd_cutoff: f64,
}

impl QueryContext {
    /// Validates the motif, extracts its residue pairs with the index's cutoff, prunes them
    /// into a path and expands every step's descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for motifs that are too small, too large, reference
    /// missing or unsupported residues, or do not form a connected contact graph.
    pub fn prepare(
        structure: Arc<Structure>,
        config: &SearchConfig,
        settings: &IndexSettings,
    ) -> Result<Self, QueryError> {
        let count = config.residues.len();
        if count < super::config::MIN_MOTIF_SIZE {
            return Err(QueryError::TooFewResidues {
                count,
                min: super::config::MIN_MOTIF_SIZE,
            });
        }
        if count > config.max_motif_size {
            return Err(QueryError::TooManyResidues {
                count,
                max: config.max_motif_size,
            });
        }

        let resolver = ResidueResolver::new(structure.clone());
        let mut motif = Vec::with_capacity(count);
        let mut residues = Vec::with_capacity(count);
        let mut seen = BTreeSet::new();
        for label in &config.residues {
            if !seen.insert(label) {
                return Err(QueryError::DuplicateResidue(label.clone()));
            }
            let selector = resolver
                .index_of_label(label)
                .ok_or_else(|| QueryError::ResidueNotFound(label.clone()))?;
            let residue = resolver
                .resolve(&selector)
                .ok_or_else(|| QueryError::UnsupportedResidue(label.clone()))?;
            motif.push(selector);
            residues.push(residue);
        }

        let mut exchanges: BTreeMap<IndexSelector, Vec<ResidueType>> = BTreeMap::new();
        for (label, types) in &config.exchanges {
            let position = config
                .residues
                .iter()
                .position(|residue| residue == label)
                .ok_or_else(|| QueryError::ExchangeOutsideMotif(label.clone()))?;
            exchanges.insert(motif[position].clone(), types.clone());
        }

        let graph = ResidueGraphBuilder::new(
            settings.cutoff,
            InclusionPolicy::Selection(config.residues.clone()),
        )
        .build(&structure);
        let path = config.pruning.apply(graph.into_edges(), &motif)?;

        let steps: Vec<QueryStep> = path
            .into_iter()
            .map(|edge| {
                let occurrence = edge.occurrence;
                let identifier = occurrence.identifier;
                let descriptor = occurrence.descriptor;
                let first = exchanges.get(&identifier.first).map(Vec::as_slice);
                let second = exchanges.get(&identifier.second).map(Vec::as_slice);
                let descriptors = expand(descriptor, config.tolerance, [first, second]);
                let allowed = [
                    allowed_types(descriptor.type1(), first),
                    allowed_types(descriptor.type2(), second),
                ];
                QueryStep {
                    identifier,
                    descriptor,
                    descriptors,
                    allowed,
                }
            })
            .collect();
        let identifiers: Vec<ResiduePairIdentifier> =
            steps.iter().map(|step| step.identifier.clone()).collect();
        let profile = OverlapProfile::new(&identifiers);

        debug!(
            structure = %structure.id,
            residues = count,
            steps = steps.len(),
            descriptors = steps.iter().map(|step| step.descriptors.len()).sum::<usize>(),
            "Prepared query"
        );

        Ok(Self {
            structure,
            motif,
            residues,
            steps,
            profile,
            scheme: config.scheme,
            rmsd_cutoff: config.rmsd_cutoff,
        })
    }

    pub fn structure(&self) -> &Arc<Structure> {
        &self.structure
    }

    /// Motif residues of the query structure, in reporting order.
    pub fn motif(&self) -> &[IndexSelector] {
        &self.motif
    }

    /// Resolved query residues, parallel to [`QueryContext::motif`].
    pub fn residues(&self) -> &[ResolvedResidue] {
        &self.residues
    }

    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    pub fn profile(&self) -> &OverlapProfile {
        &self.profile
    }

    pub fn scheme(&self) -> AtomPairingScheme {
        self.scheme
    }

    pub fn rmsd_cutoff(&self) -> f64 {
        self.rmsd_cutoff
    }
}

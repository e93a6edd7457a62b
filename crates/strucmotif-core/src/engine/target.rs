use super::hit::StopCondition;
use super::profile::OverlapProfile;
use super::provider::{ProviderError, StructureProvider};
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::core::models::selector::ResidueResolver;

/// Coordinates of a candidate structure, loaded on first use.
#[derive(Debug, Clone, Default)]
pub enum Resolution {
    #[default]
    Pending,
    Resolved(ResidueResolver),
}

/// A candidate structure with the occurrences that may fill each query step.
#[derive(Debug, Clone)]
pub struct TargetStructure {
    structure_index: u32,
    id: String,
    /// Per query step, candidate identifiers already oriented to the step.
    candidates: Vec<Vec<ResiduePairIdentifier>>,
    resolution: Resolution,
}

impl TargetStructure {
    pub fn new(
        structure_index: u32,
        id: String,
        candidates: Vec<Vec<ResiduePairIdentifier>>,
    ) -> Self {
        Self {
            structure_index,
            id,
            candidates,
            resolution: Resolution::Pending,
        }
    }

    pub fn structure_index(&self) -> u32 {
        self.structure_index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn candidates(&self) -> &[Vec<ResiduePairIdentifier>] {
        &self.candidates
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Grows paths one query step per generation.
    ///
    /// Generation 0 seeds one path per candidate of step 0. Generation `k` extends every
    /// surviving path with every candidate of step `k` whose overlap with each earlier
    /// path element equals the query's. The result holds every complete path, each in
    /// positional correspondence with the query path. Empty when any generation dies out,
    /// the target lacks candidates for a step, or `stop` is raised.
    pub fn assemble(
        &self,
        profile: &OverlapProfile,
        stop: &StopCondition,
    ) -> Vec<Vec<ResiduePairIdentifier>> {
        if self.candidates.len() != profile.steps() || self.candidates.is_empty() {
            return Vec::new();
        }
        let mut paths: Vec<Vec<ResiduePairIdentifier>> = self.candidates[0]
            .iter()
            .map(|candidate| vec![candidate.clone()])
            .collect();
        for step_candidates in &self.candidates[1..] {
            if paths.is_empty() || stop.is_stopped() {
                return Vec::new();
            }
            let mut extended = Vec::new();
            for path in &paths {
                for candidate in step_candidates {
                    if profile.admits(path, candidate) {
                        let mut next = Vec::with_capacity(path.len() + 1);
                        next.extend_from_slice(path);
                        next.push(candidate.clone());
                        extended.push(next);
                    }
                }
            }
            paths = extended;
        }
        paths
    }

    /// Loads the structure through `provider` if not done yet.
    pub fn resolve(
        &mut self,
        provider: &dyn StructureProvider,
    ) -> Result<&ResidueResolver, ProviderError> {
        if let Resolution::Pending = self.resolution {
            let structure = provider.structure(&self.id)?;
            self.resolution = Resolution::Resolved(ResidueResolver::new(structure));
        }
        match &self.resolution {
            Resolution::Resolved(resolver) => Ok(resolver),
            Resolution::Pending => Err(ProviderError::NotFound(self.id.clone())),
        }
    }
}

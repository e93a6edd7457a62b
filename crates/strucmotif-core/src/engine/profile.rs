use crate::core::descriptor::identifier::{Overlap, ResiduePairIdentifier};
use itertools::Itertools;

/// Overlap between every pair of steps of a query path.
///
/// Stored as a strictly lower triangular matrix: the entry for `(earlier, later)` with
/// `earlier < later` is `path[earlier].overlap(&path[later])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapProfile {
    steps: usize,
    values: Vec<Overlap>,
}

fn offset(earlier: usize, later: usize) -> usize {
    later * (later - 1) / 2 + earlier
}

impl OverlapProfile {
    pub fn new(path: &[ResiduePairIdentifier]) -> Self {
        let mut values = vec![Overlap::Disjoint; path.len() * path.len().saturating_sub(1) / 2];
        for (earlier, later) in (0..path.len()).tuple_combinations() {
            values[offset(earlier, later)] = path[earlier].overlap(&path[later]);
        }
        Self {
            steps: path.len(),
            values,
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Overlap of step `later` relative to step `earlier`. `None` unless `earlier < later`
    /// and both are steps of the path.
    pub fn get(&self, earlier: usize, later: usize) -> Option<Overlap> {
        if earlier >= later || later >= self.steps {
            return None;
        }
        self.values.get(offset(earlier, later)).copied()
    }

    /// Whether `candidate`, proposed as step `later`, relates to the candidate path prefix
    /// exactly as the query does.
    pub fn admits(
        &self,
        prefix: &[ResiduePairIdentifier],
        candidate: &ResiduePairIdentifier,
    ) -> bool {
        let later = prefix.len();
        prefix
            .iter()
            .enumerate()
            .all(|(earlier, step)| self.get(earlier, later) == Some(step.overlap(candidate)))
    }
}

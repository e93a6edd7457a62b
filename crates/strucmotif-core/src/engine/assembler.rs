use super::config::StructureFilter;
use super::context::{Orientation, QueryContext};
use super::hit::StopCondition;
use super::target::TargetStructure;
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::index::error::IndexError;
use crate::index::store::InvertedIndex;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads the buckets of every query step and groups their occurrences per structure.
///
/// Step 0 admits every live structure accepted by `filter`; each later step only keeps
/// structures that had candidates at every earlier step. Identifiers are oriented so their
/// first endpoint corresponds to the first endpoint of the query step. The result is in
/// ascending structure index order. Returns an empty list if `stop` is raised.
pub fn collect_targets(
    index: &InvertedIndex,
    context: &QueryContext,
    filter: &StructureFilter,
    stop: &StopCondition,
) -> Result<Vec<TargetStructure>, IndexError> {
    let mut alive: Option<BTreeMap<u32, Vec<Vec<ResiduePairIdentifier>>>> = None;

    for (k, step) in context.steps().iter().enumerate() {
        if stop.is_stopped() {
            return Ok(Vec::new());
        }
        let mut found: BTreeMap<u32, Vec<ResiduePairIdentifier>> = BTreeMap::new();
        for &descriptor in &step.descriptors {
            let Some(orientation) = step.orientation(descriptor) else {
                continue;
            };
            let bucket = index.select(descriptor)?;
            let mut cursor = bucket.cursor();
            while let Some(structure_index) = cursor.move_structure() {
                let admitted = match &alive {
                    Some(alive) => alive.contains_key(&structure_index),
                    None => index
                        .structure_id(structure_index)
                        .is_some_and(|id| filter.accepts(id)),
                };
                if !admitted {
                    continue;
                }
                let candidates = found.entry(structure_index).or_default();
                while let Some(identifier) = cursor.move_occurrence() {
                    match orientation {
                        Orientation::Forward => candidates.push(identifier),
                        Orientation::Reversed => candidates.push(identifier.reversed()),
                        Orientation::Both => {
                            candidates.push(identifier.reversed());
                            candidates.push(identifier);
                        }
                    }
                }
            }
        }

        let next = match alive.take() {
            None => found
                .into_iter()
                .map(|(structure_index, candidates)| (structure_index, vec![candidates]))
                .collect(),
            Some(mut previous) => {
                previous.retain(|structure_index, _| found.contains_key(structure_index));
                for (structure_index, candidates) in found {
                    if let Some(steps) = previous.get_mut(&structure_index) {
                        steps.push(candidates);
                    }
                }
                previous
            }
        };
        debug!(step = k, structures = next.len(), "Collected step candidates");
        let exhausted = next.is_empty();
        alive = Some(next);
        if exhausted {
            break;
        }
    }

    let steps = context.steps().len();
    Ok(alive
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, candidates)| candidates.len() == steps)
        .filter_map(|(structure_index, mut candidates)| {
            for step_candidates in &mut candidates {
                step_candidates.sort();
                step_candidates.dedup();
            }
            let id = index.structure_id(structure_index)?.to_string();
            Some(TargetStructure::new(structure_index, id, candidates))
        })
        .collect())
}

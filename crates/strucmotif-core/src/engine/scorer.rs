use super::context::QueryContext;
use super::hit::{Hit, StopCondition};
use super::provider::StructureProvider;
use super::target::TargetStructure;
use crate::core::alignment::pairing::align_residues;
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::core::models::selector::{IndexSelector, ResolvedResidue};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Maps every query residue to the candidate residue a complete path assigns to it, in
/// motif order.
fn residue_mapping(
    context: &QueryContext,
    path: &[ResiduePairIdentifier],
) -> Option<Vec<IndexSelector>> {
    let mut mapping: BTreeMap<&IndexSelector, &IndexSelector> = BTreeMap::new();
    for (step, candidate) in context.steps().iter().zip(path) {
        mapping.insert(&step.identifier.first, &candidate.first);
        mapping.insert(&step.identifier.second, &candidate.second);
    }
    context
        .motif()
        .iter()
        .map(|residue| mapping.get(residue).map(|&selector| selector.clone()))
        .collect()
}

/// Assembles, resolves and superposes all matches in one target structure.
///
/// A structure that cannot be loaded yields no hits. Identical residue mappings reached
/// through different paths are scored once. Hits are ordered by RMSD.
pub fn score_target(
    context: &QueryContext,
    target: &mut TargetStructure,
    provider: &dyn StructureProvider,
    stop: &StopCondition,
) -> Vec<Hit> {
    let paths = target.assemble(context.profile(), stop);
    if paths.is_empty() {
        return Vec::new();
    }
    let mappings: BTreeSet<Vec<IndexSelector>> = paths
        .iter()
        .filter_map(|path| residue_mapping(context, path))
        .collect();

    let structure_id = target.id().to_string();
    let resolver = match target.resolve(provider) {
        Ok(resolver) => resolver,
        Err(error) => {
            warn!(
                structure = %structure_id,
                %error,
                "Indexed structure could not be loaded, skipping"
            );
            return Vec::new();
        }
    };

    let mut hits = Vec::new();
    for mapping in mappings {
        let resolved: Option<Vec<ResolvedResidue>> =
            mapping.iter().map(|selector| resolver.resolve(selector)).collect();
        let Some(resolved) = resolved else {
            warn!(
                structure = %structure_id,
                "Indexed residues missing from structure, index may be stale"
            );
            continue;
        };
        let superposition = match align_residues(context.residues(), &resolved, context.scheme()) {
            Ok(superposition) => superposition,
            Err(error) => {
                debug!(structure = %structure_id, %error, "Match cannot be superposed");
                continue;
            }
        };
        if superposition.rmsd > context.rmsd_cutoff() {
            continue;
        }
        hits.push(Hit {
            structure_id: structure_id.clone(),
            residue_types: resolved.iter().map(|residue| residue.residue_type).collect(),
            residues: resolved.into_iter().map(|residue| residue.selector).collect(),
            rmsd: superposition.rmsd,
            transformation: superposition.transformation,
        });
    }
    hits.sort_by(|a, b| a.rmsd.total_cmp(&b.rmsd).then_with(|| a.residues.cmp(&b.residues)));
    debug!(structure = %structure_id, paths = paths.len(), hits = hits.len(), "Scored target");
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::{TRIAD_SEQ_IDS, motion, moved, triad_structure};
    use crate::core::models::selector::LabelSelector;
    use crate::engine::config::SearchConfigBuilder;
    use crate::engine::provider::InMemoryProvider;
    use crate::index::manifest::IndexSettings;
    use std::sync::Arc;

    fn context() -> QueryContext {
        let config = SearchConfigBuilder::new()
            .residues(TRIAD_SEQ_IDS.iter().map(|&seq| LabelSelector::new("A", seq)).collect())
            .build()
            .unwrap();
        let query = Arc::new(triad_structure("query"));
        QueryContext::prepare(query, &config, &IndexSettings::default()).unwrap()
    }

    /// A target whose only candidates are the query path itself.
    fn self_target(context: &QueryContext, id: &str) -> TargetStructure {
        let candidates = context
            .steps()
            .iter()
            .map(|step| vec![step.identifier.clone()])
            .collect();
        TargetStructure::new(0, id.to_string(), candidates)
    }

    #[test]
    fn moved_copy_of_the_query_scores_near_zero() {
        let context = context();
        let provider: InMemoryProvider = [moved(&triad_structure("q"), "copy", &motion(2))]
            .into_iter()
            .collect();
        let mut target = self_target(&context, "copy");
        let hits = score_target(&context, &mut target, &provider, &StopCondition::new());
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert!(hit.rmsd < 0.01);
        assert_eq!(
            hit.residues,
            TRIAD_SEQ_IDS.iter().map(|&seq| LabelSelector::new("A", seq)).collect::<Vec<_>>()
        );
        // The reported transformation undoes the motion.
        let query_ca = context.residues()[0].atom_position("CA").unwrap();
        let moved_ca = motion(2) * query_ca;
        let restored = hit.transformation.transform_point(&moved_ca);
        assert!((restored - query_ca).norm() < 1e-6);
    }

    #[test]
    fn stale_structure_yields_no_hits() {
        let context = context();
        let provider = InMemoryProvider::new();
        let mut target = self_target(&context, "gone");
        assert!(score_target(&context, &mut target, &provider, &StopCondition::new()).is_empty());
    }

    #[test]
    fn mapping_follows_motif_order() {
        let context = context();
        let path: Vec<ResiduePairIdentifier> =
            context.steps().iter().map(|step| step.identifier.clone()).collect();
        assert_eq!(residue_mapping(&context, &path).unwrap(), context.motif().to_vec());
    }
}

use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::models::structure::Structure;
use crate::engine::assembler::collect_targets;
use crate::engine::config::SearchConfig;
use crate::engine::context::QueryContext;
use crate::engine::error::EngineError;
use crate::engine::hit::{Hit, HitSink, StopCondition};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::provider::StructureProvider;
use crate::engine::scorer::score_target;
use crate::engine::target::TargetStructure;
use crate::index::store::InvertedIndex;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Structures that had candidates for every query step.
    pub candidates: usize,
    pub hits: usize,
    /// The result limit was reached.
    pub truncated: bool,
    /// The search ended early through the stop condition or the sink.
    pub stopped: bool,
    /// Index segments that failed to load and await reinitialization.
    pub degraded_segments: Vec<ResiduePairDescriptor>,
}

/// Searches `index` for occurrences of the motif `config.residues` of `query`.
///
/// The query is validated before the index is touched. Candidate structures are assembled
/// and scored in parallel chunks of `config.chunk_size`, and hits are handed to `sink` in
/// ascending structure index order, so a result limit always yields the same hits.
/// Raising `stop` or a sink returning [`ControlFlow::Break`] ends the search after the
/// current structure.
#[instrument(skip_all, name = "search_workflow")]
pub fn run<S: HitSink>(
    index: &InvertedIndex,
    provider: &dyn StructureProvider,
    query: Arc<Structure>,
    config: &SearchConfig,
    sink: &mut S,
    stop: &StopCondition,
    reporter: &ProgressReporter,
) -> Result<SearchSummary, EngineError> {
    // ===== PHASE 1: Query preparation =====
    reporter.report(Progress::PhaseStart { name: "Query Preparation" });
    let context = QueryContext::prepare(query, config, index.settings())?;
    info!(
        structure = %context.structure().id,
        residues = context.motif().len(),
        steps = context.steps().len(),
        tolerance = config.tolerance.largest(),
        "Prepared motif query."
    );
    reporter.report(Progress::PhaseFinish);

    // ===== PHASE 2: Candidate collection =====
    reporter.report(Progress::PhaseStart { name: "Candidate Collection" });
    let mut targets = collect_targets(index, &context, &config.filter, stop)?;
    reporter.report(Progress::PhaseFinish);

    let mut summary = SearchSummary {
        candidates: targets.len(),
        ..SearchSummary::default()
    };
    info!(candidates = summary.candidates, "Collected candidate structures.");

    // ===== PHASE 3: Assembly and scoring =====
    reporter.report(Progress::PhaseStart { name: "Scoring" });
    reporter.report(Progress::TaskStart {
        total_steps: targets.len() as u64,
    });
    'chunks: for chunk in targets.chunks_mut(config.chunk_size.max(1)) {
        if stop.is_stopped() {
            break;
        }
        let chunk_hits = score_chunk(&context, chunk, provider, stop, reporter);
        for hit in chunk_hits.into_iter().flatten() {
            if config.max_results.is_some_and(|max| summary.hits >= max) {
                summary.truncated = true;
                break 'chunks;
            }
            summary.hits += 1;
            if let ControlFlow::Break(()) = sink.accept(hit) {
                stop.stop();
                break 'chunks;
            }
        }
        if config.max_results.is_some_and(|max| summary.hits >= max) {
            summary.truncated = true;
            break;
        }
    }
    summary.stopped = stop.is_stopped();
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    summary.degraded_segments = index.segments_to_reinitialize();
    if !summary.degraded_segments.is_empty() {
        reporter.report(Progress::Message(format!(
            "{} index segments could not be read and were skipped",
            summary.degraded_segments.len()
        )));
    }
    info!(
        hits = summary.hits,
        truncated = summary.truncated,
        stopped = summary.stopped,
        degraded_segments = summary.degraded_segments.len(),
        "Search complete."
    );
    Ok(summary)
}

/// Runs a search to completion and returns every hit.
pub fn collect(
    index: &InvertedIndex,
    provider: &dyn StructureProvider,
    query: Arc<Structure>,
    config: &SearchConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<Hit>, EngineError> {
    let mut hits = Vec::new();
    run(index, provider, query, config, &mut hits, &StopCondition::new(), reporter)?;
    Ok(hits)
}

fn score_chunk(
    context: &QueryContext,
    chunk: &mut [TargetStructure],
    provider: &dyn StructureProvider,
    stop: &StopCondition,
    reporter: &ProgressReporter,
) -> Vec<Vec<Hit>> {
    let iterator = chunk.iter_mut();

    #[cfg(feature = "parallel")]
    let iterator = chunk.par_iter_mut();

    iterator
        .map(|target| {
            if stop.is_stopped() {
                return Vec::new();
            }
            let hits = score_target(context, target, provider, stop);
            reporter.report(Progress::TaskIncrement);
            hits
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::codec::Tolerance;
    use crate::core::models::fixtures::{
        TRIAD_SEQ_IDS, helix_structure, motion, moved, scrambled_triad_structure, triad_structure,
    };
    use crate::core::models::selector::LabelSelector;
    use crate::engine::config::SearchConfigBuilder;
    use crate::engine::error::QueryError;
    use crate::engine::hit::FnSink;
    use crate::engine::provider::InMemoryProvider;
    use crate::index::manifest::IndexSettings;
    use crate::workflows::index;
    use std::collections::BTreeSet;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        index: InvertedIndex,
        provider: InMemoryProvider,
    }

    fn fixture(structures: Vec<Structure>) -> Fixture {
        let dir = tempdir().unwrap();
        let mut index = InvertedIndex::create(dir.path(), IndexSettings::default()).unwrap();
        let ids: Vec<String> = structures.iter().map(|s| s.id.clone()).collect();
        let provider: InMemoryProvider = structures.into_iter().collect();
        index::run(&mut index, &provider, &ids, &ProgressReporter::new()).unwrap();
        Fixture {
            _dir: dir,
            index,
            provider,
        }
    }

    fn triad_labels() -> Vec<LabelSelector> {
        TRIAD_SEQ_IDS.iter().map(|&seq| LabelSelector::new("A", seq)).collect()
    }

    fn query() -> Arc<Structure> {
        Arc::new(triad_structure("query"))
    }

    fn search(fixture: &Fixture, config: &SearchConfig) -> Vec<Hit> {
        let reporter = ProgressReporter::new();
        collect(&fixture.index, &fixture.provider, query(), config, &reporter).unwrap()
    }

    fn copies(n: usize) -> Vec<Structure> {
        (0..n)
            .map(|i| moved(&triad_structure("x"), &format!("t{i}"), &motion(i + 1)))
            .collect()
    }

    #[test]
    fn finds_the_query_itself() {
        let fixture = fixture(vec![triad_structure("self"), helix_structure("plain", 10, &[])]);
        let config = SearchConfigBuilder::new().residues(triad_labels()).build().unwrap();
        let hits = search(&fixture, &config);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].structure_id, "self");
        assert_eq!(hits[0].residues, triad_labels());
        assert!(hits[0].rmsd < 0.01);
    }

    #[test]
    fn triad_is_found_once_among_decoys() {
        let fixture = fixture(vec![
            helix_structure("plain", 14, &[]),
            moved(&triad_structure("x"), "target", &motion(3)),
            scrambled_triad_structure("scrambled"),
        ]);
        let config = SearchConfigBuilder::new()
            .residues(triad_labels())
            .tolerance(Tolerance::uniform(1))
            .build()
            .unwrap();
        let hits = search(&fixture, &config);
        let target_hits: Vec<&Hit> =
            hits.iter().filter(|hit| hit.structure_id == "target").collect();
        assert_eq!(target_hits.len(), 1);
        assert!(target_hits[0].rmsd < 0.01);
        assert!(hits.iter().all(|hit| hit.structure_id != "plain"));
        assert!(hits.iter().all(|hit| hit.rmsd <= config.rmsd_cutoff));
    }

    #[test]
    fn result_limit_is_exact_and_deterministic() {
        let fixture = fixture(copies(6));
        let unlimited = SearchConfigBuilder::new()
            .residues(triad_labels())
            .chunk_size(2)
            .build()
            .unwrap();
        let all = search(&fixture, &unlimited);
        assert_eq!(all.len(), 6);

        let limited = SearchConfigBuilder::new()
            .residues(triad_labels())
            .chunk_size(2)
            .max_results(3)
            .build()
            .unwrap();
        let mut hits = Vec::new();
        let summary = run(
            &fixture.index,
            &fixture.provider,
            query(),
            &limited,
            &mut hits,
            &StopCondition::new(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(hits.len(), 3);
        assert!(summary.truncated);
        assert_eq!(hits, all[..3].to_vec());
        assert_eq!(search(&fixture, &limited), hits);
    }

    #[test]
    fn larger_tolerance_never_loses_hits() {
        let fixture = fixture(vec![
            triad_structure("a"),
            scrambled_triad_structure("b"),
            moved(&triad_structure("x"), "c", &motion(4)),
        ]);
        let keys = |tolerance: u8| -> BTreeSet<(String, Vec<LabelSelector>)> {
            let config = SearchConfigBuilder::new()
                .residues(triad_labels())
                .tolerance(Tolerance::uniform(tolerance))
                .build()
                .unwrap();
            search(&fixture, &config)
                .into_iter()
                .map(|hit| (hit.structure_id, hit.residues))
                .collect()
        };
        let narrow = keys(0);
        let wide = keys(2);
        assert!(narrow.is_subset(&wide));
        assert!(wide.contains(&("a".to_string(), triad_labels())));
    }

    #[test]
    fn denied_structures_are_not_reported() {
        let fixture = fixture(copies(3));
        let config = SearchConfigBuilder::new()
            .residues(triad_labels())
            .denied_structures(["t1".to_string()])
            .build()
            .unwrap();
        let ids: Vec<String> = search(&fixture, &config)
            .into_iter()
            .map(|hit| hit.structure_id)
            .collect();
        assert_eq!(ids, vec!["t0".to_string(), "t2".to_string()]);
    }

    #[test]
    fn sink_break_stops_the_search() {
        let fixture = fixture(copies(4));
        let config = SearchConfigBuilder::new()
            .residues(triad_labels())
            .chunk_size(1)
            .build()
            .unwrap();
        let mut seen = Vec::new();
        let mut sink = FnSink(|hit: Hit| {
            seen.push(hit.structure_id);
            ControlFlow::Break(())
        });
        let stop = StopCondition::new();
        let summary = run(
            &fixture.index,
            &fixture.provider,
            query(),
            &config,
            &mut sink,
            &stop,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(summary.stopped);
        assert!(stop.is_stopped());
        assert_eq!(summary.hits, 1);
        assert_eq!(seen, vec!["t0".to_string()]);
    }

    #[test]
    fn structures_missing_from_the_provider_are_skipped() {
        let mut fixture = fixture(copies(2));
        fixture.provider.remove("t0");
        let config = SearchConfigBuilder::new().residues(triad_labels()).build().unwrap();
        let ids: Vec<String> = search(&fixture, &config)
            .into_iter()
            .map(|hit| hit.structure_id)
            .collect();
        assert_eq!(ids, vec!["t1".to_string()]);
    }

    #[test]
    fn invalid_query_fails_before_searching() {
        let fixture = fixture(copies(1));
        let config = SearchConfigBuilder::new()
            .residues(vec![LabelSelector::new("A", 3)])
            .build()
            .unwrap();
        let reporter = ProgressReporter::new();
        let error =
            collect(&fixture.index, &fixture.provider, query(), &config, &reporter).unwrap_err();
        assert!(matches!(
            error,
            EngineError::Query {
                source: QueryError::TooFewResidues { count: 1, min: 2 }
            }
        ));
    }
}

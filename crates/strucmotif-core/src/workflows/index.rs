use crate::core::graph::builder::{ResidueGraph, ResidueGraphBuilder};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::provider::{ProviderError, StructureProvider};
use crate::index::store::{IndexBatch, InvertedIndex};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    pub occurrences: usize,
    pub commits: usize,
    /// Structures that could not be loaded.
    pub skipped: Vec<String>,
}

/// Extracts the residue graph of every structure in `ids` and adds it to `index`.
///
/// Structures are processed in batches of the index's commit interval; each batch is
/// extracted in parallel and committed before the next one starts, so an interrupted run
/// keeps every completed batch. Structures the provider cannot load are skipped with a
/// warning.
#[instrument(skip_all, name = "index_workflow")]
pub fn run(
    index: &mut InvertedIndex,
    provider: &dyn StructureProvider,
    ids: &[String],
    reporter: &ProgressReporter,
) -> Result<IndexSummary, EngineError> {
    let settings = index.settings().clone();
    let builder = ResidueGraphBuilder::new(settings.cutoff, settings.policy.clone());
    info!(
        structures = ids.len(),
        cutoff = settings.cutoff,
        policy = settings.policy.name(),
        codec = %settings.codec,
        "Indexing structures."
    );

    reporter.report(Progress::PhaseStart { name: "Indexing" });
    reporter.report(Progress::TaskStart {
        total_steps: ids.len() as u64,
    });

    let mut summary = IndexSummary::default();
    for batch_ids in ids.chunks(settings.commit_interval.max(1)) {
        let graphs = extract_graphs(&builder, provider, batch_ids, reporter);

        let mut batch = IndexBatch::new();
        for (id, graph) in batch_ids.iter().zip(graphs) {
            match graph {
                Ok(graph) => {
                    let structure_index = index.register(id);
                    summary.occurrences += graph.len();
                    batch.add_structure(
                        structure_index,
                        graph.into_edges().into_iter().map(|edge| edge.occurrence),
                    );
                    summary.indexed += 1;
                }
                Err(error) => {
                    warn!(structure = %id, %error, "Skipping structure");
                    summary.skipped.push(id.clone());
                }
            }
        }
        if !batch.is_empty() {
            index.commit(batch)?;
            summary.commits += 1;
        }
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(
        indexed = summary.indexed,
        skipped = summary.skipped.len(),
        occurrences = summary.occurrences,
        "Indexing complete."
    );
    Ok(summary)
}

fn extract_graphs(
    builder: &ResidueGraphBuilder,
    provider: &dyn StructureProvider,
    ids: &[String],
    reporter: &ProgressReporter,
) -> Vec<Result<ResidueGraph, ProviderError>> {
    let iterator = ids.iter();

    #[cfg(feature = "parallel")]
    let iterator = ids.par_iter();

    iterator
        .map(|id| {
            let graph = provider.structure(id).map(|structure| builder.build(&structure));
            reporter.report(Progress::TaskIncrement);
            graph
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::{helix_structure, triad_structure};
    use crate::engine::provider::InMemoryProvider;
    use crate::index::manifest::IndexSettings;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    fn provider() -> InMemoryProvider {
        [
            triad_structure("a"),
            triad_structure("b"),
            helix_structure("c", 9, &[]),
            helix_structure("d", 6, &[]),
            helix_structure("e", 14, &[(3, "CYS")]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn indexes_in_committed_batches() {
        let dir = tempdir().unwrap();
        let settings = IndexSettings {
            commit_interval: 2,
            ..IndexSettings::default()
        };
        let mut index = InvertedIndex::create(dir.path(), settings).unwrap();
        let provider = provider();
        let ids = provider.ids().unwrap();
        let summary = run(&mut index, &provider, &ids, &ProgressReporter::new()).unwrap();
        assert_eq!(summary.indexed, 5);
        assert_eq!(summary.commits, 3);
        assert!(summary.occurrences > 0);
        assert!(summary.skipped.is_empty());

        let reopened = InvertedIndex::open(dir.path()).unwrap();
        assert_eq!(reopened.structure_count(), 5);
        for id in &ids {
            assert!(reopened.structure_index(id).is_some());
        }
    }

    #[test]
    fn unavailable_structures_are_skipped() {
        let dir = tempdir().unwrap();
        let mut index = InvertedIndex::create(dir.path(), IndexSettings::default()).unwrap();
        let ids = vec!["a".to_string(), "missing".to_string()];
        let summary = run(&mut index, &provider(), &ids, &ProgressReporter::new()).unwrap();
        assert_eq!(summary.indexed, 1);
        assert_eq!(summary.skipped, vec!["missing".to_string()]);
        assert_eq!(index.structure_index("missing"), None);
    }

    #[test]
    fn reports_one_increment_per_structure() {
        let dir = tempdir().unwrap();
        let mut index = InvertedIndex::create(dir.path(), IndexSettings::default()).unwrap();
        let provider = provider();
        let ids = provider.ids().unwrap();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| events.lock().push(event)));
        run(&mut index, &provider, &ids, &reporter).unwrap();
        drop(reporter);
        let events = events.into_inner();
        assert_eq!(events.first(), Some(&Progress::PhaseStart { name: "Indexing" }));
        assert_eq!(
            events.iter().filter(|event| **event == Progress::TaskIncrement).count(),
            ids.len()
        );
        assert_eq!(events.last(), Some(&Progress::PhaseFinish));
    }
}

use crate::cli::IndexArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use strucmotif::engine::error::EngineError;
use strucmotif::engine::progress::ProgressReporter;
use strucmotif::engine::provider::{DirectoryProvider, StructureProvider};
use strucmotif::index::store::InvertedIndex;
use strucmotif::workflows;
use tracing::{info, warn};

pub fn run(args: IndexArgs, progress: &CliProgressHandler) -> Result<()> {
    let settings = PartialConfig::load(args.config.as_deref())?.index_settings(&args)?;

    let provider = DirectoryProvider::new(&args.structures);
    let ids = provider.ids().map_err(EngineError::from)?;
    info!(
        "Found {} structure file(s) in {:?}",
        ids.len(),
        provider.dir()
    );

    let mut index = InvertedIndex::create(&args.index, settings)?;
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    println!("Indexing {} structure(s)...", ids.len());
    let summary = workflows::index::run(&mut index, &provider, &ids, &reporter)?;

    if !summary.skipped.is_empty() {
        warn!(
            "{} structure(s) could not be read and were skipped.",
            summary.skipped.len()
        );
        println!("Skipped {} unreadable structure(s):", summary.skipped.len());
        for id in &summary.skipped {
            println!("  {id}");
        }
    }
    println!(
        "Indexed {} structure(s) with {} residue pair(s) into {} ({} structure(s) in total).",
        summary.indexed,
        summary.occurrences,
        args.index.display(),
        index.structure_count()
    );
    Ok(())
}

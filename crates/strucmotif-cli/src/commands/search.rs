use crate::cli::SearchArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use itertools::Itertools;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::sync::Arc;
use strucmotif::core::io::pdb::PdbFile;
use strucmotif::core::io::traits::StructureFile;
use strucmotif::engine::hit::{Hit, HitSink, StopCondition};
use strucmotif::engine::progress::ProgressReporter;
use strucmotif::engine::provider::DirectoryProvider;
use strucmotif::index::store::{InvertedIndex, IoFailurePolicy};
use strucmotif::workflows;
use tracing::{info, warn};

/// One CSV row per hit.
#[derive(Debug, Serialize)]
struct HitRecord {
    structure_id: String,
    rmsd: String,
    residues: String,
    residue_types: String,
    /// Upper 3x4 block of the transformation, row-major, space separated.
    transformation: String,
}

impl From<&Hit> for HitRecord {
    fn from(hit: &Hit) -> Self {
        let m = &hit.transformation;
        let transformation = (0..3)
            .cartesian_product(0..4)
            .map(|(row, col)| format!("{:.6}", m[(row, col)]))
            .join(" ");
        Self {
            structure_id: hit.structure_id.clone(),
            rmsd: format!("{:.4}", hit.rmsd),
            residues: hit.residues.iter().join(" "),
            residue_types: hit.residue_types.iter().join(" "),
            transformation,
        }
    }
}

/// Streams hits into a CSV writer. A write failure ends the search and is kept for the
/// caller.
struct CsvHitSink<W: Write> {
    writer: csv::Writer<W>,
    error: Option<csv::Error>,
}

impl<W: Write> CsvHitSink<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            error: None,
        }
    }

    fn finish(mut self) -> Result<()> {
        if let Some(error) = self.error.take() {
            return Err(error.into());
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> HitSink for CsvHitSink<W> {
    fn accept(&mut self, hit: Hit) -> ControlFlow<()> {
        match self.writer.serialize(HitRecord::from(&hit)) {
            Ok(()) => ControlFlow::Continue(()),
            Err(error) => {
                self.error = Some(error);
                ControlFlow::Break(())
            }
        }
    }
}

fn print_table(hits: &[Hit], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{:<16} {:>8}  {:<32} {}", "STRUCTURE", "RMSD", "RESIDUES", "TYPES")?;
    for hit in hits {
        let record = HitRecord::from(hit);
        writeln!(
            out,
            "{:<16} {:>8}  {:<32} {}",
            record.structure_id, record.rmsd, record.residues, record.residue_types
        )?;
    }
    Ok(())
}

pub fn run(args: SearchArgs, progress: &CliProgressHandler) -> Result<()> {
    let config = PartialConfig::load(args.config.as_deref())?.search_config(&args)?;

    info!("Loading query structure from {:?}", &args.query);
    let query = PdbFile::read_from_path(&args.query).map_err(|e| CliError::FileParsing {
        path: args.query.clone(),
        source: e.into(),
    })?;

    let mut index = InvertedIndex::open(&args.index)?;
    if args.skip_unreadable_segments {
        index = index.with_failure_policy(IoFailurePolicy::MarkForReinitialization);
    }
    let provider = DirectoryProvider::new(&args.structures);
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let stop = StopCondition::new();

    println!(
        "Searching {} structure(s) for motif {}...",
        index.structure_count(),
        config.residues.iter().join(", ")
    );

    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            let mut sink = CsvHitSink::new(file);
            let summary = workflows::search::run(
                &index,
                &provider,
                Arc::new(query),
                &config,
                &mut sink,
                &stop,
                &reporter,
            )?;
            sink.finish()?;
            println!("Wrote {} hit(s) to {}", summary.hits, path.display());
            summary
        }
        None => {
            let mut hits: Vec<Hit> = Vec::new();
            let summary = workflows::search::run(
                &index,
                &provider,
                Arc::new(query),
                &config,
                &mut hits,
                &stop,
                &reporter,
            )?;
            print_table(&hits, &mut io::stdout().lock())?;
            summary
        }
    };

    if summary.truncated {
        println!("Result limit reached; further hits were not reported.");
    }
    if !summary.degraded_segments.is_empty() {
        warn!(
            "{} index segment(s) could not be read and need to be rebuilt.",
            summary.degraded_segments.len()
        );
    }
    println!(
        "Found {} hit(s) in {} candidate structure(s).",
        summary.hits, summary.candidates
    );
    Ok(())
}

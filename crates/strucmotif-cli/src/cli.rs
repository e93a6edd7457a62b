use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use strucmotif::core::alignment::pairing::AtomPairingScheme;
use strucmotif::core::models::selector::LabelSelector;
use strucmotif::engine::pruner::PruningStrategy;
use strucmotif::index::codec::BucketCodecKind;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "strucmotif - Sequence-independent structural motif search.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add the structures of a directory to an inverted index, creating it if needed.
    Index(IndexArgs),
    /// Search an inverted index for occurrences of a motif taken from a query structure.
    Search(SearchArgs),
}

/// Arguments for the `index` subcommand.
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Directory of PDB files to index. Structure ids are the file stems.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub structures: PathBuf,

    /// Directory holding the inverted index.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub index: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum distance (in Angstrom) between two residues that form a pair.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Number of structures extracted between two commits.
    #[arg(long, value_name = "INT")]
    pub commit_interval: Option<usize>,

    /// Bucket encoding of a new index ('compact' or 'message-pack').
    #[arg(long, value_name = "CODEC")]
    pub codec: Option<BucketCodecKind>,

    /// Residue copies taking part in each structure's residue graph:
    /// 'deposited', 'deposited-with-contacts' or 'assembly:<ID>'.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<String>,
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    // --- Core Arguments ---
    /// Directory holding the inverted index.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub index: PathBuf,

    /// Directory of the indexed PDB files, read when scoring candidates.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub structures: PathBuf,

    /// PDB file containing the motif.
    #[arg(short = 'Q', long, required = true, value_name = "PATH")]
    pub query: PathBuf,

    /// Motif residues as CHAIN:SEQ, comma separated (e.g. 'A:57,A:102,A:195').
    #[arg(short, long, required = true, value_delimiter = ',', value_name = "SELECTORS")]
    pub residues: Vec<LabelSelector>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write hits as CSV to this file instead of printing a table.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Matching Overrides ---
    /// Tolerance in buckets for every descriptor dimension.
    #[arg(short, long, value_name = "INT")]
    pub tolerance: Option<u8>,

    /// Tolerance of the backbone distance, overriding --tolerance.
    #[arg(long, value_name = "INT")]
    pub backbone_tolerance: Option<u8>,

    /// Tolerance of the side-chain distance, overriding --tolerance.
    #[arg(long, value_name = "INT")]
    pub side_chain_tolerance: Option<u8>,

    /// Tolerance of the angle, overriding --tolerance.
    #[arg(long, value_name = "INT")]
    pub angle_tolerance: Option<u8>,

    /// Accept other residue types at a motif position. Can be used multiple times.
    /// Example: --exchange A:57=HIS,TYR
    #[arg(short = 'x', long = "exchange", value_name = "SELECTOR=TYPES")]
    pub exchanges: Vec<String>,

    /// Report only hits with an RMSD (in Angstrom) at or below this value.
    #[arg(long, value_name = "FLOAT")]
    pub rmsd_cutoff: Option<f64>,

    /// Stop after this many hits.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_results: Option<usize>,

    /// Atoms used for superposition.
    #[arg(long, value_name = "SCHEME")]
    pub scheme: Option<AtomPairingScheme>,

    /// How the motif is reduced to a path of residue pairs.
    #[arg(long, value_name = "STRATEGY")]
    pub pruning: Option<PruningStrategy>,

    // --- Candidate Filters ---
    /// Only search these structure ids, comma separated.
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub allow: Vec<String>,

    /// Never report these structure ids, comma separated.
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub deny: Vec<String>,

    /// Skip unreadable index segments and report them instead of failing the search.
    #[arg(long)]
    pub skip_unreadable_segments: bool,
}

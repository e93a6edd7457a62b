use crate::cli::{IndexArgs, SearchArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use strucmotif::core::alignment::pairing::AtomPairingScheme;
use strucmotif::core::descriptor::codec::Tolerance;
use strucmotif::core::models::selector::LabelSelector;
use strucmotif::engine::config::{
    DEFAULT_TOLERANCE, ExchangeMap, SearchConfig, SearchConfigBuilder,
};
use strucmotif::engine::pruner::PruningStrategy;
use strucmotif::index::codec::BucketCodecKind;
use strucmotif::index::manifest::IndexSettings;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialIndexConfig {
    cutoff: Option<f64>,
    commit_interval: Option<usize>,
    codec: Option<BucketCodecKind>,
    policy: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialToleranceConfig {
    uniform: Option<u8>,
    backbone: Option<u8>,
    side_chain: Option<u8>,
    angle: Option<u8>,
    max: Option<u8>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSearchConfig {
    tolerance: Option<PartialToleranceConfig>,
    rmsd_cutoff: Option<f64>,
    max_results: Option<usize>,
    scheme: Option<AtomPairingScheme>,
    pruning: Option<PruningStrategy>,
    max_motif_size: Option<usize>,
    chunk_size: Option<usize>,
    /// Motif position to accepted three-letter codes, e.g. `"A:57" = ["HIS", "TYR"]`.
    exchanges: Option<BTreeMap<LabelSelector, Vec<String>>>,
    allow: Option<Vec<String>>,
    deny: Option<Vec<String>>,
}

/// Settings read from an optional TOML file. CLI arguments take precedence over file
/// values, which take precedence over library defaults.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConfig {
    index: Option<PartialIndexConfig>,
    search: Option<PartialSearchConfig>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `path` if given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn index_settings(mut self, args: &IndexArgs) -> Result<IndexSettings> {
        let file = self.index.take().unwrap_or_default();
        let defaults = IndexSettings::default();

        let cutoff = args.cutoff.or(file.cutoff).unwrap_or(defaults.cutoff);
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(CliError::Config(format!(
                "`index.cutoff` must be a positive distance, got {cutoff}"
            )));
        }
        let commit_interval = args
            .commit_interval
            .or(file.commit_interval)
            .unwrap_or(defaults.commit_interval);
        if commit_interval == 0 {
            return Err(CliError::Config(
                "`index.commit-interval` must be at least 1".to_string(),
            ));
        }
        let policy = match args.policy.as_ref().or(file.policy.as_ref()) {
            Some(policy) => {
                parser::parse_policy(policy).map_err(|e| CliError::Argument(e.to_string()))?
            }
            None => defaults.policy,
        };

        Ok(IndexSettings {
            cutoff,
            codec: args.codec.or(file.codec).unwrap_or(defaults.codec),
            commit_interval,
            policy,
        })
    }

    pub fn search_config(mut self, args: &SearchArgs) -> Result<SearchConfig> {
        let file = self.search.take().unwrap_or_default();
        let file_tolerance = file.tolerance.unwrap_or_default();

        // Per-dimension flag, uniform flag, per-dimension file value, uniform file value.
        let dimension = |cli: Option<u8>, file: Option<u8>| {
            cli.or(args.tolerance)
                .or(file)
                .or(file_tolerance.uniform)
                .unwrap_or(DEFAULT_TOLERANCE)
        };
        let tolerance = Tolerance {
            backbone: dimension(args.backbone_tolerance, file_tolerance.backbone),
            side_chain: dimension(args.side_chain_tolerance, file_tolerance.side_chain),
            angle: dimension(args.angle_tolerance, file_tolerance.angle),
        };

        let mut builder = SearchConfigBuilder::new()
            .residues(args.residues.clone())
            .exchanges(Self::merge_exchanges(file.exchanges, &args.exchanges)?)
            .tolerance(tolerance);

        if let Some(max) = file_tolerance.max {
            builder = builder.max_tolerance(max);
        }
        if let Some(cutoff) = args.rmsd_cutoff.or(file.rmsd_cutoff) {
            builder = builder.rmsd_cutoff(cutoff);
        }
        if let Some(max_results) = args.max_results.or(file.max_results) {
            builder = builder.max_results(max_results);
        }
        if let Some(scheme) = args.scheme.or(file.scheme) {
            builder = builder.scheme(scheme);
        }
        if let Some(pruning) = args.pruning.or(file.pruning) {
            builder = builder.pruning(pruning);
        }
        if let Some(size) = file.max_motif_size {
            builder = builder.max_motif_size(size);
        }
        if let Some(size) = file.chunk_size {
            builder = builder.chunk_size(size);
        }

        let allow = if args.allow.is_empty() { file.allow } else { Some(args.allow.clone()) };
        if let Some(allow) = allow {
            builder = builder.allowed_structures(allow);
        }
        let deny = if args.deny.is_empty() {
            file.deny.unwrap_or_default()
        } else {
            args.deny.clone()
        };
        builder = builder.denied_structures(deny);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// File exchanges first; a CLI exchange replaces the file entry for the same residue.
    fn merge_exchanges(
        file: Option<BTreeMap<LabelSelector, Vec<String>>>,
        cli: &[String],
    ) -> Result<ExchangeMap> {
        let mut exchanges = ExchangeMap::new();
        for (selector, codes) in file.unwrap_or_default() {
            let types = parser::parse_residue_types(codes.iter().map(String::as_str))
                .map_err(|e| CliError::Config(e.to_string()))?;
            exchanges.insert(selector, types);
        }
        for value in cli {
            let (selector, types) =
                parser::parse_exchange(value).map_err(|e| CliError::Argument(e.to_string()))?;
            exchanges.insert(selector, types);
        }
        Ok(exchanges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::io::Write;
    use strucmotif::core::graph::policy::InclusionPolicy;
    use strucmotif::core::models::residue::ResidueType;
    use strucmotif::engine::config::DEFAULT_RMSD_CUTOFF;

    fn search_args(extra: &[&str]) -> SearchArgs {
        let mut argv = vec![
            "strucmotif", "search", "-i", "idx", "-s", "pdb", "-Q", "q.pdb", "-r", "A:3,A:6,A:10",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Search(args) => args,
            Commands::Index(_) => unreachable!(),
        }
    }

    fn index_args(extra: &[&str]) -> IndexArgs {
        let mut argv = vec!["strucmotif", "index", "-s", "pdb", "-i", "idx"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Index(args) => args,
            Commands::Search(_) => unreachable!(),
        }
    }

    const FILE: &str = r#"
[index]
cutoff = 15.0
codec = "message-pack"
policy = "assembly:1"

[search]
rmsd-cutoff = 1.5
max-results = 20
scheme = "backbone"
chunk-size = 8
deny = ["1xyz"]

[search.tolerance]
uniform = 2
angle = 0

[search.exchanges]
"A:3" = ["HIS", "TYR"]
"#;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = PartialConfig::default().search_config(&search_args(&[])).unwrap();
        assert_eq!(config.tolerance, Tolerance::uniform(DEFAULT_TOLERANCE));
        assert_eq!(config.rmsd_cutoff, DEFAULT_RMSD_CUTOFF);
        assert_eq!(config.max_results, None);
        assert!(config.exchanges.is_empty());

        let settings = PartialConfig::default().index_settings(&index_args(&[])).unwrap();
        assert_eq!(settings, IndexSettings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = PartialConfig::from_toml(FILE).unwrap();
        let config = file.search_config(&search_args(&[])).unwrap();
        assert_eq!(
            config.tolerance,
            Tolerance {
                backbone: 2,
                side_chain: 2,
                angle: 0
            }
        );
        assert_eq!(config.rmsd_cutoff, 1.5);
        assert_eq!(config.max_results, Some(20));
        assert_eq!(config.scheme, AtomPairingScheme::Backbone);
        assert_eq!(config.chunk_size, 8);
        assert!(!config.filter.accepts("1xyz"));
        assert_eq!(
            config.exchanges.get(&LabelSelector::new("A", 3)),
            Some(&vec![ResidueType::Histidine, ResidueType::Tyrosine])
        );

        let settings = PartialConfig::from_toml(FILE)
            .unwrap()
            .index_settings(&index_args(&[]))
            .unwrap();
        assert_eq!(settings.cutoff, 15.0);
        assert_eq!(settings.codec, BucketCodecKind::MessagePack);
        assert_eq!(settings.policy, InclusionPolicy::Assembly("1".to_string()));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let file = PartialConfig::from_toml(FILE).unwrap();
        let args = search_args(&[
            "--tolerance", "1", "--angle-tolerance", "3", "--max-results", "5",
            "--exchange", "A:3=SER", "--deny", "2abc",
        ]);
        let config = file.search_config(&args).unwrap();
        assert_eq!(
            config.tolerance,
            Tolerance {
                backbone: 1,
                side_chain: 1,
                angle: 3
            }
        );
        assert_eq!(config.max_results, Some(5));
        assert_eq!(
            config.exchanges.get(&LabelSelector::new("A", 3)),
            Some(&vec![ResidueType::Serine])
        );
        assert!(config.filter.accepts("1xyz"));
        assert!(!config.filter.accepts("2abc"));

        let settings = PartialConfig::from_toml(FILE)
            .unwrap()
            .index_settings(&index_args(&["--cutoff", "12.5", "--policy", "deposited"]))
            .unwrap();
        assert_eq!(settings.cutoff, 12.5);
        assert_eq!(settings.policy, InclusionPolicy::Deposited);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PartialConfig::from_toml("[search]\nrmsd = 1.0\n").is_err());
        assert!(PartialConfig::from_toml("[output]\n").is_err());
    }

    #[test]
    fn invalid_values_surface_as_config_errors() {
        let error = PartialConfig::default()
            .search_config(&search_args(&["--tolerance", "9"]))
            .unwrap_err();
        assert!(matches!(error, CliError::Config(_)));

        let error = PartialConfig::default()
            .index_settings(&index_args(&["--commit-interval", "0"]))
            .unwrap_err();
        assert!(matches!(error, CliError::Config(_)));
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();
        let config = PartialConfig::load(Some(file.path())).unwrap();
        assert!(config.search.is_some());

        let error =
            PartialConfig::load(Some(Path::new("/nonexistent/strucmotif.toml"))).unwrap_err();
        assert!(matches!(error, CliError::Io(_)));
    }
}

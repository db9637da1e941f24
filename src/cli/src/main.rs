//! BRB - Access Bundle Miner CLI
//!
//! Loads an IAM access extract (CSV or synthetic), runs one analysis and
//! prints the resulting rows to stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use brb_core::ingest::read_csv;
use brb_core::{Column, Dataset, DatasetStore, RecordFilter};
use brb_engine::diagnosis::diagnose;
use brb_engine::explain::explain_access;
use brb_engine::metrics::{role_overlap, role_usage_metrics, user_access_summary};
use brb_engine::mining::filter_suggestions;
use brb_engine::synthetic::{generate, SyntheticConfig};
use brb_engine::EngineConfig;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;

mod output;

use output::{write_record, write_rows, OutputFormat};

/// Access bundle miner
#[derive(Parser)]
#[command(name = "brb")]
#[command(about = "Mine reusable access bundles from IAM extracts, screened for SoD conflicts")]
#[command(version)]
struct Cli {
    /// Path to engine configuration (TOML)
    #[arg(short, long, env = "BRB_CONFIG")]
    config: Option<PathBuf>,

    /// Access extract (CSV with header row)
    #[arg(short, long, env = "BRB_INPUT", conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Use a generated extract with this seed instead of a file
    #[arg(long, value_name = "SEED")]
    synthetic: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Record filters shared by several subcommands
#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    supervisor_group: Option<String>,

    #[arg(long)]
    job_code: Option<String>,

    #[arg(long)]
    department: Option<String>,

    #[arg(long)]
    assignment_type: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            supervisor_group: self.supervisor_group.clone(),
            department: self.department.clone(),
            job_code: self.job_code.clone(),
            assignment_type: self.assignment_type.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Suggest role bundles per cohort
    Bundles {
        #[command(flatten)]
        filter: FilterArgs,

        /// Override mining.min_itemset_support
        #[arg(long)]
        min_itemset_support: Option<f64>,

        /// Override mining.max_k
        #[arg(long)]
        max_k: Option<usize>,
    },

    /// Role coverage per group
    RoleMetrics {
        #[command(flatten)]
        filter: FilterArgs,

        /// Group columns (overrides metrics.group_columns)
        #[arg(long, value_delimiter = ',')]
        group_by: Vec<Column>,
    },

    /// Per-user access footprint
    UserSummary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Only print the first N users
        #[arg(long)]
        top: Option<usize>,
    },

    /// Most similar role pairs by shared users
    Overlap {
        #[arg(long)]
        min_common_users: Option<usize>,

        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Recommend access for a new joiner
    NewJoiner {
        #[arg(long)]
        job_code: String,

        #[arg(long)]
        supervisor_group: Option<String>,

        #[arg(long)]
        department: Option<String>,

        /// Report HIGH SoD conflicts without removing roles
        #[arg(long)]
        allow_high_sod: bool,
    },

    /// Explain why bundles are missing or sparse
    Diagnose {
        #[command(flatten)]
        filter: FilterArgs,

        /// Override diagnosis.min_itemset_support
        #[arg(long)]
        min_itemset_support: Option<f64>,
    },

    /// Explain why a user holds a role
    Explain {
        #[arg(long)]
        user: String,

        #[arg(long)]
        role: String,
    },

    /// Print the loaded extract as rows
    Generate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => {
            let config = EngineConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => EngineConfig::default(),
    };

    let store = DatasetStore::new(load_dataset(&cli)?);
    let dataset = store.snapshot();
    info!(rows = dataset.len(), users = dataset.user_count(), "extract loaded");

    run(cli.command, &config, &dataset, cli.format)
}

fn load_dataset(cli: &Cli) -> Result<Dataset> {
    if let Some(seed) = cli.synthetic {
        return Ok(generate(&SyntheticConfig::default().with_seed(seed)));
    }

    let Some(path) = &cli.input else {
        bail!("No extract given: pass --input <CSV> (or BRB_INPUT) or --synthetic <SEED>");
    };
    let file = File::open(path).with_context(|| format!("Failed to open extract {:?}", path))?;
    read_csv(BufReader::new(file)).with_context(|| format!("Failed to read extract {:?}", path))
}

fn run(command: Command, config: &EngineConfig, dataset: &Dataset, format: OutputFormat) -> Result<()> {
    let stdout = io::stdout().lock();

    match command {
        Command::Bundles {
            filter,
            min_itemset_support,
            max_k,
        } => {
            let mut params = config.mining.clone();
            if let Some(support) = min_itemset_support {
                params.min_itemset_support = support;
            }
            if let Some(max_k) = max_k {
                params.max_k = max_k;
            }

            let bundles = config.bundle_miner().suggest_itemsets(dataset, &params);
            let bundles = filter_suggestions(bundles, &filter.to_filter());
            write_rows(&bundles, format, stdout)
        }

        Command::RoleMetrics { filter, group_by } => {
            let columns = if group_by.is_empty() {
                config.metrics.group_columns.clone()
            } else {
                group_by
            };
            let rows = role_usage_metrics(&dataset.filter(&filter.to_filter()), &columns);
            write_rows(&rows, format, stdout)
        }

        Command::UserSummary { filter, top } => {
            let mut rows = user_access_summary(&dataset.filter(&filter.to_filter()));
            if let Some(top) = top {
                rows.truncate(top);
            }
            write_rows(&rows, format, stdout)
        }

        Command::Overlap {
            min_common_users,
            top_n,
        } => {
            let rows = role_overlap(
                dataset,
                min_common_users.unwrap_or(config.metrics.min_common_users),
                top_n.unwrap_or(config.metrics.overlap_top_n),
            );
            write_rows(&rows, format, stdout)
        }

        Command::NewJoiner {
            job_code,
            supervisor_group,
            department,
            allow_high_sod,
        } => {
            let mut request = config.new_joiner.request(job_code);
            request.supervisor_group = supervisor_group;
            request.department = department;
            if allow_high_sod {
                request.block_high_sod = false;
            }

            let rows = config.new_joiner_recommender().recommend(dataset, &request);
            write_rows(&rows, format, stdout)
        }

        Command::Diagnose {
            filter,
            min_itemset_support,
        } => {
            let mut request = config.diagnosis.request();
            request.supervisor_group = filter.supervisor_group;
            request.job_code = filter.job_code;
            request.department = filter.department;
            request.assignment_type = filter.assignment_type;
            if let Some(support) = min_itemset_support {
                request.min_itemset_support = support;
            }

            write_record(&diagnose(dataset, &request), format, stdout)
        }

        Command::Explain { user, role } => {
            let explanation = explain_access(dataset, &user, &role)?;
            write_record(&explanation, format, stdout)
        }

        Command::Generate => write_rows(dataset.records(), format, stdout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bundles_with_filters() {
        let cli = Cli::try_parse_from([
            "brb",
            "--synthetic",
            "7",
            "--format",
            "csv",
            "bundles",
            "--supervisor-group",
            "SH_L6_1",
            "--max-k",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.synthetic, Some(7));
        assert_eq!(cli.format, OutputFormat::Csv);
        match cli.command {
            Command::Bundles { filter, max_k, .. } => {
                assert_eq!(filter.supervisor_group.as_deref(), Some("SH_L6_1"));
                assert_eq!(max_k, Some(2));
            }
            _ => panic!("Expected bundles subcommand"),
        }
    }

    #[test]
    fn test_parse_group_by_columns() {
        let cli = Cli::try_parse_from([
            "brb",
            "--synthetic",
            "1",
            "role-metrics",
            "--group-by",
            "supervisor_level6,job_code",
        ])
        .unwrap();

        match cli.command {
            Command::RoleMetrics { group_by, .. } => {
                assert_eq!(group_by, vec![Column::SupervisorGroup, Column::JobCode]);
            }
            _ => panic!("Expected role-metrics subcommand"),
        }
    }

    #[test]
    fn test_input_conflicts_with_synthetic() {
        let result = Cli::try_parse_from(["brb", "--input", "x.csv", "--synthetic", "1", "generate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_csv_extract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.csv");
        std::fs::write(&path, "user_id,role_name,job_code\nU1,R1,JC101\nU1,R2,JC101\n").unwrap();

        let cli = Cli::try_parse_from(["brb", "--input", path.to_str().unwrap(), "generate"]).unwrap();
        let dataset = load_dataset(&cli).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.has_column(Column::Department));
    }

    #[test]
    fn test_missing_extract_is_an_error() {
        let cli = Cli::try_parse_from(["brb", "generate"]);
        // BRB_INPUT may be set in the environment; only assert when it is not
        if std::env::var_os("BRB_INPUT").is_none() {
            assert!(load_dataset(&cli.unwrap()).is_err());
        }
    }
}

use crate::utils::constants::COMPRESSION_SNAPPY;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smn-pipeline")]
#[command(about = "SMN hourly weather observations: filter, clean, aggregate and enrich")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Province whose stations are kept")]
    pub province: Option<String>,

    #[arg(short, long, global = true, help = "Root of the tiered data directory")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress bars")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the catalog stations resolved for the province
    Stations,

    /// Filter raw dumps into per-station shards
    Ingest {
        #[arg(help = "Raw dump to ingest [default: every file not yet in the ledger]")]
        file: Option<PathBuf>,
    },

    /// Rebuild the cleaned hourly and daily datasets from all shards
    Clean,

    /// Derive range metrics from the cleaned daily dataset
    Enrich,

    /// Ingest pending files, then clean, then enrich
    Run,

    /// Watch every stage boundary and run stages as inputs settle
    Watch,

    /// Run quality checks over the cleaned daily dataset
    Validate,

    /// Show ledger state and the latest enriched runs
    Status,

    /// Export the enriched daily dataset to Parquet
    Export {
        #[arg(short, long, help = "Output Parquet file path")]
        output: PathBuf,

        #[arg(long, default_value = COMPRESSION_SNAPPY)]
        compression: String,
    },
}

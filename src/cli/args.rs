use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "holiday-travel-processor")]
#[command(about = "Per-state holiday travel, flight delay and December climate summary")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Hide the progress bar and report")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Settings file (TOML)")]
    pub config: Option<PathBuf>,
}

/// Input paths; each one overrides the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(long, help = "Airport passenger table (CSV)")]
    pub passengers: Option<PathBuf>,

    #[arg(long, help = "Flight delay table (CSV)")]
    pub delays: Option<PathBuf>,

    #[arg(long, help = "NOAA climate divisional temperature file")]
    pub climate: Option<PathBuf>,

    #[arg(long, help = "Airport-to-state lookup (CSV)")]
    pub lookup: Option<PathBuf>,

    #[arg(long, help = "Highest tolerated share of malformed rows per source (0.0-1.0)")]
    pub max_skip_ratio: Option<f64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load all sources, aggregate by state and write the summary
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        #[arg(
            short,
            long,
            help = "Summary CSV path [default: data/combined_state_data.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "Also write the summary as Parquet")]
        parquet: Option<PathBuf>,

        #[arg(long, help = "Parquet compression: snappy, gzip, lz4, zstd, none")]
        compression: Option<String>,

        #[arg(long, help = "Also render an HTML dashboard")]
        dashboard: Option<PathBuf>,

        #[arg(long, help = "Append the supplementary columns to the CSV")]
        extended: bool,

        #[arg(long, help = "Decimal places for floating-point columns")]
        decimal_places: Option<usize>,
    },

    /// Load and aggregate every source without writing anything
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Describe an existing summary CSV or Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "5", help = "Rows to show")]
        sample: usize,
    },
}

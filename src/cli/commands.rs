use crate::analyzers::SummaryAnalyzer;
use crate::cli::args::{Cli, Commands, InputArgs};
use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::processors::{Pipeline, PipelineOutcome, PIPELINE_STAGES};
use crate::models::StateSummary;
use crate::utils::progress::StageProgress;
use crate::writers::{format_fixed, ParquetWriter, SummaryCsvWriter};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run {
            inputs,
            output,
            parquet,
            compression,
            dashboard,
            extended,
            decimal_places,
        } => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            apply_inputs(&mut settings, &inputs);
            if let Some(output) = output {
                settings.outputs.summary_csv = output;
            }
            if parquet.is_some() {
                settings.outputs.parquet = parquet;
            }
            if let Some(compression) = compression {
                settings.outputs.parquet_compression = compression;
            }
            if dashboard.is_some() {
                settings.outputs.dashboard = dashboard;
            }
            if extended {
                settings.outputs.extended_columns = true;
            }
            if let Some(places) = decimal_places {
                settings.outputs.decimal_places = places;
            }

            let pipeline = Pipeline::new(settings)?;
            info!(
                output = %pipeline.settings().outputs.summary_csv.display(),
                "Building state summary"
            );

            let progress = StageProgress::new(PIPELINE_STAGES, quiet);
            let outcome = pipeline.run(Some(&progress))?;
            progress.finish_with_message("Summary written");

            if !quiet {
                print_report(&outcome);
                println!("\nWrote:");
                for path in &outcome.written {
                    println!("  {}", path.display());
                }
                if let Some(path) = &pipeline.settings().outputs.parquet {
                    let info = ParquetWriter::get_file_info(path)?;
                    println!("\n{}", info.summary());
                }
            }
        }

        Commands::Validate { inputs } => {
            let mut settings = Settings::load(cli.config.as_deref())?;
            apply_inputs(&mut settings, &inputs);

            let pipeline = Pipeline::new(settings)?;
            let progress = StageProgress::new(PIPELINE_STAGES - 1, quiet);
            let outcome = pipeline.validate(Some(&progress))?;
            progress.finish_with_message("Validation complete");

            if !quiet {
                print_report(&outcome);
                println!("\nAll sources passed validation; nothing was written");
            }
        }

        Commands::Info { file, sample } => {
            describe_summary(&file, sample)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProcessingError::file_access(path, e))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| ProcessingError::Config(format!("cannot initialise logging: {}", e)))
}

fn apply_inputs(settings: &mut Settings, inputs: &InputArgs) {
    if let Some(path) = &inputs.passengers {
        settings.inputs.passengers = path.clone();
    }
    if let Some(path) = &inputs.delays {
        settings.inputs.delays = path.clone();
    }
    if let Some(path) = &inputs.climate {
        settings.inputs.climate = path.clone();
    }
    if let Some(path) = &inputs.lookup {
        settings.inputs.lookup = path.clone();
    }
    if let Some(ratio) = inputs.max_skip_ratio {
        settings.validation.max_skip_ratio = ratio;
    }
}

fn print_report(outcome: &PipelineOutcome) {
    println!("\n{}", outcome.load_summary());

    let stats = SummaryAnalyzer::new().analyze(&outcome.summaries);
    println!("{}", stats.detailed_summary());
}

fn describe_summary(file: &Path, sample: usize) -> Result<()> {
    println!("Analyzing summary file: {}", file.display());

    let summaries = read_summary_file(file)?;
    let stats = SummaryAnalyzer::new().analyze(&summaries);
    println!("\n{}", stats.detailed_summary());

    if sample > 0 {
        println!("\nSample Rows (showing {} rows):", sample.min(summaries.len()));
        for (i, summary) in summaries.iter().take(sample).enumerate() {
            let volume = summary
                .holiday_travel_volume
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let delay = or_dash(format_fixed(summary.avg_delay_pct, 1));
            let temp = or_dash(format_fixed(summary.avg_dec_temperature, 1));
            println!(
                "{}. {} ({}): travel={}, delay={}%, dec temp={}°F",
                i + 1,
                summary.state_name,
                summary.state,
                volume,
                delay,
                temp
            );
        }
    }

    Ok(())
}

/// A `.parquet` extension selects the columnar reader; anything else is CSV.
fn read_summary_file(file: &Path) -> Result<Vec<StateSummary>> {
    if is_parquet(file) {
        let info = ParquetWriter::get_file_info(file)?;
        println!("\n{}", info.summary());
        ParquetWriter::read_summaries(file)
    } else {
        SummaryCsvWriter::read_summaries(file)
    }
}

fn is_parquet(file: &Path) -> bool {
    file.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"))
}

fn or_dash(text: String) -> String {
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}

use crate::config::Settings;
use crate::error::Result;
use crate::models::{AirportRecord, ClimateRecord, DelayRecord, StateSummary};
use crate::processors::StateAggregator;
use crate::readers::{
    generate_load_summary, AirportLookup, ClimateReader, DelayReader, LookupReader,
    PassengerReader, ReadReport,
};
use crate::utils::progress::StageProgress;
use crate::writers::{persist_all, DashboardWriter, ParquetWriter, SummaryCsvWriter};
use std::path::PathBuf;
use tracing::info;

/// Number of progress stages in a full run: four loads, aggregate, write.
pub const PIPELINE_STAGES: u64 = 6;

/// Everything read from the four inputs, already audited.
#[derive(Debug)]
pub struct LoadedSources {
    pub lookup: AirportLookup,
    pub passengers: Vec<AirportRecord>,
    pub delays: Vec<DelayRecord>,
    pub climate: Vec<ClimateRecord>,
    pub reports: Vec<ReadReport>,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub summaries: Vec<StateSummary>,
    pub reports: Vec<ReadReport>,
    pub written: Vec<PathBuf>,
}

impl PipelineOutcome {
    /// Per-source row counts and skip samples.
    pub fn load_summary(&self) -> String {
        let reports: Vec<&ReadReport> = self.reports.iter().collect();
        generate_load_summary(&reports)
    }
}

/// Load, aggregate and emit. Nothing is written unless every earlier step
/// succeeded.
pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.check()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn load(&self, progress: Option<&StageProgress>) -> Result<LoadedSources> {
        let inputs = &self.settings.inputs;
        let max_ratio = self.settings.validation.max_skip_ratio;

        stage(progress, "Loading airport-to-state lookup");
        let (lookup, lookup_report) =
            LookupReader::new(self.settings.lookup.clone()).read_lookup(&inputs.lookup)?;
        audit(&lookup_report, max_ratio)?;
        done(progress);

        stage(progress, "Loading airport passengers");
        let passengers = PassengerReader::new(self.settings.passengers.clone())
            .read_passengers(&inputs.passengers)?;
        audit(&passengers.report, max_ratio)?;
        done(progress);

        stage(progress, "Loading flight delays");
        let delays = DelayReader::new(self.settings.delays.clone()).read_delays(&inputs.delays)?;
        audit(&delays.report, max_ratio)?;
        done(progress);

        stage(progress, "Loading climate divisional data");
        let climate =
            ClimateReader::new(self.settings.climate.clone()).read_climate(&inputs.climate)?;
        audit(&climate.report, max_ratio)?;
        done(progress);

        Ok(LoadedSources {
            lookup,
            passengers: passengers.records,
            delays: delays.records,
            climate: climate.records,
            reports: vec![lookup_report, passengers.report, delays.report, climate.report],
        })
    }

    pub fn aggregate(
        &self,
        sources: &LoadedSources,
        progress: Option<&StageProgress>,
    ) -> Result<Vec<StateSummary>> {
        stage(progress, "Aggregating by state");
        let aggregator = StateAggregator::new(&sources.lookup, &self.settings.climate);
        let summaries =
            aggregator.aggregate(&sources.passengers, &sources.delays, &sources.climate)?;
        done(progress);

        let complete = summaries.iter().filter(|s| s.is_complete()).count();
        info!(states = summaries.len(), complete, "Aggregated state summaries");
        Ok(summaries)
    }

    /// Emit the summary CSV and any configured extra outputs.
    ///
    /// Every output is encoded into a temporary file first; destinations are
    /// only replaced once all of them encoded cleanly.
    pub fn write_outputs(
        &self,
        summaries: &[StateSummary],
        progress: Option<&StageProgress>,
    ) -> Result<Vec<PathBuf>> {
        let outputs = &self.settings.outputs;
        stage(progress, "Writing outputs");

        let mut staged = vec![SummaryCsvWriter::new()
            .with_decimal_places(outputs.decimal_places)
            .with_extended_columns(outputs.extended_columns)
            .stage_summaries(summaries, &outputs.summary_csv)?];

        if let Some(path) = &outputs.parquet {
            let writer = ParquetWriter::new().with_compression(&outputs.parquet_compression)?;
            staged.push(writer.stage_summaries(summaries, path)?);
        }

        if let Some(path) = &outputs.dashboard {
            let writer = DashboardWriter::new().with_climate_window(
                self.settings.climate.first_year,
                self.settings.climate.last_year,
            );
            let html = writer.render(summaries)?;
            staged.push(writer.stage_html(&html, path)?);
        }

        let written = persist_all(staged)?;
        for path in &written {
            info!(path = %path.display(), "Wrote output");
        }

        done(progress);
        Ok(written)
    }

    /// Full run: load, aggregate, write.
    pub fn run(&self, progress: Option<&StageProgress>) -> Result<PipelineOutcome> {
        let sources = self.load(progress)?;
        let summaries = self.aggregate(&sources, progress)?;
        let written = self.write_outputs(&summaries, progress)?;

        Ok(PipelineOutcome {
            summaries,
            reports: sources.reports,
            written,
        })
    }

    /// Load and aggregate without writing anything.
    pub fn validate(&self, progress: Option<&StageProgress>) -> Result<PipelineOutcome> {
        let sources = self.load(progress)?;
        let summaries = self.aggregate(&sources, progress)?;

        Ok(PipelineOutcome {
            summaries,
            reports: sources.reports,
            written: Vec::new(),
        })
    }
}

fn audit(report: &ReadReport, max_ratio: f64) -> Result<()> {
    report.log();
    report.ensure_plausible(max_ratio)
}

fn stage(progress: Option<&StageProgress>, message: &str) {
    if let Some(progress) = progress {
        progress.start_stage(message);
    }
}

fn done(progress: Option<&StageProgress>) {
    if let Some(progress) = progress {
        progress.finish_stage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn climdiv_line(state: u16, year: i32, dec: f64) -> String {
        let mut line = format!("{:03}002{:04}", state, year);
        for _ in 0..11 {
            line.push_str(&format!("{:7.2}", 50.0));
        }
        line.push_str(&format!("{:7.2}", dec));
        line
    }

    fn write_inputs(dir: &Path) -> Settings {
        fs::write(
            dir.join("lookup.csv"),
            "airport_code,state_code\nATL,GA\nORD,IL\n",
        )
        .unwrap();
        fs::write(
            dir.join("passengers.csv"),
            "airport_code,nov_passengers,dec_passengers\nATL,100,200\nORD,50,60\n",
        )
        .unwrap();
        fs::write(
            dir.join("delays.csv"),
            "airport_code,delay_pct,total_flights\nATL,10,100\nORD,20,300\n",
        )
        .unwrap();
        fs::write(
            dir.join("climate.txt"),
            format!(
                "{}\n{}\n",
                climdiv_line(9, 2022, 47.0),
                climdiv_line(11, 2022, 28.5)
            ),
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.inputs.lookup = dir.join("lookup.csv");
        settings.inputs.passengers = dir.join("passengers.csv");
        settings.inputs.delays = dir.join("delays.csv");
        settings.inputs.climate = dir.join("climate.txt");
        settings.outputs.summary_csv = dir.join("out").join("combined_state_data.csv");
        settings
    }

    #[test]
    fn test_run_writes_summary() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = write_inputs(dir.path());
        let pipeline = Pipeline::new(settings)?;

        let outcome = pipeline.run(None)?;

        assert_eq!(outcome.summaries.len(), 50);
        assert_eq!(outcome.reports.len(), 4);
        assert!(outcome.load_summary().contains("airport passengers"));
        assert_eq!(outcome.written.len(), 1);
        assert!(outcome.written[0].exists());

        let georgia = outcome.summaries.iter().find(|s| s.state == "GA").unwrap();
        assert_eq!(georgia.holiday_travel_volume, Some(300));
        assert_eq!(georgia.avg_delay_pct, Some(10.0));
        assert_eq!(georgia.avg_dec_temperature, Some(47.0));
        Ok(())
    }

    #[test]
    fn test_validate_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = write_inputs(dir.path());
        let output = settings.outputs.summary_csv.clone();

        let outcome = Pipeline::new(settings)?.validate(None)?;

        assert_eq!(outcome.summaries.len(), 50);
        assert!(outcome.written.is_empty());
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_empty_source_aborts_before_writing() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = write_inputs(dir.path());
        fs::write(&settings.inputs.delays, "airport_code,delay_pct,total_flights\n")?;
        let output = settings.outputs.summary_csv.clone();

        let err = Pipeline::new(settings)?.run(None).unwrap_err();

        assert!(matches!(err, ProcessingError::EmptySource { .. }));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_extra_outputs_are_written() -> Result<()> {
        let dir = TempDir::new()?;
        let mut settings = write_inputs(dir.path());
        settings.outputs.parquet = Some(dir.path().join("out").join("summary.parquet"));
        settings.outputs.dashboard = Some(dir.path().join("out").join("dashboard.html"));

        let outcome = Pipeline::new(settings)?.run(Some(&StageProgress::hidden()))?;

        assert_eq!(outcome.written.len(), 3);
        assert!(outcome.written.iter().all(|p| p.exists()));
        Ok(())
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.climate.first_year = 2025;
        settings.climate.last_year = 2020;
        assert!(Pipeline::new(settings).is_err());
    }

    #[test]
    fn test_failed_extra_output_leaves_no_summary() -> Result<()> {
        let dir = TempDir::new()?;
        let mut settings = write_inputs(dir.path());
        let occupied = dir.path().join("out").join("summary.parquet");
        fs::create_dir_all(&occupied)?;
        fs::write(occupied.join("existing"), "kept")?;
        settings.outputs.parquet = Some(occupied.clone());
        settings.outputs.dashboard = Some(dir.path().join("out").join("dashboard.html"));
        let output = settings.outputs.summary_csv.clone();
        let dashboard = dir.path().join("out").join("dashboard.html");

        let err = Pipeline::new(settings)?.run(None).unwrap_err();

        assert!(matches!(err, ProcessingError::FileAccess { .. }));
        assert!(!output.exists());
        assert!(!dashboard.exists());
        assert!(occupied.join("existing").exists());
        // No staging files linger next to the outputs either.
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path() != occupied)
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {:?}", leftovers);
        Ok(())
    }

    #[test]
    fn test_failed_run_keeps_previous_summary() -> Result<()> {
        let dir = TempDir::new()?;
        let mut settings = write_inputs(dir.path());
        let output = settings.outputs.summary_csv.clone();
        fs::create_dir_all(output.parent().unwrap())?;
        fs::write(&output, "previous run\n")?;
        settings.outputs.dashboard = Some(dir.path().join("out"));

        assert!(Pipeline::new(settings)?.run(None).is_err());
        assert_eq!(fs::read_to_string(&output)?, "previous run\n");
        Ok(())
    }

    #[test]
    fn test_passenger_overflow_fails_validation() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = write_inputs(dir.path());
        fs::write(
            &settings.inputs.passengers,
            "airport_code,nov_passengers,dec_passengers\nATL,18446744073709551615,1\n",
        )?;

        let err = Pipeline::new(settings)?.validate(None).unwrap_err();

        match err {
            ProcessingError::InvalidFormat(message) => {
                assert!(message.contains("ATL"), "{}", message);
                assert!(message.contains("line 2"), "{}", message);
            }
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
        Ok(())
    }
}

use holiday_travel_processor::analyzers::SummaryAnalyzer;
use holiday_travel_processor::config::Settings;
use holiday_travel_processor::error::ProcessingError;
use holiday_travel_processor::models::{StateSummary, US_STATES};
use holiday_travel_processor::processors::Pipeline;
use holiday_travel_processor::writers::{ParquetWriter, SummaryCsvWriter};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

/// climdiv line: state, division, element 02, year, twelve F7.2 monthly values.
fn climdiv_line(state: u16, division: u16, year: i32, nov: f64, dec: f64) -> String {
    let mut line = format!("{:03}{:02}2{:04}", state, division, year);
    for _ in 0..10 {
        line.push_str(&format!("{:7.2}", 55.0));
    }
    line.push_str(&format!("{:7.2}", nov));
    line.push_str(&format!("{:7.2}", dec));
    line
}

struct Fixture {
    dir: TempDir,
    settings: Settings,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = dir.path();

        fs::write(
            root.join("airport_states.csv"),
            "airport_code,state_code\n\
             ATL,GA\n\
             SAV,GA\n\
             ORD,IL\n\
             MIA,FL\n\
             SJU,PR\n",
        )
        .unwrap();

        fs::write(
            root.join("airport_passengers.csv"),
            "airport_code,airport_name,nov_passengers,dec_passengers\n\
             ATL,Hartsfield-Jackson,\"4,100,000\",4500000\n\
             SAV,Savannah/Hilton Head,120000,130000\n\
             ORD,O'Hare,3200000,3400000\n\
             MIA,Miami International,1800000,2100000\n\
             SJU,San Juan,400000,450000\n",
        )
        .unwrap();

        // GA has two delay rows; IL and FL none, so their rate stays null
        fs::write(
            root.join("flight_delays.csv"),
            "airport_code,delay_pct,total_flights,delayed_flights,cancelled_flights,avg_delay_minutes\n\
             ATL,10,100,10,2,40\n\
             SAV,20,300,60,5,50\n\
             SJU,30,50,15,1,35\n",
        )
        .unwrap();

        let mut climate = vec![
            "NOAA climate divisional temperatures".to_string(),
            climdiv_line(8, 0, 2019, 70.0, 99.0),
        ];
        for (year, dec) in (2020..=2024).zip([68.0, 70.0, 69.0, 71.0, 72.0]) {
            climate.push(climdiv_line(8, 0, year, 74.0, dec));
        }
        let mut malformed = climdiv_line(8, 0, 2022, 74.0, 10.0);
        malformed.replace_range(87..94, "  xx.xx");
        climate.push(malformed);
        climate.push(climdiv_line(8, 1, 2022, 74.0, 10.0));
        climate.push(climdiv_line(9, 0, 2023, 55.0, 47.5));
        climate.push(climdiv_line(11, 0, 2023, 38.0, 27.0));
        climate.push(climdiv_line(110, 0, 2023, 45.0, 33.0));
        fs::write(root.join("climdiv-tmpcst.txt"), climate.join("\n") + "\n").unwrap();

        let mut settings = Settings::default();
        settings.inputs.lookup = root.join("airport_states.csv");
        settings.inputs.passengers = root.join("airport_passengers.csv");
        settings.inputs.delays = root.join("flight_delays.csv");
        settings.inputs.climate = root.join("climdiv-tmpcst.txt");
        settings.outputs.summary_csv = root.join("out").join("combined_state_data.csv");

        Self { dir, settings }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn state<'s>(summaries: &'s [StateSummary], code: &str) -> &'s StateSummary {
    summaries
        .iter()
        .find(|s| s.state == code)
        .unwrap_or_else(|| panic!("no row for {}", code))
}

#[test]
fn test_every_state_appears_exactly_once() {
    let fixture = Fixture::new();
    let outcome = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();

    let written = SummaryCsvWriter::read_summaries(&fixture.settings.outputs.summary_csv).unwrap();
    assert_eq!(written.len(), 50);

    let codes: HashSet<&str> = written.iter().map(|s| s.state.as_str()).collect();
    let expected: HashSet<&str> = US_STATES.iter().map(|s| s.code).collect();
    assert_eq!(codes, expected);
    assert!(written.iter().all(|s| s.state != "PR"));

    assert_eq!(outcome.summaries.len(), 50);
}

#[test]
fn test_delay_rate_is_flight_weighted() {
    let fixture = Fixture::new();
    let outcome = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();

    let georgia = state(&outcome.summaries, "GA");
    let pct = georgia.avg_delay_pct.unwrap();
    assert!((pct - 17.5).abs() < 1e-9, "expected 17.5, got {}", pct);
    assert_eq!(georgia.total_flights, Some(400));
    assert_eq!(georgia.cancelled_flights, Some(7));
    // (10 * 40 + 60 * 50) / 70
    let minutes = georgia.avg_delay_minutes.unwrap();
    assert!((minutes - 3400.0 / 70.0).abs() < 1e-9);

    let csv = fs::read_to_string(&fixture.settings.outputs.summary_csv).unwrap();
    assert!(csv.contains("GA,8850000,17.50,47.50"));
}

#[test]
fn test_state_without_delays_has_null_rate() {
    let fixture = Fixture::new();
    let outcome = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();

    let illinois = state(&outcome.summaries, "IL");
    assert_eq!(illinois.avg_delay_pct, None);
    assert_eq!(illinois.holiday_travel_volume, Some(6_600_000));
    assert_eq!(illinois.avg_dec_temperature, Some(27.0));

    let wyoming = state(&outcome.summaries, "WY");
    assert!(!wyoming.has_travel_data());
    assert!(!wyoming.has_delay_data());
    assert!(!wyoming.has_temperature_data());

    let csv = fs::read_to_string(&fixture.settings.outputs.summary_csv).unwrap();
    assert!(csv.lines().any(|line| line == "IL,6600000,,27.00"));
    assert!(csv.lines().any(|line| line == "WY,,,"));
}

#[test]
fn test_temperature_mean_ignores_malformed_and_out_of_window_rows() {
    let fixture = Fixture::new();
    let outcome = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();

    let florida = state(&outcome.summaries, "FL");
    let temp = florida.avg_dec_temperature.unwrap();
    assert!((temp - 70.0).abs() < 1e-9, "expected 70.0, got {}", temp);
    assert_eq!(florida.avg_nov_temperature, Some(74.0));

    let climate_report = outcome
        .reports
        .iter()
        .find(|r| r.path == fixture.settings.inputs.climate)
        .unwrap();
    assert_eq!(climate_report.skipped_rows, 2);
    assert_eq!(climate_report.filtered_rows, 1);
}

#[test]
fn test_unmapped_airport_is_fatal_and_writes_nothing() {
    let fixture = Fixture::new();
    fs::write(
        &fixture.settings.inputs.delays,
        "airport_code,delay_pct,total_flights\n\
         ATL,10,100\n\
         XNA,12,80\n",
    )
    .unwrap();

    let err = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap_err();

    match &err {
        ProcessingError::UnmappedAirport {
            airport_code, line, ..
        } => {
            assert_eq!(airport_code, "XNA");
            assert_eq!(*line, 3);
        }
        other => panic!("expected UnmappedAirport, got {:?}", other),
    }
    assert!(err.to_string().contains("XNA"));
    assert!(!fixture.settings.outputs.summary_csv.exists());
}

#[test]
fn test_excessive_skips_are_fatal() {
    let mut fixture = Fixture::new();
    fs::write(
        &fixture.settings.inputs.passengers,
        "airport_code,nov_passengers,dec_passengers\n\
         ATL,100,200\n\
         SAV,lots,200\n\
         ORD,,\n\
         MIA,1e,5\n",
    )
    .unwrap();
    fixture.settings.validation.max_skip_ratio = 0.5;

    let err = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap_err();

    assert!(matches!(err, ProcessingError::ExcessiveSkips { skipped: 3, total: 4, .. }));
    assert!(!fixture.settings.outputs.summary_csv.exists());
}

#[test]
fn test_missing_input_names_the_path() {
    let mut fixture = Fixture::new();
    fixture.settings.inputs.climate = fixture.path("missing-climate.txt");

    let err = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap_err();

    assert!(matches!(err, ProcessingError::FileAccess { .. }));
    assert!(err.to_string().contains("missing-climate.txt"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(fixture.settings.clone()).unwrap();
    let output = &fixture.settings.outputs.summary_csv;

    pipeline.run(None).unwrap();
    let first = fs::read(output).unwrap();
    pipeline.run(None).unwrap();
    let second = fs::read(output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_settings_file_relocates_columns() {
    let mut fixture = Fixture::new();
    fs::write(
        &fixture.settings.inputs.passengers,
        "iata,november,december\nATL,1,2\nORD,3,4\n",
    )
    .unwrap();

    let settings_path = fixture.path("settings.toml");
    fs::write(
        &settings_path,
        "[passengers]\n\
         airport_column = \"iata\"\n\
         nov_column = \"november\"\n\
         dec_column = \"december\"\n\
         \n\
         [outputs]\n\
         extended_columns = true\n",
    )
    .unwrap();

    let mut settings = Settings::load(Some(&settings_path)).unwrap();
    settings.inputs = fixture.settings.inputs.clone();
    settings.outputs.summary_csv = fixture.settings.outputs.summary_csv.clone();
    fixture.settings = settings;

    let outcome = Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();
    assert_eq!(state(&outcome.summaries, "GA").holiday_travel_volume, Some(3));

    let csv = fs::read_to_string(&fixture.settings.outputs.summary_csv).unwrap();
    assert!(csv.starts_with(
        "state,holiday_travel_volume,avg_delay_pct,avg_dec_temperature,state_name,"
    ));
}

#[test]
fn test_all_outputs_and_info_statistics() {
    let mut fixture = Fixture::new();
    let parquet = fixture.path("out/summary.parquet");
    let dashboard = fixture.path("out/dashboard.html");
    fixture.settings.outputs.parquet = Some(parquet.clone());
    fixture.settings.outputs.dashboard = Some(dashboard.clone());

    Pipeline::new(fixture.settings.clone())
        .unwrap()
        .run(None)
        .unwrap();

    let info = ParquetWriter::get_file_info(&parquet).unwrap();
    assert_eq!(info.total_rows, 50);
    let from_parquet = ParquetWriter::read_summaries(&parquet).unwrap();
    let from_csv =
        SummaryCsvWriter::read_summaries(&fixture.settings.outputs.summary_csv).unwrap();
    assert_eq!(from_parquet.len(), 50);
    assert_eq!(
        from_parquet.iter().map(|s| s.holiday_travel_volume).collect::<Vec<_>>(),
        from_csv.iter().map(|s| s.holiday_travel_volume).collect::<Vec<_>>()
    );

    let html = fs::read_to_string(&dashboard).unwrap();
    assert!(html.contains("Plotly.newPlot"));

    let summaries =
        SummaryCsvWriter::read_summaries(&fixture.settings.outputs.summary_csv).unwrap();
    let stats = SummaryAnalyzer::new().analyze(&summaries);
    assert_eq!(stats.coverage.total_states, 50);
    assert_eq!(stats.busiest.unwrap().state, "GA");
    assert_eq!(stats.warmest.unwrap().state, "FL");
}

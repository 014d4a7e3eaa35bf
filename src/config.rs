//! Runtime settings.
//!
//! Settings start from built-in defaults, are overlaid with an optional TOML
//! file, and are finally adjusted by CLI flags. Column names for the CSV
//! sources and byte spans for the fixed-width climate file live here, so a
//! differently laid out input only needs a new settings file.

use crate::error::{ProcessingError, Result};
use crate::readers::ColumnSpan;
use crate::utils::constants::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub inputs: InputSettings,

    #[validate(nested)]
    pub outputs: OutputSettings,

    pub passengers: PassengerColumns,

    pub delays: DelayColumns,

    pub lookup: LookupColumns,

    #[validate(nested)]
    pub climate: ClimateSettings,

    #[validate(nested)]
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub passengers: PathBuf,
    pub delays: PathBuf,
    pub climate: PathBuf,
    pub lookup: PathBuf,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            passengers: PathBuf::from(DEFAULT_PASSENGERS_FILE),
            delays: PathBuf::from(DEFAULT_DELAYS_FILE),
            climate: PathBuf::from(DEFAULT_CLIMATE_FILE),
            lookup: PathBuf::from(DEFAULT_LOOKUP_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputSettings {
    pub summary_csv: PathBuf,

    pub parquet: Option<PathBuf>,

    pub parquet_compression: String,

    pub dashboard: Option<PathBuf>,

    #[validate(range(max = 6))]
    pub decimal_places: usize,

    /// Append the supplementary columns after the canonical four.
    pub extended_columns: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            summary_csv: PathBuf::from(DEFAULT_SUMMARY_FILE),
            parquet: None,
            parquet_compression: COMPRESSION_SNAPPY.to_string(),
            dashboard: None,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            extended_columns: false,
        }
    }
}

/// Header names in the wide passenger table: one row per airport, one column
/// per holiday month.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerColumns {
    pub airport_column: String,
    pub nov_column: String,
    pub dec_column: String,
}

impl Default for PassengerColumns {
    fn default() -> Self {
        Self {
            airport_column: "airport_code".to_string(),
            nov_column: "nov_passengers".to_string(),
            dec_column: "dec_passengers".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayColumns {
    pub airport_column: String,
    pub month_column: Option<String>,
    pub delay_pct_column: String,
    pub flights_column: String,
    pub delayed_flights_column: Option<String>,
    pub cancelled_flights_column: Option<String>,
    pub delay_minutes_column: Option<String>,
}

impl Default for DelayColumns {
    fn default() -> Self {
        Self {
            airport_column: "airport_code".to_string(),
            month_column: None,
            delay_pct_column: "delay_pct".to_string(),
            flights_column: "total_flights".to_string(),
            delayed_flights_column: Some("delayed_flights".to_string()),
            cancelled_flights_column: Some("cancelled_flights".to_string()),
            delay_minutes_column: Some("avg_delay_minutes".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupColumns {
    pub airport_column: String,
    pub state_column: String,
}

impl Default for LookupColumns {
    fn default() -> Self {
        Self {
            airport_column: "airport_code".to_string(),
            state_column: "state_code".to_string(),
        }
    }
}

/// Byte spans of the fixed-width climate record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateLayout {
    pub state: ColumnSpan,
    pub division: ColumnSpan,
    pub element: Option<ColumnSpan>,
    pub year: ColumnSpan,
    pub nov: Option<ColumnSpan>,
    pub dec: ColumnSpan,
}

impl ClimateLayout {
    fn month_span(month_index: usize) -> ColumnSpan {
        let start = CLIMATE_CODE_WIDTH + CLIMATE_VALUE_WIDTH * month_index;
        ColumnSpan::new(start, start + CLIMATE_VALUE_WIDTH)
    }

    fn spans(&self) -> Vec<(&'static str, ColumnSpan)> {
        let mut spans = vec![
            ("state", self.state),
            ("division", self.division),
            ("year", self.year),
            ("dec", self.dec),
        ];
        if let Some(element) = self.element {
            spans.push(("element", element));
        }
        if let Some(nov) = self.nov {
            spans.push(("nov", nov));
        }
        spans
    }

    /// Shortest line that can hold every required field.
    pub fn min_line_width(&self) -> usize {
        [self.state, self.division, self.year, self.dec]
            .iter()
            .map(|span| span.end)
            .max()
            .unwrap_or(0)
    }
}

impl Default for ClimateLayout {
    fn default() -> Self {
        Self {
            state: ColumnSpan::new(0, 3),
            division: ColumnSpan::new(3, 5),
            element: Some(ColumnSpan::new(5, 6)),
            year: ColumnSpan::new(6, 10),
            nov: Some(Self::month_span(10)),
            dec: Self::month_span(11),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClimateSettings {
    pub layout: ClimateLayout,

    pub statewide_division: u16,

    #[validate(range(min = 1800, max = 2200))]
    pub first_year: i32,

    #[validate(range(min = 1800, max = 2200))]
    pub last_year: i32,

    pub missing_value: f64,

    /// When set, rows whose element field differs are filtered.
    pub expected_element: Option<String>,
}

impl ClimateSettings {
    pub fn contains_year(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self {
            layout: ClimateLayout::default(),
            statewide_division: STATEWIDE_DIVISION,
            first_year: DEFAULT_FIRST_YEAR,
            last_year: DEFAULT_LAST_YEAR,
            missing_value: CLIMATE_MISSING_VALUE,
            expected_element: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ValidationSettings {
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_skip_ratio: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_skip_ratio: DEFAULT_MAX_SKIP_RATIO,
        }
    }
}

impl Settings {
    /// Load defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::file_access(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "settings file not found"),
                ));
            }
            debug!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()?;
        Ok(settings)
    }

    /// Range checks plus the cross-field rules the derive cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        for (name, span) in self.climate.layout.spans() {
            if !span.is_valid() {
                return Err(ProcessingError::Config(format!(
                    "climate span '{}' {} is empty or reversed",
                    name, span
                )));
            }
        }

        if self.climate.first_year > self.climate.last_year {
            return Err(ProcessingError::Config(format!(
                "climate year window {}..={} is reversed",
                self.climate.first_year, self.climate.last_year
            )));
        }

        let required_columns = [
            ("passengers.airport_column", &self.passengers.airport_column),
            ("passengers.nov_column", &self.passengers.nov_column),
            ("passengers.dec_column", &self.passengers.dec_column),
            ("delays.airport_column", &self.delays.airport_column),
            ("delays.delay_pct_column", &self.delays.delay_pct_column),
            ("delays.flights_column", &self.delays.flights_column),
            ("lookup.airport_column", &self.lookup.airport_column),
            ("lookup.state_column", &self.lookup.state_column),
        ];
        for (name, column) in required_columns {
            if column.trim().is_empty() {
                return Err(ProcessingError::Config(format!("{} must not be empty", name)));
            }
        }

        match self.outputs.parquet_compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY | COMPRESSION_GZIP | COMPRESSION_LZ4 | COMPRESSION_ZSTD
            | COMPRESSION_NONE => Ok(()),
            other => Err(ProcessingError::Config(format!(
                "Unsupported compression: {}",
                other
            ))),
        }
    }
}

use crate::config::ClimateSettings;
use crate::error::{ProcessingError, Result};
use crate::models::{state_by_ncei_code, ClimateRecord};
use crate::readers::{ColumnSpan, ReadOutcome, ReadReport};
use crate::utils::constants::SOURCE_CLIMATE;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

enum LineOutcome {
    Parsed(ClimateRecord),
    Filtered,
}

/// Reads the NOAA climate divisional temperature file (`climdiv-tmpcst`).
///
/// The file is fixed-width, so every field is cut out by the byte spans in
/// [`ClimateLayout`](crate::config::ClimateLayout). Only shape is checked
/// here; the statewide and year filters belong to aggregation.
pub struct ClimateReader {
    settings: ClimateSettings,
}

impl ClimateReader {
    pub fn new(settings: ClimateSettings) -> Self {
        Self { settings }
    }

    pub fn read_climate(&self, path: &Path) -> Result<ReadOutcome<ClimateRecord>> {
        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut report = ReadReport::new(SOURCE_CLIMATE, path);

        for (index, chunk) in reader.split(b'\n').enumerate() {
            let bytes = chunk.map_err(|e| ProcessingError::file_access(path, e))?;
            let line_number = index as u64 + 1;

            let line = match std::str::from_utf8(&bytes) {
                Ok(line) => line.trim_end_matches('\r'),
                Err(_) => {
                    report.record_skipped(line_number, "line is not valid UTF-8");
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match self.parse_climate_line(line) {
                Ok(LineOutcome::Parsed(record)) => {
                    records.push(record);
                    report.record_parsed();
                }
                Ok(LineOutcome::Filtered) => report.record_filtered(),
                Err(reason) => report.record_skipped(line_number, reason),
            }
        }

        Ok(ReadOutcome { records, report })
    }

    fn parse_climate_line(&self, line: &str) -> std::result::Result<LineOutcome, String> {
        let layout = &self.settings.layout;

        let width = layout.min_line_width();
        if line.len() < width {
            return Err(format!(
                "line is {} bytes, layout needs at least {}",
                line.len(),
                width
            ));
        }

        let state_code: u16 = parse_span(line, layout.state, "state")?;
        let division: u16 = parse_span(line, layout.division, "division")?;
        let year: i32 = parse_span(line, layout.year, "year")?;
        let december = parse_temperature(line, layout.dec, "dec")?;
        // An unreadable November value is dropped, December still counts.
        let november = layout.nov.and_then(|span| {
            parse_temperature(line, span, "nov")
                .map_err(|reason| debug!(state_code, year, %reason, "Ignoring November value"))
                .ok()
        });

        if let (Some(span), Some(expected)) = (layout.element, &self.settings.expected_element) {
            let element = span
                .slice(line)
                .ok_or_else(|| format!("element field {} is out of range", span))?;
            if element != expected.trim() {
                return Ok(LineOutcome::Filtered);
            }
        }

        // Regional and national aggregates (codes 101+) are not states.
        let Some(state) = state_by_ncei_code(state_code) else {
            return Ok(LineOutcome::Filtered);
        };

        if self.is_missing(december) {
            return Ok(LineOutcome::Filtered);
        }
        let november = november.filter(|t| !self.is_missing(*t));

        Ok(LineOutcome::Parsed(
            ClimateRecord::new(state.code, year, division, december).with_november(november),
        ))
    }

    fn is_missing(&self, value: f64) -> bool {
        (value - self.settings.missing_value).abs() < 1e-6
    }
}

fn parse_span<T: std::str::FromStr>(
    line: &str,
    span: ColumnSpan,
    name: &str,
) -> std::result::Result<T, String> {
    let text = span
        .slice(line)
        .ok_or_else(|| format!("{} field {} is out of range", name, span))?;
    text.parse::<T>()
        .map_err(|_| format!("non-numeric {} field {}: '{}'", name, span, text))
}

fn parse_temperature(line: &str, span: ColumnSpan, name: &str) -> std::result::Result<f64, String> {
    let value: f64 = parse_span(line, span, name)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite {} temperature", name))
    }
}

use crate::error::{ProcessingError, Result};
use crate::models::{state_by_code, StateSummary, US_STATES};
use crate::readers::csv_support::{
    column_index, open_csv, optional_column_index, parse_count, parse_number, read_headers,
};
use crate::utils::constants::{CANONICAL_COLUMNS, DEFAULT_DECIMAL_PLACES, EXTENDED_COLUMNS};
use crate::writers::staging::StagedOutput;
use csv::StringRecord;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Writes the per-state summary as delimited text, the interchange format
/// for downstream visualization.
///
/// Columns are always `state, holiday_travel_volume, avg_delay_pct,
/// avg_dec_temperature`, optionally followed by the extended columns. Floats
/// are fixed-point, nulls are empty fields.
pub struct SummaryCsvWriter {
    decimal_places: usize,
    extended_columns: bool,
}

impl SummaryCsvWriter {
    pub fn new() -> Self {
        Self {
            decimal_places: DEFAULT_DECIMAL_PLACES,
            extended_columns: false,
        }
    }

    pub fn with_decimal_places(mut self, decimal_places: usize) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    pub fn with_extended_columns(mut self, extended_columns: bool) -> Self {
        self.extended_columns = extended_columns;
        self
    }

    pub fn header(&self) -> Vec<&'static str> {
        let mut header = CANONICAL_COLUMNS.to_vec();
        if self.extended_columns {
            header.extend(EXTENDED_COLUMNS);
        }
        header
    }

    fn row(&self, summary: &StateSummary) -> Vec<String> {
        let places = self.decimal_places;
        let mut row = vec![
            summary.state.clone(),
            format_count(summary.holiday_travel_volume),
            format_fixed(summary.avg_delay_pct, places),
            format_fixed(summary.avg_dec_temperature, places),
        ];

        if self.extended_columns {
            row.extend([
                summary.state_name.clone(),
                format_count(summary.nov_passengers),
                format_count(summary.dec_passengers),
                format_count(summary.total_flights),
                format_count(summary.cancelled_flights),
                format_fixed(summary.avg_delay_minutes, places),
                format_fixed(summary.avg_nov_temperature, places),
            ]);
        }

        row
    }

    /// Serialize the table to any writer, rows ordered by state code.
    pub fn write_to<W: Write>(&self, summaries: &[StateSummary], writer: W) -> Result<()> {
        ensure_complete(summaries)?;

        let mut ordered: Vec<&StateSummary> = summaries.iter().collect();
        ordered.sort_by(|a, b| a.state.cmp(&b.state));

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;
        for summary in ordered {
            csv_writer.write_record(self.row(summary))?;
        }
        csv_writer.flush()?;

        Ok(())
    }

    /// Serialize into a temporary file beside `path`; `path` itself is
    /// untouched until the returned stage is persisted.
    pub fn stage_summaries(&self, summaries: &[StateSummary], path: &Path) -> Result<StagedOutput> {
        let mut staged = StagedOutput::create(path)?;
        self.write_to(summaries, staged.file_mut())?;
        debug!(path = %path.display(), rows = summaries.len(), "Staged summary CSV");
        Ok(staged)
    }

    /// Write to `path` through a temporary file in the same directory, so the
    /// destination only ever holds a complete table.
    pub fn write_summaries(&self, summaries: &[StateSummary], path: &Path) -> Result<()> {
        self.stage_summaries(summaries, path)?.persist()?;
        Ok(())
    }

    /// Read a summary CSV written by this writer back into memory.
    pub fn read_summaries(path: &Path) -> Result<Vec<StateSummary>> {
        let mut reader = open_csv(path)?;
        let headers = read_headers(&mut reader, "summary table")?;

        let state_idx = column_index(&headers, CANONICAL_COLUMNS[0], "summary table")?;
        let volume_idx = column_index(&headers, CANONICAL_COLUMNS[1], "summary table")?;
        let delay_idx = column_index(&headers, CANONICAL_COLUMNS[2], "summary table")?;
        let temp_idx = column_index(&headers, CANONICAL_COLUMNS[3], "summary table")?;
        let extended: Vec<Option<usize>> = EXTENDED_COLUMNS
            .into_iter()
            .map(|name| optional_column_index(&headers, Some(name)))
            .collect();

        let mut summaries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let code = record.get(state_idx).unwrap_or_default();
            let state = state_by_code(code).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!("unknown state code '{}' in summary", code))
            })?;

            let mut summary = StateSummary::empty(state);
            summary.holiday_travel_volume =
                read_count(&record, Some(volume_idx), CANONICAL_COLUMNS[1])?;
            summary.avg_delay_pct = read_number(&record, Some(delay_idx), CANONICAL_COLUMNS[2])?;
            summary.avg_dec_temperature =
                read_number(&record, Some(temp_idx), CANONICAL_COLUMNS[3])?;
            summary.nov_passengers = read_count(&record, extended[1], EXTENDED_COLUMNS[1])?;
            summary.dec_passengers = read_count(&record, extended[2], EXTENDED_COLUMNS[2])?;
            summary.total_flights = read_count(&record, extended[3], EXTENDED_COLUMNS[3])?;
            summary.cancelled_flights = read_count(&record, extended[4], EXTENDED_COLUMNS[4])?;
            summary.avg_delay_minutes =
                read_number(&record, extended[5], EXTENDED_COLUMNS[5])?;
            summary.avg_nov_temperature =
                read_number(&record, extended[6], EXTENDED_COLUMNS[6])?;
            summaries.push(summary);
        }

        Ok(summaries)
    }
}

impl Default for SummaryCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Every canonical state exactly once, nothing else.
pub fn ensure_complete(summaries: &[StateSummary]) -> Result<()> {
    let mut seen = HashSet::new();
    for summary in summaries {
        if state_by_code(&summary.state).is_none() {
            return Err(ProcessingError::MissingData(format!(
                "'{}' is not one of the 50 states",
                summary.state
            )));
        }
        if !seen.insert(summary.state.as_str()) {
            return Err(ProcessingError::MissingData(format!(
                "state {} appears more than once",
                summary.state
            )));
        }
    }

    let missing: Vec<&str> = US_STATES
        .iter()
        .map(|s| s.code)
        .filter(|code| !seen.contains(code))
        .collect();
    if !missing.is_empty() {
        return Err(ProcessingError::MissingData(format!(
            "summary lacks rows for {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Plain fixed-point text, never scientific notation. `None` is empty.
pub fn format_fixed(value: Option<f64>, decimal_places: usize) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let text = format!("{:.*}", decimal_places, v);
            // -0.00 and 0.00 are the same value downstream
            if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
                text[1..].to_string()
            } else {
                text
            }
        }
        _ => String::new(),
    }
}

fn format_count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn read_count(record: &StringRecord, index: Option<usize>, column: &str) -> Result<Option<u64>> {
    match index.and_then(|i| record.get(i)) {
        Some(value) if !value.is_empty() => parse_count(value, column)
            .map(Some)
            .map_err(ProcessingError::InvalidFormat),
        _ => Ok(None),
    }
}

fn read_number(record: &StringRecord, index: Option<usize>, column: &str) -> Result<Option<f64>> {
    match index.and_then(|i| record.get(i)) {
        Some(value) if !value.is_empty() => parse_number(value, column)
            .map(Some)
            .map_err(ProcessingError::InvalidFormat),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn full_table() -> Vec<StateSummary> {
        US_STATES.iter().map(StateSummary::empty).collect()
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(Some(17.5), 2), "17.50");
        assert_eq!(format_fixed(Some(1.0e-7), 2), "0.00");
        assert_eq!(format_fixed(Some(-1.0e-7), 2), "0.00");
        assert_eq!(format_fixed(Some(-3.456), 1), "-3.5");
        assert_eq!(format_fixed(Some(12345678901.0), 2), "12345678901.00");
        assert_eq!(format_fixed(None, 2), "");
        assert_eq!(format_fixed(Some(f64::NAN), 2), "");
    }

    #[test]
    fn test_write_canonical_columns() -> Result<()> {
        let mut table = full_table();
        table.reverse();
        let georgia = table.iter_mut().find(|s| s.state == "GA").unwrap();
        georgia.holiday_travel_volume = Some(9_500_000);
        georgia.avg_delay_pct = Some(17.5);
        georgia.avg_dec_temperature = Some(49.123);

        let mut buffer = Vec::new();
        SummaryCsvWriter::new().write_to(&table, &mut buffer)?;
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 51);
        assert_eq!(
            lines[0],
            "state,holiday_travel_volume,avg_delay_pct,avg_dec_temperature"
        );
        assert_eq!(lines[1], "AK,,,");
        assert!(lines.contains(&"GA,9500000,17.50,49.12"));
        assert!(
            lines[1..].iter().all(|line| !line.contains('e')),
            "no scientific notation expected"
        );
        Ok(())
    }

    #[test]
    fn test_extended_columns_follow_canonical_ones() -> Result<()> {
        let mut table = full_table();
        table[0].nov_passengers = Some(1);
        table[0].dec_passengers = Some(2);
        table[0].holiday_travel_volume = Some(3);

        let mut buffer = Vec::new();
        SummaryCsvWriter::new()
            .with_extended_columns(true)
            .with_decimal_places(1)
            .write_to(&table, &mut buffer)?;
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "state,holiday_travel_volume,avg_delay_pct,avg_dec_temperature,state_name,\
             nov_passengers,dec_passengers,total_flights,cancelled_flights,\
             avg_delay_minutes,avg_nov_temperature"
        );
        assert_eq!(lines.next().unwrap(), "AK,3,,,Alaska,1,2,,,,");
        Ok(())
    }

    #[test]
    fn test_incomplete_table_is_rejected() {
        let mut table = full_table();
        table.pop();
        let err = SummaryCsvWriter::new().write_to(&table, Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("WY"));

        let mut table = full_table();
        table.push(table[0].clone());
        assert!(SummaryCsvWriter::new().write_to(&table, Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("combined_state_data.csv");

        let mut table = full_table();
        table[4].avg_delay_pct = Some(21.25);
        table[4].avg_nov_temperature = Some(55.5);

        let writer = SummaryCsvWriter::new().with_extended_columns(true);
        writer.write_summaries(&table, &path)?;
        let read_back = SummaryCsvWriter::read_summaries(&path)?;

        assert_eq!(read_back, table);
        Ok(())
    }
}

use crate::config::DelayColumns;
use crate::error::Result;
use crate::models::{DelayRecord, Month};
use crate::readers::csv_support::{
    column_index, field, open_csv, optional_column_index, optional_count, optional_number,
    parse_count, parse_number, read_headers, record_line,
};
use crate::readers::lookup_reader::normalize_airport_code;
use crate::readers::{ReadOutcome, ReadReport};
use crate::utils::constants::SOURCE_DELAYS;
use csv::StringRecord;
use std::path::Path;
use validator::Validate;

enum RowOutcome {
    Parsed(DelayRecord),
    OutsideWindow,
}

struct ColumnIndexes {
    airport: usize,
    month: Option<usize>,
    delay_pct: usize,
    flights: usize,
    delayed: Option<usize>,
    cancelled: Option<usize>,
    minutes: Option<usize>,
}

/// Reads per-airport on-time statistics.
pub struct DelayReader {
    columns: DelayColumns,
}

impl DelayReader {
    pub fn new(columns: DelayColumns) -> Self {
        Self { columns }
    }

    pub fn read_delays(&self, path: &Path) -> Result<ReadOutcome<DelayRecord>> {
        let mut reader = open_csv(path)?;
        let headers = read_headers(&mut reader, SOURCE_DELAYS)?;

        let month = match &self.columns.month_column {
            Some(name) => Some(column_index(&headers, name, SOURCE_DELAYS)?),
            None => None,
        };
        let indexes = ColumnIndexes {
            airport: column_index(&headers, &self.columns.airport_column, SOURCE_DELAYS)?,
            month,
            delay_pct: column_index(&headers, &self.columns.delay_pct_column, SOURCE_DELAYS)?,
            flights: column_index(&headers, &self.columns.flights_column, SOURCE_DELAYS)?,
            delayed: optional_column_index(
                &headers,
                self.columns.delayed_flights_column.as_deref(),
            ),
            cancelled: optional_column_index(
                &headers,
                self.columns.cancelled_flights_column.as_deref(),
            ),
            minutes: optional_column_index(&headers, self.columns.delay_minutes_column.as_deref()),
        };

        let mut records = Vec::new();
        let mut report = ReadReport::new(SOURCE_DELAYS, path);

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    report.record_skipped(line, e.to_string());
                    continue;
                }
            };
            let line = record_line(&record);

            match self.parse_row(&record, &indexes, line) {
                Ok(RowOutcome::Parsed(delay)) => {
                    records.push(delay);
                    report.record_parsed();
                }
                Ok(RowOutcome::OutsideWindow) => report.record_filtered(),
                Err(reason) => report.record_skipped(line, reason),
            }
        }

        Ok(ReadOutcome { records, report })
    }

    fn parse_row(
        &self,
        record: &StringRecord,
        indexes: &ColumnIndexes,
        line: u64,
    ) -> std::result::Result<RowOutcome, String> {
        let columns = &self.columns;
        let airport = field(record, indexes.airport, &columns.airport_column)?;

        let month = match (indexes.month, columns.month_column.as_deref()) {
            (Some(idx), Some(column)) => {
                let label = field(record, idx, column)?;
                if is_calendar_month(label) {
                    match Month::from_label(label) {
                        Some(month) => Some(month),
                        None => return Ok(RowOutcome::OutsideWindow),
                    }
                } else {
                    return Err(format!("invalid month for '{}': '{}'", column, label));
                }
            }
            _ => None,
        };

        let delay_pct = parse_number(
            field(record, indexes.delay_pct, &columns.delay_pct_column)?,
            &columns.delay_pct_column,
        )?;
        let flights = parse_count(
            field(record, indexes.flights, &columns.flights_column)?,
            &columns.flights_column,
        )?;
        let delayed = optional_count(
            record,
            indexes.delayed,
            columns.delayed_flights_column.as_deref(),
        )?;
        let cancelled = optional_count(
            record,
            indexes.cancelled,
            columns.cancelled_flights_column.as_deref(),
        )?;
        let minutes = optional_number(
            record,
            indexes.minutes,
            columns.delay_minutes_column.as_deref(),
        )?;

        let mut delay = DelayRecord::new(normalize_airport_code(airport), delay_pct, flights)
            .with_delay_detail(delayed, cancelled, minutes)
            .at_line(line);
        if let Some(month) = month {
            delay = delay.with_month(month);
        }

        delay
            .validate()
            .map_err(|e| format!("out-of-range value: {}", e))?;

        Ok(RowOutcome::Parsed(delay))
    }
}

/// A month label that names any calendar month, holiday or not.
fn is_calendar_month(label: &str) -> bool {
    let label = label.trim();
    match label.parse::<u8>() {
        Ok(number) => chrono::Month::try_from(number).is_ok(),
        Err(_) => label.parse::<chrono::Month>().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn monthly_columns() -> DelayColumns {
        DelayColumns {
            month_column: Some("month".to_string()),
            ..DelayColumns::default()
        }
    }

    #[test]
    fn test_read_delay_table() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "airport_code,delay_pct,total_flights,delayed_flights,cancelled_flights,avg_delay_minutes"
        )?;
        writeln!(file, "ATL,21.5,40000,8600,320,48.2")?;
        writeln!(file, "sea,18.0,20000,,,")?;

        let outcome = DelayReader::new(DelayColumns::default()).read_delays(file.path())?;

        assert_eq!(outcome.records.len(), 2);
        let atl = &outcome.records[0];
        assert_eq!(atl.airport_code, "ATL");
        assert_eq!(atl.delay_pct, 21.5);
        assert_eq!(atl.flight_count, 40000);
        assert_eq!(atl.delayed_flights, Some(8600));
        assert_eq!(atl.cancelled_flights, Some(320));
        assert_eq!(atl.avg_delay_minutes, Some(48.2));
        assert_eq!(atl.month, None);

        let sea = &outcome.records[1];
        assert_eq!(sea.airport_code, "SEA");
        assert_eq!(sea.delayed_flights, None);
        assert_eq!(sea.avg_delay_minutes, None);
        Ok(())
    }

    #[test]
    fn test_optional_columns_may_be_absent() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "airport_code,delay_pct,total_flights")?;
        writeln!(file, "BOS,12.0,100")?;

        let outcome = DelayReader::new(DelayColumns::default()).read_delays(file.path())?;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].cancelled_flights, None);
        Ok(())
    }

    #[test]
    fn test_month_column_filters_non_holiday_months() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "airport_code,month,delay_pct,total_flights")?;
        writeln!(file, "ATL,Nov,10,100")?;
        writeln!(file, "ATL,Dec,20,300")?;
        writeln!(file, "ATL,Jul,35,500")?;
        writeln!(file, "ATL,Smarch,35,500")?;

        let outcome = DelayReader::new(monthly_columns()).read_delays(file.path())?;

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].month, Some(Month::Nov));
        assert_eq!(outcome.records[1].month, Some(Month::Dec));
        assert_eq!(outcome.report.filtered_rows, 1);
        assert_eq!(outcome.report.skipped_rows, 1);
        Ok(())
    }

    #[test]
    fn test_out_of_range_delay_is_skipped() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "airport_code,delay_pct,total_flights")?;
        writeln!(file, "ATL,150,100")?;
        writeln!(file, "ORD,n/a,100")?;
        writeln!(file, "DEN,15,200")?;

        let outcome = DelayReader::new(DelayColumns::default()).read_delays(file.path())?;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].airport_code, "DEN");
        assert_eq!(outcome.report.skipped_rows, 2);
        assert!(outcome.report.skip_samples[0].reason.contains("out-of-range"));
        Ok(())
    }
}

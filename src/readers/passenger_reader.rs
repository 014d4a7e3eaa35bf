use crate::config::PassengerColumns;
use crate::error::Result;
use crate::models::{AirportRecord, Month};
use crate::readers::csv_support::{
    column_index, field, open_csv, parse_count, read_headers, record_line,
};
use crate::readers::lookup_reader::normalize_airport_code;
use crate::readers::{ReadOutcome, ReadReport};
use crate::utils::constants::SOURCE_PASSENGERS;
use std::path::Path;

/// Reads the wide airport passenger table. Every row expands into one
/// [`AirportRecord`] per holiday month.
pub struct PassengerReader {
    columns: PassengerColumns,
}

impl PassengerReader {
    pub fn new(columns: PassengerColumns) -> Self {
        Self { columns }
    }

    pub fn read_passengers(&self, path: &Path) -> Result<ReadOutcome<AirportRecord>> {
        let mut reader = open_csv(path)?;
        let headers = read_headers(&mut reader, SOURCE_PASSENGERS)?;
        let airport_idx =
            column_index(&headers, &self.columns.airport_column, SOURCE_PASSENGERS)?;
        let month_columns = [
            (
                Month::Nov,
                column_index(&headers, &self.columns.nov_column, SOURCE_PASSENGERS)?,
                self.columns.nov_column.as_str(),
            ),
            (
                Month::Dec,
                column_index(&headers, &self.columns.dec_column, SOURCE_PASSENGERS)?,
                self.columns.dec_column.as_str(),
            ),
        ];

        let mut records = Vec::new();
        let mut report = ReadReport::new(SOURCE_PASSENGERS, path);

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

            let parsed = field(&record, airport_idx, &self.columns.airport_column).and_then(
                |airport| {
                    let airport = normalize_airport_code(airport);
                    month_columns
                        .iter()
                        .map(|(month, idx, column)| -> std::result::Result<_, String> {
                            let count = parse_count(field(&record, *idx, column)?, column)?;
                            Ok(AirportRecord::new(airport.clone(), *month, count).at_line(line))
                        })
                        .collect::<std::result::Result<Vec<_>, String>>()
                },
            );

            match parsed {
                Ok(monthly) => {
                    records.extend(monthly);
                    report.record_parsed();
                }
                Err(reason) => report.record_skipped(line, reason),
            }
        }

        Ok(ReadOutcome { records, report })
    }
}

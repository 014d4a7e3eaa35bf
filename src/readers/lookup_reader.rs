use crate::config::LookupColumns;
use crate::error::{ProcessingError, Result};
use crate::models::normalize_state_code;
use crate::readers::csv_support::{column_index, field, open_csv, read_headers, record_line};
use crate::readers::ReadReport;
use crate::utils::constants::SOURCE_LOOKUP;
use std::collections::BTreeMap;
use std::path::Path;

/// Static airport code to state code mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirportLookup {
    states: BTreeMap<String, String>,
}

impl AirportLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping. Re-adding the same pair is a no-op; mapping an airport
    /// to a second state is an error.
    pub fn insert(&mut self, airport_code: &str, state_code: &str) -> Result<()> {
        let airport = normalize_airport_code(airport_code);
        match self.states.get(&airport) {
            Some(existing) if existing != state_code => Err(ProcessingError::InvalidFormat(
                format!(
                    "airport '{}' is mapped to both {} and {}",
                    airport, existing, state_code
                ),
            )),
            Some(_) => Ok(()),
            None => {
                self.states.insert(airport, state_code.to_string());
                Ok(())
            }
        }
    }

    pub fn state_for(&self, airport_code: &str) -> Option<&str> {
        self.states
            .get(&normalize_airport_code(airport_code))
            .map(String::as_str)
    }

    /// Like [`state_for`](Self::state_for) but an unknown airport is fatal,
    /// identifying the source and line that referenced it.
    pub fn resolve(&self, airport_code: &str, source_name: &str, line: u64) -> Result<&str> {
        self.state_for(airport_code)
            .ok_or_else(|| ProcessingError::UnmappedAirport {
                airport_code: airport_code.to_string(),
                source_name: source_name.to_string(),
                line,
            })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl FromIterator<(String, String)> for AirportLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let states = iter
            .into_iter()
            .map(|(airport, state)| (normalize_airport_code(&airport), state))
            .collect();
        Self { states }
    }
}

pub fn normalize_airport_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub struct LookupReader {
    columns: LookupColumns,
}

impl LookupReader {
    pub fn new(columns: LookupColumns) -> Self {
        Self { columns }
    }

    pub fn read_lookup(&self, path: &Path) -> Result<(AirportLookup, ReadReport)> {
        let mut reader = open_csv(path)?;
        let headers = read_headers(&mut reader, SOURCE_LOOKUP)?;
        let airport_idx = column_index(&headers, &self.columns.airport_column, SOURCE_LOOKUP)?;
        let state_idx = column_index(&headers, &self.columns.state_column, SOURCE_LOOKUP)?;

        let mut lookup = AirportLookup::new();
        let mut report = ReadReport::new(SOURCE_LOOKUP, path);

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
                    let raw_state = field(&record, state_idx, &self.columns.state_column)?;
                    let state = normalize_state_code(raw_state)
                        .ok_or_else(|| format!("invalid state code '{}'", raw_state))?;
                    Ok((airport, state))
                },
            );

            match parsed {
                Ok((airport, state)) => {
                    lookup.insert(airport, &state)?;
                    report.record_parsed();
                }
                Err(reason) => report.record_skipped(line, reason),
            }
        }

        Ok((lookup, report))
    }
}

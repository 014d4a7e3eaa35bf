use crate::error::{ProcessingError, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;

/// Open a headed CSV source. Rows may vary in length; short rows are caught
/// field by field rather than by the csv crate.
pub fn open_csv(path: &Path) -> Result<Reader<File>> {
    let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(file))
}

pub fn read_headers(reader: &mut Reader<File>, source_name: &str) -> Result<StringRecord> {
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(ProcessingError::InvalidFormat(format!(
            "{} has no header row",
            source_name
        )));
    }
    Ok(headers)
}

/// Position of a required column. A missing header means the whole file has
/// the wrong shape, so this is fatal rather than a per-row skip.
pub fn column_index(headers: &StringRecord, name: &str, source_name: &str) -> Result<usize> {
    optional_column_index(headers, Some(name)).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!(
            "{} is missing required column '{}' (found: {})",
            source_name,
            name,
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })
}

pub fn optional_column_index(headers: &StringRecord, name: Option<&str>) -> Option<usize> {
    let name = name?.trim();
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

pub fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

pub fn field<'a>(
    record: &'a StringRecord,
    index: usize,
    column: &str,
) -> std::result::Result<&'a str, String> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("missing value for '{}'", column)),
    }
}

/// Non-negative integer count; thousands separators are tolerated.
pub fn parse_count(value: &str, column: &str) -> std::result::Result<u64, String> {
    let cleaned: String = value.chars().filter(|c| *c != ',' && *c != '_').collect();
    cleaned
        .parse::<u64>()
        .map_err(|_| format!("invalid count for '{}': '{}'", column, value))
}

pub fn parse_number(value: &str, column: &str) -> std::result::Result<f64, String> {
    let cleaned = value.trim_end_matches('%');
    match cleaned.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(format!("invalid number for '{}': '{}'", column, value)),
    }
}

/// Optional column: absent or blank cells are `None`, bad values are errors.
pub fn optional_count(
    record: &StringRecord,
    index: Option<usize>,
    column: Option<&str>,
) -> std::result::Result<Option<u64>, String> {
    match (index.and_then(|i| record.get(i)), column) {
        (Some(value), Some(column)) if !value.is_empty() => parse_count(value, column).map(Some),
        _ => Ok(None),
    }
}

pub fn optional_number(
    record: &StringRecord,
    index: Option<usize>,
    column: Option<&str>,
) -> std::result::Result<Option<f64>, String> {
    match (index.and_then(|i| record.get(i)), column) {
        (Some(value), Some(column)) if !value.is_empty() => parse_number(value, column).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234,567", "n"), Ok(1_234_567));
        assert_eq!(parse_count("42", "n"), Ok(42));
        assert!(parse_count("-5", "n").is_err());
        assert!(parse_count("12.5", "n").is_err());
        assert!(parse_count("lots", "n").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("17.5", "x"), Ok(17.5));
        assert_eq!(parse_number("17.5%", "x"), Ok(17.5));
        assert!(parse_number("NaN", "x").is_err());
        assert!(parse_number("abc", "x").is_err());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let headers = StringRecord::from(vec!["Airport_Code", "delay_pct"]);
        assert_eq!(column_index(&headers, "airport_code", "test").unwrap(), 0);
        assert_eq!(optional_column_index(&headers, Some("DELAY_PCT")), Some(1));
        assert_eq!(optional_column_index(&headers, None), None);
        assert!(column_index(&headers, "total_flights", "test").is_err());
    }

    #[test]
    fn test_field_rejects_blank_cells() {
        let record = StringRecord::from(vec!["ATL", ""]);
        assert_eq!(field(&record, 0, "a"), Ok("ATL"));
        assert!(field(&record, 1, "b").is_err());
        assert!(field(&record, 2, "c").is_err());
    }
}

use crate::error::{ProcessingError, Result};
use crate::utils::constants::MAX_SKIP_SAMPLES;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parsed rows of one source together with its audit trail.
#[derive(Debug, Clone)]
pub struct ReadOutcome<T> {
    pub records: Vec<T>,
    pub report: ReadReport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// Row accounting for one source file.
///
/// `skipped_rows` are malformed rows. `filtered_rows` are well-formed rows
/// that fall outside what the pipeline consumes (other months, regional
/// climate aggregates, missing-value sentinels).
#[derive(Debug, Clone, PartialEq)]
pub struct ReadReport {
    pub source_name: String,
    pub path: PathBuf,
    pub total_rows: usize,
    pub parsed_rows: usize,
    pub skipped_rows: usize,
    pub filtered_rows: usize,
    pub skip_samples: Vec<SkippedRow>,
}

impl ReadReport {
    pub fn new(source_name: &str, path: &Path) -> Self {
        Self {
            source_name: source_name.to_string(),
            path: path.to_path_buf(),
            total_rows: 0,
            parsed_rows: 0,
            skipped_rows: 0,
            filtered_rows: 0,
            skip_samples: Vec::new(),
        }
    }

    pub fn record_parsed(&mut self) {
        self.total_rows += 1;
        self.parsed_rows += 1;
    }

    pub fn record_filtered(&mut self) {
        self.total_rows += 1;
        self.filtered_rows += 1;
    }

    pub fn record_skipped(&mut self, line: u64, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(source = %self.source_name, line, %reason, "Skipping malformed row");

        self.total_rows += 1;
        self.skipped_rows += 1;
        if self.skip_samples.len() < MAX_SKIP_SAMPLES {
            self.skip_samples.push(SkippedRow { line, reason });
        }
    }

    pub fn skip_ratio(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.skipped_rows as f64 / self.total_rows as f64
        }
    }

    /// Reject a source that produced nothing usable or whose malformed share
    /// exceeds `max_ratio`. A truncating parser bug looks like either.
    pub fn ensure_plausible(&self, max_ratio: f64) -> Result<()> {
        if self.parsed_rows == 0 {
            return Err(ProcessingError::EmptySource {
                source_name: self.source_name.clone(),
                path: self.path.clone(),
            });
        }

        if self.skip_ratio() > max_ratio {
            return Err(ProcessingError::ExcessiveSkips {
                source_name: self.source_name.clone(),
                skipped: self.skipped_rows,
                total: self.total_rows,
                max_ratio,
            });
        }

        Ok(())
    }

    pub fn log(&self) {
        info!(
            source = %self.source_name,
            path = %self.path.display(),
            total = self.total_rows,
            parsed = self.parsed_rows,
            filtered = self.filtered_rows,
            skipped = self.skipped_rows,
            "Loaded source"
        );
        if self.skipped_rows > 0 {
            warn!(
                source = %self.source_name,
                skipped = self.skipped_rows,
                "Skipped {} malformed rows ({:.1}%)",
                self.skipped_rows,
                100.0 * self.skip_ratio()
            );
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{:<34} {:>7} rows, {:>7} parsed, {:>6} filtered, {:>5} skipped",
            self.source_name,
            self.total_rows,
            self.parsed_rows,
            self.filtered_rows,
            self.skipped_rows
        )
    }
}

/// Render several reports as the load-phase summary block.
pub fn generate_load_summary(reports: &[&ReadReport]) -> String {
    let mut summary = String::new();

    summary.push_str("=== Load Report ===\n");
    for report in reports {
        summary.push_str(&report.summary_line());
        summary.push('\n');
    }

    let skipped: usize = reports.iter().map(|r| r.skipped_rows).sum();
    summary.push_str(&format!("Malformed rows skipped: {}\n", skipped));

    let samples: Vec<_> = reports
        .iter()
        .flat_map(|r| r.skip_samples.iter().map(move |s| (r.source_name.as_str(), s)))
        .take(MAX_SKIP_SAMPLES)
        .collect();
    if !samples.is_empty() {
        summary.push_str("\nFirst skipped rows:\n");
        for (i, (source, sample)) in samples.iter().enumerate() {
            summary.push_str(&format!(
                "  {}. {} line {}: {}\n",
                i + 1,
                source,
                sample.line,
                sample.reason
            ));
        }
    }

    summary
}

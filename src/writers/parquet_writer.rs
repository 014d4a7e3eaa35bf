use crate::error::{ProcessingError, Result};
use crate::models::{state_by_code, StateSummary};
use crate::writers::csv_writer::ensure_complete;
use crate::writers::staging::StagedOutput;
use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, Float64Array, PrimitiveArray, StringArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Columnar copy of the summary table. Metric columns are nullable so a
/// missing source stays null rather than zero.
pub struct ParquetWriter {
    compression: Compression,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new("state", DataType::Utf8, false),
            Field::new("state_name", DataType::Utf8, false),
            Field::new("holiday_travel_volume", DataType::UInt64, true),
            Field::new("avg_delay_pct", DataType::Float64, true),
            Field::new("avg_dec_temperature", DataType::Float64, true),
            Field::new("nov_passengers", DataType::UInt64, true),
            Field::new("dec_passengers", DataType::UInt64, true),
            Field::new("total_flights", DataType::UInt64, true),
            Field::new("cancelled_flights", DataType::UInt64, true),
            Field::new("avg_delay_minutes", DataType::Float64, true),
            Field::new("avg_nov_temperature", DataType::Float64, true),
        ];

        Arc::new(Schema::new(fields))
    }

    fn summaries_to_batch(
        &self,
        summaries: &[StateSummary],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let counts = |f: fn(&StateSummary) -> Option<u64>| -> ArrayRef {
            Arc::new(summaries.iter().map(f).collect::<UInt64Array>())
        };
        let floats = |f: fn(&StateSummary) -> Option<f64>| -> ArrayRef {
            Arc::new(summaries.iter().map(f).collect::<Float64Array>())
        };

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                summaries.iter().map(|s| s.state.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                summaries.iter().map(|s| s.state_name.as_str()),
            )),
            counts(|s| s.holiday_travel_volume),
            floats(|s| s.avg_delay_pct),
            floats(|s| s.avg_dec_temperature),
            counts(|s| s.nov_passengers),
            counts(|s| s.dec_passengers),
            counts(|s| s.total_flights),
            counts(|s| s.cancelled_flights),
            floats(|s| s.avg_delay_minutes),
            floats(|s| s.avg_nov_temperature),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }

    /// Encode all 50 rows as a single row group into a temporary file beside
    /// `path`.
    pub fn stage_summaries(&self, summaries: &[StateSummary], path: &Path) -> Result<StagedOutput> {
        ensure_complete(summaries)?;

        let mut ordered = summaries.to_vec();
        ordered.sort_by(|a, b| a.state.cmp(&b.state));

        let schema = self.create_schema();
        let batch = self.summaries_to_batch(&ordered, schema.clone())?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();

        let mut staged = StagedOutput::create(path)?;
        let mut writer = ArrowWriter::try_new(staged.file_mut(), schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        debug!(path = %path.display(), compression = ?self.compression, "Staged summary Parquet");
        Ok(staged)
    }

    pub fn write_summaries(&self, summaries: &[StateSummary], path: &Path) -> Result<()> {
        self.stage_summaries(summaries, path)?.persist()?;
        Ok(())
    }

    /// Read a Parquet summary written by this writer back into memory.
    pub fn read_summaries(path: &Path) -> Result<Vec<StateSummary>> {
        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut summaries = Vec::new();
        for batch in reader {
            let batch = batch?;
            let states = string_column(&batch, "state")?;
            let volume = count_column(&batch, "holiday_travel_volume")?;
            let delay = float_column(&batch, "avg_delay_pct")?;
            let dec_temp = float_column(&batch, "avg_dec_temperature")?;
            let nov_passengers = count_column(&batch, "nov_passengers")?;
            let dec_passengers = count_column(&batch, "dec_passengers")?;
            let flights = count_column(&batch, "total_flights")?;
            let cancelled = count_column(&batch, "cancelled_flights")?;
            let minutes = float_column(&batch, "avg_delay_minutes")?;
            let nov_temp = float_column(&batch, "avg_nov_temperature")?;

            for row in 0..batch.num_rows() {
                let code = states.value(row);
                let state = state_by_code(code).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "unknown state code '{}' in summary",
                        code
                    ))
                })?;

                let mut summary = StateSummary::empty(state);
                summary.holiday_travel_volume = nullable(volume, row);
                summary.avg_delay_pct = nullable(delay, row);
                summary.avg_dec_temperature = nullable(dec_temp, row);
                summary.nov_passengers = nullable(nov_passengers, row);
                summary.dec_passengers = nullable(dec_passengers, row);
                summary.total_flights = nullable(flights, row);
                summary.cancelled_flights = nullable(cancelled, row);
                summary.avg_delay_minutes = nullable(minutes, row);
                summary.avg_nov_temperature = nullable(nov_temp, row);
                summaries.push(summary);
            }
        }

        Ok(summaries)
    }

    pub fn get_file_info(path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path).map_err(|e| ProcessingError::file_access(path, e))?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let columns = metadata
            .file_metadata()
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: metadata.num_row_groups(),
            columns,
            file_size: std::fs::metadata(path)?.len(),
            compression: metadata
                .row_groups()
                .first()
                .and_then(|group| group.columns().first())
                .map(|chunk| chunk.compression()),
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn column<'b, A: Array + 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| {
            ProcessingError::InvalidFormat(format!(
                "summary Parquet lacks a usable '{}' column",
                name
            ))
        })
}

fn string_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
    column(batch, name)
}

fn count_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b UInt64Array> {
    column(batch, name)
}

fn float_column<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b Float64Array> {
    column(batch, name)
}

fn nullable<T: ArrowPrimitiveType>(array: &PrimitiveArray<T>, row: usize) -> Option<T::Native> {
    (!array.is_null(row)).then(|| array.value(row))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub columns: Vec<String>,
    pub file_size: u64,
    /// Codec of the first column chunk; `None` for a file without rows.
    pub compression: Option<Compression>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - Columns: {}\n\
            - File size: {:.1} KB\n\
            - Compression: {}",
            self.total_rows,
            self.row_groups,
            self.columns.join(", "),
            self.file_size as f64 / 1024.0,
            self.compression
                .map_or_else(|| "n/a".to_string(), |c| format!("{:?}", c)),
        )
    }
}

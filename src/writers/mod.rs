pub mod csv_writer;
pub mod dashboard_writer;
pub mod parquet_writer;
pub mod staging;

pub use csv_writer::{format_fixed, SummaryCsvWriter};
pub use dashboard_writer::DashboardWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use staging::{persist_all, StagedOutput};

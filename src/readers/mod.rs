pub mod climate_reader;
pub mod csv_support;
pub mod delay_reader;
pub mod fixed_width;
pub mod lookup_reader;
pub mod passenger_reader;
pub mod read_report;

pub use climate_reader::ClimateReader;
pub use delay_reader::DelayReader;
pub use fixed_width::ColumnSpan;
pub use lookup_reader::{AirportLookup, LookupReader};
pub use passenger_reader::PassengerReader;
pub use read_report::{generate_load_summary, ReadOutcome, ReadReport, SkippedRow};

/// Source names used in reports and error messages
pub const SOURCE_PASSENGERS: &str = "airport passengers";
pub const SOURCE_DELAYS: &str = "flight delays";
pub const SOURCE_CLIMATE: &str = "climate divisional temperatures";
pub const SOURCE_LOOKUP: &str = "airport-to-state lookup";

/// Default input and output paths
pub const DEFAULT_PASSENGERS_FILE: &str = "data/airport_passengers.csv";
pub const DEFAULT_DELAYS_FILE: &str = "data/flight_delays.csv";
pub const DEFAULT_CLIMATE_FILE: &str = "data/climdiv-tmpcst.txt";
pub const DEFAULT_LOOKUP_FILE: &str = "data/airport_states.csv";
pub const DEFAULT_SUMMARY_FILE: &str = "data/combined_state_data.csv";

/// Climate window: statewide December averages over 2020-2024
pub const STATEWIDE_DIVISION: u16 = 0;
pub const DEFAULT_FIRST_YEAR: i32 = 2020;
pub const DEFAULT_LAST_YEAR: i32 = 2024;
pub const CLIMATE_MISSING_VALUE: f64 = -99.99;

/// NOAA climdiv layout: SSS DD E YYYY then twelve F7.2 monthly values
pub const CLIMATE_CODE_WIDTH: usize = 10;
pub const CLIMATE_VALUE_WIDTH: usize = 7;

/// Output formatting
pub const DEFAULT_DECIMAL_PLACES: usize = 2;
pub const CANONICAL_COLUMNS: [&str; 4] = [
    "state",
    "holiday_travel_volume",
    "avg_delay_pct",
    "avg_dec_temperature",
];
pub const EXTENDED_COLUMNS: [&str; 7] = [
    "state_name",
    "nov_passengers",
    "dec_passengers",
    "total_flights",
    "cancelled_flights",
    "avg_delay_minutes",
    "avg_nov_temperature",
];

/// Fraction of malformed rows above which a source is rejected
pub const DEFAULT_MAX_SKIP_RATIO: f64 = 0.5;

/// Skipped rows kept verbatim in a read report
pub const MAX_SKIP_SAMPLES: usize = 10;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Holiday travel months covered by the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Nov,
    Dec,
}

impl Month {
    /// Parses month labels such as `Nov`, `december` or `12`. Any month
    /// outside the holiday window yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let month = match label.parse::<u32>() {
            Ok(number) => chrono::Month::try_from(u8::try_from(number).ok()?).ok()?,
            Err(_) => chrono::Month::from_str(label).ok()?,
        };

        match month {
            chrono::Month::November => Some(Month::Nov),
            chrono::Month::December => Some(Month::Dec),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Passengers through one airport in one holiday month. The state is not
/// stored here: the airport-to-state lookup is the single authority for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub airport_code: String,
    pub month: Month,
    pub passenger_count: u64,
    #[serde(skip)]
    pub line: u64,
}

impl AirportRecord {
    pub fn new(airport_code: impl Into<String>, month: Month, passenger_count: u64) -> Self {
        Self {
            airport_code: airport_code.into(),
            month,
            passenger_count,
            line: 0,
        }
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = line;
        self
    }
}

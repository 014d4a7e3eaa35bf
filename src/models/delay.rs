use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Month;

/// On-time statistics for one airport. `flight_count` is the weight used when
/// averaging `delay_pct` across a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DelayRecord {
    #[validate(length(min = 1))]
    pub airport_code: String,

    /// `None` when the source table does not break statistics out by month.
    pub month: Option<Month>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub delay_pct: f64,

    pub flight_count: u64,

    pub delayed_flights: Option<u64>,

    pub cancelled_flights: Option<u64>,

    #[validate(range(min = 0.0))]
    pub avg_delay_minutes: Option<f64>,

    #[serde(skip)]
    pub line: u64,
}

impl DelayRecord {
    pub fn new(airport_code: impl Into<String>, delay_pct: f64, flight_count: u64) -> Self {
        Self {
            airport_code: airport_code.into(),
            month: None,
            delay_pct,
            flight_count,
            delayed_flights: None,
            cancelled_flights: None,
            avg_delay_minutes: None,
            line: 0,
        }
    }

    pub fn with_month(mut self, month: Month) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_delay_detail(
        mut self,
        delayed_flights: Option<u64>,
        cancelled_flights: Option<u64>,
        avg_delay_minutes: Option<f64>,
    ) -> Self {
        self.delayed_flights = delayed_flights;
        self.cancelled_flights = cancelled_flights;
        self.avg_delay_minutes = avg_delay_minutes;
        self
    }

    pub fn at_line(mut self, line: u64) -> Self {
        self.line = line;
        self
    }
}

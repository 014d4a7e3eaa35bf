use serde::{Deserialize, Serialize};

use crate::models::UsState;

/// One output row: a state with whichever metrics its sources provided.
/// Missing metrics stay `None`; they are never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    pub state: String,
    pub state_name: String,
    pub holiday_travel_volume: Option<u64>,
    pub avg_delay_pct: Option<f64>,
    pub avg_dec_temperature: Option<f64>,

    pub nov_passengers: Option<u64>,
    pub dec_passengers: Option<u64>,
    pub total_flights: Option<u64>,
    pub cancelled_flights: Option<u64>,
    pub avg_delay_minutes: Option<f64>,
    pub avg_nov_temperature: Option<f64>,
}

impl StateSummary {
    /// A row with every metric null.
    pub fn empty(state: &UsState) -> Self {
        Self {
            state: state.code.to_string(),
            state_name: state.name.to_string(),
            holiday_travel_volume: None,
            avg_delay_pct: None,
            avg_dec_temperature: None,
            nov_passengers: None,
            dec_passengers: None,
            total_flights: None,
            cancelled_flights: None,
            avg_delay_minutes: None,
            avg_nov_temperature: None,
        }
    }

    pub fn has_travel_data(&self) -> bool {
        self.holiday_travel_volume.is_some()
    }

    pub fn has_delay_data(&self) -> bool {
        self.avg_delay_pct.is_some()
    }

    pub fn has_temperature_data(&self) -> bool {
        self.avg_dec_temperature.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_travel_data() && self.has_delay_data() && self.has_temperature_data()
    }
}

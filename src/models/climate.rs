use serde::{Deserialize, Serialize};

/// One row of the NOAA climate divisional temperature file, reduced to the
/// holiday months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub state: String,
    pub year: i32,
    pub division: u16,
    pub december_temp_f: f64,
    pub november_temp_f: Option<f64>,
}

impl ClimateRecord {
    pub fn new(state: impl Into<String>, year: i32, division: u16, december_temp_f: f64) -> Self {
        Self {
            state: state.into(),
            year,
            division,
            december_temp_f,
            november_temp_f: None,
        }
    }

    pub fn with_november(mut self, november_temp_f: Option<f64>) -> Self {
        self.november_temp_f = november_temp_f;
        self
    }

    pub fn is_statewide(&self, statewide_division: u16) -> bool {
        self.division == statewide_division
    }
}

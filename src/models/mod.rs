pub mod airport;
pub mod climate;
pub mod delay;
pub mod state;
pub mod summary;

pub use airport::{AirportRecord, Month};
pub use climate::ClimateRecord;
pub use delay::DelayRecord;
pub use state::{normalize_state_code, state_by_code, state_by_ncei_code, UsState, US_STATES};
pub use summary::StateSummary;

use crate::config::ClimateSettings;
use crate::error::{ProcessingError, Result};
use crate::models::{
    AirportRecord, ClimateRecord, DelayRecord, Month, StateSummary, US_STATES,
};
use crate::readers::AirportLookup;
use crate::utils::constants::{SOURCE_DELAYS, SOURCE_PASSENGERS};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Holiday passenger totals for one state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TravelTotals {
    pub nov_passengers: u64,
    pub dec_passengers: u64,
}

impl TravelTotals {
    /// Add one airport-month, refusing counts whose sum no longer fits.
    fn add(&mut self, record: &AirportRecord) -> Result<()> {
        let too_large =
            |total| overflow(total, &record.airport_code, SOURCE_PASSENGERS, record.line);

        let month_total = match record.month {
            Month::Nov => &mut self.nov_passengers,
            Month::Dec => &mut self.dec_passengers,
        };
        *month_total = month_total
            .checked_add(record.passenger_count)
            .ok_or_else(|| too_large("passenger total"))?;
        self.nov_passengers
            .checked_add(self.dec_passengers)
            .ok_or_else(|| too_large("holiday travel volume"))?;
        Ok(())
    }

    /// Never saturates for totals built by the aggregator.
    pub fn holiday_volume(&self) -> u64 {
        self.nov_passengers.saturating_add(self.dec_passengers)
    }
}

/// Running sums for the flight-weighted delay averages of one state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DelayTotals {
    pub total_flights: u64,
    pub weighted_delay: f64,
    pub cancelled_flights: Option<u64>,
    pub delayed_flights: u64,
    pub weighted_minutes: f64,
}

impl DelayTotals {
    fn add(&mut self, record: &DelayRecord) -> Result<()> {
        let too_large = |total| overflow(total, &record.airport_code, SOURCE_DELAYS, record.line);

        self.total_flights = self
            .total_flights
            .checked_add(record.flight_count)
            .ok_or_else(|| too_large("flight total"))?;
        self.weighted_delay += record.delay_pct * record.flight_count as f64;

        if let Some(cancelled) = record.cancelled_flights {
            let sum = self
                .cancelled_flights
                .unwrap_or(0)
                .checked_add(cancelled)
                .ok_or_else(|| too_large("cancelled flight total"))?;
            self.cancelled_flights = Some(sum);
        }
        if let (Some(delayed), Some(minutes)) =
            (record.delayed_flights, record.avg_delay_minutes)
        {
            self.delayed_flights = self
                .delayed_flights
                .checked_add(delayed)
                .ok_or_else(|| too_large("delayed flight total"))?;
            self.weighted_minutes += minutes * delayed as f64;
        }
        Ok(())
    }

    /// `sum(delay_pct * flights) / sum(flights)`, or `None` with no flights.
    pub fn avg_delay_pct(&self) -> Option<f64> {
        (self.total_flights > 0).then(|| self.weighted_delay / self.total_flights as f64)
    }

    /// Average delay length weighted by delayed flights.
    pub fn avg_delay_minutes(&self) -> Option<f64> {
        (self.delayed_flights > 0).then(|| self.weighted_minutes / self.delayed_flights as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureTotals {
    pub dec_sum: f64,
    pub dec_count: usize,
    pub nov_sum: f64,
    pub nov_count: usize,
}

impl TemperatureTotals {
    pub fn avg_dec(&self) -> Option<f64> {
        (self.dec_count > 0).then(|| self.dec_sum / self.dec_count as f64)
    }

    pub fn avg_nov(&self) -> Option<f64> {
        (self.nov_count > 0).then(|| self.nov_sum / self.nov_count as f64)
    }
}

/// Joins the three record sets into one [`StateSummary`] per state.
pub struct StateAggregator<'a> {
    lookup: &'a AirportLookup,
    climate: &'a ClimateSettings,
}

impl<'a> StateAggregator<'a> {
    pub fn new(lookup: &'a AirportLookup, climate: &'a ClimateSettings) -> Self {
        Self { lookup, climate }
    }

    /// Passenger totals per state. An airport missing from the lookup aborts
    /// the run: dropping it would silently shrink its state's volume.
    pub fn travel_volume(
        &self,
        records: &[AirportRecord],
    ) -> Result<BTreeMap<String, TravelTotals>> {
        let mut totals: BTreeMap<String, TravelTotals> = BTreeMap::new();

        for record in records {
            let state = self
                .lookup
                .resolve(&record.airport_code, SOURCE_PASSENGERS, record.line)?;
            totals.entry(state.to_string()).or_default().add(record)?;
        }

        debug!(states = totals.len(), "Aggregated travel volume");
        Ok(totals)
    }

    /// Flight-weighted delay statistics per state.
    pub fn delay_rates(&self, records: &[DelayRecord]) -> Result<BTreeMap<String, DelayTotals>> {
        let mut totals: BTreeMap<String, DelayTotals> = BTreeMap::new();

        for record in records {
            let state = self
                .lookup
                .resolve(&record.airport_code, SOURCE_DELAYS, record.line)?;
            totals.entry(state.to_string()).or_default().add(record)?;
        }

        debug!(states = totals.len(), "Aggregated delay rates");
        Ok(totals)
    }

    /// Mean statewide December (and November) temperature over the
    /// configured year window.
    pub fn temperatures(&self, records: &[ClimateRecord]) -> BTreeMap<String, TemperatureTotals> {
        let mut totals: BTreeMap<String, TemperatureTotals> = BTreeMap::new();

        for record in records.iter().filter(|r| {
            r.is_statewide(self.climate.statewide_division) && self.climate.contains_year(r.year)
        }) {
            let entry = totals.entry(record.state.clone()).or_default();
            entry.dec_sum += record.december_temp_f;
            entry.dec_count += 1;
            if let Some(nov) = record.november_temp_f {
                entry.nov_sum += nov;
                entry.nov_count += 1;
            }
        }

        debug!(states = totals.len(), "Aggregated December temperatures");
        totals
    }

    /// Left join of the three aggregates onto the canonical state list.
    pub fn join(
        &self,
        travel: &BTreeMap<String, TravelTotals>,
        delays: &BTreeMap<String, DelayTotals>,
        temperatures: &BTreeMap<String, TemperatureTotals>,
    ) -> Vec<StateSummary> {
        let summaries: Vec<StateSummary> = US_STATES
            .iter()
            .map(|state| {
                let mut summary = StateSummary::empty(state);

                if let Some(totals) = travel.get(state.code) {
                    summary.holiday_travel_volume = Some(totals.holiday_volume());
                    summary.nov_passengers = Some(totals.nov_passengers);
                    summary.dec_passengers = Some(totals.dec_passengers);
                }

                if let Some(totals) = delays.get(state.code) {
                    summary.avg_delay_pct = totals.avg_delay_pct();
                    summary.avg_delay_minutes = totals.avg_delay_minutes();
                    summary.total_flights = Some(totals.total_flights);
                    summary.cancelled_flights = totals.cancelled_flights;
                }

                if let Some(totals) = temperatures.get(state.code) {
                    summary.avg_dec_temperature = totals.avg_dec();
                    summary.avg_nov_temperature = totals.avg_nov();
                }

                summary
            })
            .collect();

        let dropped = outside_state_set(travel.keys())
            .chain(outside_state_set(delays.keys()))
            .chain(outside_state_set(temperatures.keys()))
            .collect::<Vec<_>>();
        if !dropped.is_empty() {
            warn!(
                codes = ?dropped,
                "{} aggregates belong to codes outside the 50 states and are not in the summary",
                dropped.len()
            );
        }

        summaries
    }

    pub fn aggregate(
        &self,
        passengers: &[AirportRecord],
        delays: &[DelayRecord],
        climate: &[ClimateRecord],
    ) -> Result<Vec<StateSummary>> {
        let travel = self.travel_volume(passengers)?;
        let delay_totals = self.delay_rates(delays)?;
        let temperatures = self.temperatures(climate);
        Ok(self.join(&travel, &delay_totals, &temperatures))
    }
}

fn overflow(total: &str, airport_code: &str, source_name: &str, line: u64) -> ProcessingError {
    ProcessingError::InvalidFormat(format!(
        "{} overflows at airport {} in {} (line {})",
        total, airport_code, source_name, line
    ))
}

fn outside_state_set<'k>(codes: impl Iterator<Item = &'k String>) -> impl Iterator<Item = &'k str> {
    codes
        .map(String::as_str)
        .filter(|code| !US_STATES.iter().any(|s| s.code == *code))
}

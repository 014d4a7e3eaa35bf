use crate::models::StateSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct StateValue<T> {
    pub state: String,
    pub state_name: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub total_states: usize,
    pub travel_states: usize,
    pub delay_states: usize,
    pub temperature_states: usize,
    pub complete_states: usize,
}

impl Coverage {
    pub fn complete_percentage(&self) -> f64 {
        if self.total_states == 0 {
            return 0.0;
        }
        (self.complete_states as f64 / self.total_states as f64) * 100.0
    }
}

/// Headline figures over a summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatistics {
    pub coverage: Coverage,
    /// Saturates at `u64::MAX` for tables read back from arbitrary files.
    pub total_passengers: u64,
    /// Unweighted mean over states reporting a positive delay rate.
    pub mean_delay_pct: Option<f64>,
    pub mean_dec_temperature: Option<f64>,
    pub warmest: Option<StateValue<f64>>,
    pub coldest: Option<StateValue<f64>>,
    pub busiest: Option<StateValue<u64>>,
    pub most_delayed: Option<StateValue<f64>>,
}

pub struct SummaryAnalyzer;

impl SummaryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, summaries: &[StateSummary]) -> SummaryStatistics {
        let coverage = Coverage {
            total_states: summaries.len(),
            travel_states: summaries.iter().filter(|s| s.has_travel_data()).count(),
            delay_states: summaries.iter().filter(|s| s.has_delay_data()).count(),
            temperature_states: summaries
                .iter()
                .filter(|s| s.has_temperature_data())
                .count(),
            complete_states: summaries.iter().filter(|s| s.is_complete()).count(),
        };

        let total_passengers = summaries
            .iter()
            .filter_map(|s| s.holiday_travel_volume)
            .fold(0u64, u64::saturating_add);

        let reporting_delays: Vec<f64> = summaries
            .iter()
            .filter_map(|s| s.avg_delay_pct)
            .filter(|pct| *pct > 0.0)
            .collect();
        let temperatures: Vec<f64> = summaries
            .iter()
            .filter_map(|s| s.avg_dec_temperature)
            .collect();

        SummaryStatistics {
            coverage,
            total_passengers,
            mean_delay_pct: mean(&reporting_delays),
            mean_dec_temperature: mean(&temperatures),
            warmest: extreme(summaries, |s| s.avg_dec_temperature, |a, b| a > b),
            coldest: extreme(summaries, |s| s.avg_dec_temperature, |a, b| a < b),
            busiest: extreme(summaries, |s| s.holiday_travel_volume, |a, b| a > b),
            most_delayed: extreme(summaries, |s| s.avg_delay_pct, |a, b| a > b),
        }
    }
}

impl Default for SummaryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// First state (in table order) whose metric beats every other by `better`.
fn extreme<T: Copy>(
    summaries: &[StateSummary],
    metric: impl Fn(&StateSummary) -> Option<T>,
    better: impl Fn(T, T) -> bool,
) -> Option<StateValue<T>> {
    let mut best: Option<(&StateSummary, T)> = None;
    for summary in summaries {
        if let Some(value) = metric(summary) {
            match best {
                Some((_, current)) if !better(value, current) => {}
                _ => best = Some((summary, value)),
            }
        }
    }

    best.map(|(summary, value)| StateValue {
        state: summary.state.clone(),
        state_name: summary.state_name.clone(),
        value,
    })
}

impl SummaryStatistics {
    pub fn summary(&self) -> String {
        format!(
            "State Summary:\n\
            - States: {}\n\
            - With travel volume: {}\n\
            - With delay rate: {}\n\
            - With December temperature: {}\n\
            - Complete rows: {} ({:.1}%)",
            self.coverage.total_states,
            self.coverage.travel_states,
            self.coverage.delay_states,
            self.coverage.temperature_states,
            self.coverage.complete_states,
            self.coverage.complete_percentage(),
        )
    }

    pub fn detailed_summary(&self) -> String {
        let or_none = |text: Option<String>| text.unwrap_or_else(|| "No data".to_string());

        let mean_delay = or_none(self.mean_delay_pct.map(|v| format!("{:.1}%", v)));
        let mean_temp = or_none(self.mean_dec_temperature.map(|v| format!("{:.1}°F", v)));
        let warmest = or_none(
            self.warmest
                .as_ref()
                .map(|w| format!("{} ({:.1}°F)", w.state_name, w.value)),
        );
        let coldest = or_none(
            self.coldest
                .as_ref()
                .map(|c| format!("{} ({:.1}°F)", c.state_name, c.value)),
        );
        let busiest = or_none(
            self.busiest
                .as_ref()
                .map(|b| format!("{} ({} passengers)", b.state_name, b.value)),
        );
        let most_delayed = or_none(
            self.most_delayed
                .as_ref()
                .map(|d| format!("{} ({:.1}%)", d.state_name, d.value)),
        );

        format!(
            "{}\n\n\
            Holiday Travel:\n\
            - Total passengers: {:.1}M\n\
            - Busiest state: {}\n\n\
            Delays:\n\
            - Mean delay rate (reporting states): {}\n\
            - Most delayed state: {}\n\n\
            December Temperatures:\n\
            - Mean: {}\n\
            - Warmest: {}\n\
            - Coldest: {}",
            self.summary(),
            self.total_passengers as f64 / 1_000_000.0,
            busiest,
            mean_delay,
            most_delayed,
            mean_temp,
            warmest,
            coldest,
        )
    }
}

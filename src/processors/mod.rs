pub mod pipeline;
pub mod state_aggregator;

pub use pipeline::{LoadedSources, Pipeline, PipelineOutcome, PIPELINE_STAGES};
pub use state_aggregator::{DelayTotals, StateAggregator, TemperatureTotals, TravelTotals};

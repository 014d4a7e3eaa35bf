pub mod summary_analyzer;

pub use summary_analyzer::{Coverage, StateValue, SummaryAnalyzer, SummaryStatistics};

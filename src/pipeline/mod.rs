//! Fetch -> normalize -> merge -> persist

pub mod aggregator;
pub mod normalizer;
pub mod orchestrator;
pub mod writer;

pub use aggregator::{Aggregation, AggregationEngine, AggregationReport, ChannelOutcome};
pub use normalizer::ScheduleNormalizer;
pub use orchestrator::{EpgPipeline, RunSummary, refresh_roster};
pub use writer::DocumentWriter;

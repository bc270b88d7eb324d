//! Aggregation orchestrator: concurrent provider fan-out, concordance
//! resolution, exclusion and ordered merge.

pub mod aggregate;
pub mod merge;

pub use aggregate::Aggregator;

use thiserror::Error;

/// Aggregator task has stopped and no longer accepts events
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Aggregator is not running anymore")]
pub struct AggregatorClosed;

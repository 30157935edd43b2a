use std::time::SystemTime;

use crate::aggregate::{AggregatorClosed, AggregatorHandle, LatencyStorage, SharedAggregator};
use crate::report::SummaryReporter;

/// Destination for decoded events
///
/// Implemented by both aggregator front-ends, so consumption code
/// does not care whether events go through a channel or a mutex.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    async fn record(
        &self,
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    ) -> Result<(), AggregatorClosed>;
}

impl EventSink for AggregatorHandle {
    async fn record(
        &self,
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    ) -> Result<(), AggregatorClosed> {
        self.add(status, latency_millis, observed_at).await
    }
}

impl<R, S> EventSink for SharedAggregator<R, S>
where
    R: SummaryReporter,
    S: LatencyStorage,
{
    async fn record(
        &self,
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    ) -> Result<(), AggregatorClosed> {
        self.add(status, latency_millis, observed_at);
        Ok(())
    }
}

/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */

use std::ops::AddAssign;

use tracing::debug;

use crate::aggregate::{AggregatorClosed, EventSink};
use crate::consume::{
    BridgeSettings, ConsumerSession, ConsumptionError, Delivery, PartitionClaim, Shutdown,
};
use crate::decode::EventDecoder;
use crate::time::Clock;

/// Outcome of a single delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Aggregated,
    Skipped,
}

/// Counters of a finished partition claim
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub delivered: u64,
    pub aggregated: u64,
    pub skipped: u64,
}

impl AddAssign for BridgeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.delivered += rhs.delivered;
        self.aggregated += rhs.aggregated;
        self.skipped += rhs.skipped;
    }
}

/// Decodes deliveries and hands them to the aggregator
///
/// Delivery is acknowledged only after the event has been accepted by
/// the sink. Undecodable payloads are acknowledged as well, as they
/// cannot succeed on redelivery.
#[derive(Debug, Clone)]
pub struct ConsumptionBridge<A> {
    sink: A,
    decoder: EventDecoder,
    clock: Clock,
}

impl<A> ConsumptionBridge<A>
where
    A: EventSink + Sync,
{
    pub fn new(sink: A, settings: BridgeSettings) -> Self {
        Self {
            sink,
            decoder: EventDecoder::new(settings.decode_policy()),
            clock: *settings.clock(),
        }
    }

    pub async fn handle<S>(
        &self,
        session: &S,
        delivery: &S::Delivery,
    ) -> Result<Handled, AggregatorClosed>
    where
        S: ConsumerSession,
    {
        let handled = match self.decoder.decode(delivery.payload()) {
            Ok(event) => {
                self.sink
                    .record(event.status, event.latency_millis, self.clock.now())
                    .await?;
                Handled::Aggregated
            }
            Err(error) => {
                debug!(
                    partition = delivery.partition(),
                    offset = delivery.offset(),
                    error = %error,
                    "Skipping undecodable event"
                );
                Handled::Skipped
            }
        };

        session.acknowledge(delivery);
        Ok(handled)
    }

    /// Consumes claim until it ends or `stop` is triggered
    ///
    /// Stop is checked only between deliveries, an event that is
    /// already handed to the sink is always acknowledged.
    pub async fn consume<S, C>(
        &self,
        session: &S,
        claim: &mut C,
        mut stop: Shutdown,
    ) -> Result<BridgeStats, ConsumptionError>
    where
        S: ConsumerSession,
        C: PartitionClaim<Delivery = S::Delivery>,
    {
        let partition = claim.partition();
        let mut stats = BridgeStats::default();

        loop {
            let delivery = tokio::select! {
                biased;
                _ = stop.triggered() => {
                    debug!(partition, "Partition consumption is stopped");
                    break;
                }
                delivery = claim.next_delivery() => delivery?,
            };

            let Some(delivery) = delivery else {
                debug!(partition, "Partition claim has ended");
                break;
            };

            stats.delivered += 1;
            match self.handle(session, &delivery).await? {
                Handled::Aggregated => stats.aggregated += 1,
                Handled::Skipped => stats.skipped += 1,
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use tokio::task::JoinHandle;
    use tokio::time::{advance, sleep};

    use crate::aggregate::{AggregatorHandle, AggregatorService, AggregatorSettings};
    use crate::consume::{shutdown_signal, ConsumerGroup, MemoryTopic};
    use crate::decode::DecodePolicy;
    use crate::report::TestReporter;
    use crate::time::Duration;

    use super::*;

    fn clock() -> Clock {
        Clock::at(Duration::from_secs(1_700_000_040))
    }

    fn bridge(
        policy: DecodePolicy,
        reporter: &TestReporter,
    ) -> (ConsumptionBridge<AggregatorHandle>, JoinHandle<()>) {
        let (handle, task) = AggregatorService::spawn(
            AggregatorSettings::default().with_clock(clock()),
            reporter.clone(),
        );

        (
            ConsumptionBridge::new(
                handle,
                BridgeSettings::default()
                    .with_clock(clock())
                    .with_decode_policy(policy),
            ),
            task,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn aggregates_and_acknowledges_every_delivery() {
        let reporter = TestReporter::new();
        let (bridge, task) = bridge(DecodePolicy::Lenient, &reporter);
        let topic = MemoryTopic::new(1);
        topic.publish(0, "request_id=1 path=/api status=200 latency=12");
        topic.publish(0, "status=503 latency=40");
        topic.publish(0, "garbage");

        let mut group = topic.consumer_group();
        let mut assignment = group.join().await.unwrap();
        topic.close();
        let (_trigger, stop) = shutdown_signal();
        let stats = bridge
            .consume(&assignment.session, &mut assignment.claims[0], stop)
            .await
            .unwrap();

        assert_eq!(
            stats,
            BridgeStats {
                delivered: 3,
                aggregated: 3,
                skipped: 0
            }
        );
        assert_eq!(topic.committed(0), 3);

        drop(bridge);
        task.await.unwrap();
        assert_eq!(reporter.totals(), vec![3]);
        assert_eq!(reporter.summaries()[0].count_5xx(), 1);
        assert_eq!(reporter.summaries()[0].unclassified(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_and_acknowledges_undecodable_payloads_in_strict_mode() {
        let reporter = TestReporter::new();
        let (bridge, task) = bridge(DecodePolicy::Strict, &reporter);
        let topic = MemoryTopic::new(1);
        topic.publish(0, "status=200");
        topic.publish(0, "status=200 latency=5");

        let mut group = topic.consumer_group();
        let mut assignment = group.join().await.unwrap();
        topic.close();
        let (_trigger, stop) = shutdown_signal();
        let stats = bridge
            .consume(&assignment.session, &mut assignment.claims[0], stop)
            .await
            .unwrap();

        assert_eq!(
            stats,
            BridgeStats {
                delivered: 2,
                aggregated: 1,
                skipped: 1
            }
        );
        assert_eq!(topic.committed(0), 2);

        drop(bridge);
        task.await.unwrap();
        assert_eq!(reporter.totals(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_acknowledge_when_aggregator_is_gone() {
        let reporter = TestReporter::new();
        let (bridge, task) = bridge(DecodePolicy::Lenient, &reporter);
        task.abort();
        let _ = task.await;

        let topic = MemoryTopic::new(1);
        topic.publish(0, "status=200 latency=5");

        let mut group = topic.consumer_group();
        let mut assignment = group.join().await.unwrap();
        let (_trigger, stop) = shutdown_signal();
        let result = bridge
            .consume(&assignment.session, &mut assignment.claims[0], stop)
            .await;

        assert!(matches!(result, Err(ConsumptionError::AggregatorClosed(_))));
        assert_eq!(topic.committed(0), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_waiting_for_deliveries_on_shutdown() {
        let reporter = TestReporter::new();
        let (bridge, _task) = bridge(DecodePolicy::Lenient, &reporter);
        let topic = MemoryTopic::new(1);
        topic.publish(0, "status=200 latency=5");

        let mut group = topic.consumer_group();
        let mut assignment = group.join().await.unwrap();
        let (trigger, stop) = shutdown_signal();
        let mut claim = assignment.claims.remove(0);
        let session = assignment.session.clone();

        let consuming =
            tokio::spawn(async move { bridge.consume(&session, &mut claim, stop).await });
        sleep(Duration::from_secs(1)).await;
        trigger.trigger();

        let stats = consuming.await.unwrap().unwrap();
        assert_eq!(stats.aggregated, 1);
        assert_eq!(topic.committed(0), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stamps_events_with_bridge_clock() {
        let reporter = TestReporter::new();
        let (bridge, task) = bridge(DecodePolicy::Lenient, &reporter);
        let topic = MemoryTopic::new(1);
        topic.publish(0, "status=200 latency=5");

        let mut group = topic.consumer_group();
        let mut assignment = group.join().await.unwrap();
        let delivery = assignment.claims[0].next_delivery().await.unwrap().unwrap();

        bridge.handle(&assignment.session, &delivery).await.unwrap();
        advance(Duration::from_secs(60)).await;
        bridge.handle(&assignment.session, &delivery).await.unwrap();

        drop(bridge);
        task.await.unwrap();
        assert_eq!(reporter.totals(), vec![1, 1]);
        assert_eq!(reporter.summaries()[0].window_start().to_string(), "22:14");
    }
}

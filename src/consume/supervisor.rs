/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */

use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::aggregate::EventSink;
use crate::consume::{
    shutdown_signal, Assignment, BridgeStats, ConsumerGroup, ConsumptionBridge, ConsumptionError,
    PartitionClaim, Shutdown, SupervisorSettings,
};

/// How a consumer group session has ended, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SessionOutcome {
    Ended,
    Failed,
    Shutdown,
    AggregatorClosed,
}

/// What happened during supervisor lifetime
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SupervisorReport {
    sessions: u64,
    failures: u64,
    aggregator_closed: bool,
    partitions: FxHashMap<i32, BridgeStats>,
}

impl SupervisorReport {
    /// Number of joined consumer group sessions
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Number of failed joins and sessions
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Whether consumption stopped because aggregator is not running
    pub fn aggregator_closed(&self) -> bool {
        self.aggregator_closed
    }

    pub fn partition(&self, partition: i32) -> Option<&BridgeStats> {
        self.partitions.get(&partition)
    }

    /// Counters of every partition claim that ended without error
    pub fn total(&self) -> BridgeStats {
        self.partitions
            .values()
            .fold(BridgeStats::default(), |mut total, stats| {
                total += *stats;
                total
            })
    }

    fn record(&mut self, partition: i32, stats: BridgeStats) {
        *self.partitions.entry(partition).or_default() += stats;
    }
}

struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(settings: &SupervisorSettings) -> Self {
        Self {
            initial: settings.initial_backoff(),
            max: settings.max_backoff(),
            current: settings.initial_backoff(),
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Keeps consuming from a consumer group until shutdown
///
/// Every claimed partition runs in its own task. A failed join or
/// partition claim ends the session, the supervisor waits with
/// exponential backoff and joins the group again. Aggregator state
/// is not touched by any of this.
#[derive(Debug)]
pub struct ConsumerSupervisor<G, A> {
    group: G,
    bridge: ConsumptionBridge<A>,
    settings: SupervisorSettings,
    shutdown: Shutdown,
}

impl<G, A> ConsumerSupervisor<G, A>
where
    G: ConsumerGroup,
    A: EventSink + Clone + Send + Sync + 'static,
{
    pub fn new(
        group: G,
        bridge: ConsumptionBridge<A>,
        settings: SupervisorSettings,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            group,
            bridge,
            settings,
            shutdown,
        }
    }

    pub async fn run(mut self) -> SupervisorReport {
        let mut report = SupervisorReport::default();
        let mut backoff = Backoff::new(&self.settings);

        loop {
            let joined = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => break,
                joined = self.group.join() => joined,
            };

            let outcome = match joined {
                Ok(assignment) if assignment.claims.is_empty() => {
                    report.sessions += 1;
                    debug!("Joined consumer group without assigned partitions");
                    SessionOutcome::Failed
                }
                Ok(assignment) => {
                    report.sessions += 1;
                    info!(
                        partitions = assignment.claims.len(),
                        "Joined consumer group session"
                    );
                    self.run_session(assignment, &mut report).await
                }
                Err(error) => {
                    warn!(error = %error, "Failed to join consumer group");
                    SessionOutcome::Failed
                }
            };

            match outcome {
                SessionOutcome::Ended => backoff.reset(),
                SessionOutcome::Failed => {
                    report.failures += 1;
                    let delay = backoff.next_delay();
                    debug!(delay = ?delay, "Waiting before joining consumer group again");
                    if !self.pause(delay).await {
                        break;
                    }
                }
                SessionOutcome::Shutdown => break,
                SessionOutcome::AggregatorClosed => {
                    report.aggregator_closed = true;
                    break;
                }
            }
        }

        info!(
            sessions = report.sessions,
            failures = report.failures,
            "Consumer supervisor has stopped"
        );
        report
    }

    async fn run_session(
        &mut self,
        assignment: Assignment<G::Session, G::Claim>,
        report: &mut SupervisorReport,
    ) -> SessionOutcome {
        let (stop, session_shutdown) = shutdown_signal();
        let mut tasks = JoinSet::new();

        for mut claim in assignment.claims {
            let bridge = self.bridge.clone();
            let session = assignment.session.clone();
            let stop = session_shutdown.clone();

            tasks.spawn(async move {
                let partition = claim.partition();
                (partition, bridge.consume(&session, &mut claim, stop).await)
            });
        }

        let mut outcome = SessionOutcome::Ended;
        loop {
            let joined = tokio::select! {
                biased;
                _ = self.shutdown.triggered(), if !stop.is_triggered() => {
                    stop.trigger();
                    outcome = outcome.max(SessionOutcome::Shutdown);
                    continue;
                }
                joined = tasks.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((partition, Ok(stats))) => {
                    debug!(
                        partition,
                        delivered = stats.delivered,
                        skipped = stats.skipped,
                        "Partition claim is finished"
                    );
                    report.record(partition, stats);
                }
                Ok((partition, Err(ConsumptionError::AggregatorClosed(_)))) => {
                    error!(partition, "Aggregator is gone, stopping consumption");
                    outcome = outcome.max(SessionOutcome::AggregatorClosed);
                    stop.trigger();
                }
                Ok((partition, Err(error))) => {
                    warn!(partition, error = %error, "Partition consumption has failed");
                    outcome = outcome.max(SessionOutcome::Failed);
                    stop.trigger();
                }
                Err(error) => {
                    error!(error = ?error, "Partition consumption task has failed");
                    outcome = outcome.max(SessionOutcome::Failed);
                    stop.trigger();
                }
            }
        }

        outcome
    }

    /// Sleeps unless shutdown comes first
    async fn pause(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => false,
            _ = sleep(delay) => true,
        }
    }
}

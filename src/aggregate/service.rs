/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */

use std::time::SystemTime;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::aggregate::{
    Aggregator, AggregatorClosed, AggregatorSettings, ExactLatencies, LatencyStorage,
    WindowAccumulator,
};
use crate::report::SummaryReporter;

#[derive(Debug)]
enum Command {
    Add {
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    },
}

/// Cloneable entry point into a running [`AggregatorService`]
///
/// Aggregator task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct AggregatorHandle {
    sender: mpsc::Sender<Command>,
}

impl AggregatorHandle {
    /// Hands event over to the aggregator task
    ///
    /// Waits only when the channel is full, fails only when the task is gone.
    pub async fn add(
        &self,
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    ) -> Result<(), AggregatorClosed> {
        self.sender
            .send(Command::Add {
                status,
                latency_millis,
                observed_at,
            })
            .await
            .map_err(|_| AggregatorClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Single writer task owning the live window
///
/// Closed windows are finalized by a separate reporting task,
/// so sorting a large window never delays incoming events.
#[derive(Debug)]
pub struct AggregatorService<S = ExactLatencies> {
    aggregator: Aggregator<S>,
    receiver: mpsc::Receiver<Command>,
    closed: mpsc::UnboundedSender<WindowAccumulator<S>>,
}

impl AggregatorService<ExactLatencies> {
    pub fn spawn<R>(settings: AggregatorSettings, reporter: R) -> (AggregatorHandle, JoinHandle<()>)
    where
        R: SummaryReporter + 'static,
    {
        Self::spawn_with_storage(settings, ExactLatencies::default(), reporter)
    }
}

impl<S> AggregatorService<S>
where
    S: LatencyStorage + 'static,
{
    /// Starts aggregator and reporting tasks on current runtime
    ///
    /// Returned join handle completes after the last handle is dropped
    /// and every closed window has been reported.
    pub fn spawn_with_storage<R>(
        settings: AggregatorSettings,
        storage: S,
        reporter: R,
    ) -> (AggregatorHandle, JoinHandle<()>)
    where
        R: SummaryReporter + 'static,
    {
        let (sender, receiver) = mpsc::channel(settings.channel_capacity());
        let (closed, closed_receiver) = mpsc::unbounded_channel();

        let service = Self {
            aggregator: Aggregator::with_storage(settings, storage),
            receiver,
            closed,
        };

        let reporting = tokio::spawn(report_closed_windows(closed_receiver, reporter));
        let task = tokio::spawn(async move {
            service.run().await;

            if let Err(error) = reporting.await {
                error!(error = ?error, "Summary reporting task has failed");
            }
        });

        (AggregatorHandle { sender }, task)
    }

    async fn run(mut self) {
        let settings = *self.aggregator.settings();
        let mut idle_flush = settings.idle_flush().map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(Command::Add { status, latency_millis, observed_at }) => {
                        let closed = self.aggregator.add(status, latency_millis, observed_at);
                        self.dispatch(closed);
                    }
                    None => break,
                },
                _ = next_tick(&mut idle_flush) => {
                    let closed = self.aggregator.tick(settings.clock().now());
                    self.dispatch(closed);
                }
            }
        }

        debug!(total = self.aggregator.total(), "Aggregator is shutting down");
        let closed = self.aggregator.shutdown();
        self.dispatch(closed);
    }

    fn dispatch(&self, closed: Option<WindowAccumulator<S>>) {
        if let Some(window) = closed {
            if self.closed.send(window).is_err() {
                error!("Summary reporting task is gone, closed window is lost");
            }
        }
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn report_closed_windows<S, R>(
    mut receiver: mpsc::UnboundedReceiver<WindowAccumulator<S>>,
    mut reporter: R,
) where
    S: LatencyStorage,
    R: SummaryReporter,
{
    while let Some(window) = receiver.recv().await {
        if let Some(summary) = window.finalize() {
            reporter.report(summary);
        }
    }
}

/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */

use std::time::SystemTime;

use tracing::debug;

use crate::aggregate::{AggregatorSettings, ExactLatencies, LatencyStorage, WindowAccumulator};
use crate::time::WindowStart;

/// Rollover state machine owning the live window
///
/// A window is closed by the first event or timer tick that falls into
/// a strictly later window. Only one rollover step is performed at a time,
/// so empty windows in between are never represented.
#[derive(Debug)]
pub struct Aggregator<S = ExactLatencies> {
    settings: AggregatorSettings,
    live: WindowAccumulator<S>,
}

impl Aggregator<ExactLatencies> {
    pub fn new(settings: AggregatorSettings) -> Self {
        Self::with_storage(settings, ExactLatencies::default())
    }
}

impl<S> Aggregator<S>
where
    S: LatencyStorage,
{
    pub fn with_storage(settings: AggregatorSettings, storage: S) -> Self {
        let start = WindowStart::truncate(settings.clock().now(), settings.window());

        Self {
            settings,
            live: WindowAccumulator::new(start, storage),
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    pub fn window_start(&self) -> WindowStart {
        self.live.start()
    }

    /// Number of events in the live window
    pub fn total(&self) -> u64 {
        self.live.total()
    }

    /// Records event, returns previous window if the event has closed it
    ///
    /// Returned window is never empty.
    pub fn add(
        &mut self,
        status: u32,
        latency_millis: i64,
        observed_at: SystemTime,
    ) -> Option<WindowAccumulator<S>> {
        let closed = self.rollover(observed_at);
        self.live.record(status, latency_millis);
        closed
    }

    /// Closes the live window without recording anything when `now` is past it
    pub fn tick(&mut self, now: SystemTime) -> Option<WindowAccumulator<S>> {
        self.rollover(now)
    }

    /// Takes out everything recorded in the live window so far
    pub fn drain(&mut self) -> Option<WindowAccumulator<S>> {
        let empty = self.live.reopen(self.live.start());
        Some(std::mem::replace(&mut self.live, empty)).filter(|window| !window.is_empty())
    }

    /// Final window to report when aggregation stops
    pub fn shutdown(&mut self) -> Option<WindowAccumulator<S>> {
        match self.settings.flush_on_shutdown() {
            true => self.drain(),
            false => None,
        }
    }

    fn rollover(&mut self, at: SystemTime) -> Option<WindowAccumulator<S>> {
        let current = WindowStart::truncate(at, self.settings.window());

        if current <= self.live.start() {
            return None;
        }

        debug!(
            closed = %self.live.start(),
            opened = %current,
            total = self.live.total(),
            "Window rollover"
        );

        let next = self.live.reopen(current);
        Some(std::mem::replace(&mut self.live, next)).filter(|window| !window.is_empty())
    }
}

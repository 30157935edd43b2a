use std::time::Duration;

use crate::time::{Clock, ONE_MINUTE};

const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

#[derive(Clone, Copy, Debug)]
pub struct AggregatorSettings {
    window: Duration,
    clock: Clock,
    flush_on_shutdown: bool,
    idle_flush: Option<Duration>,
    channel_capacity: usize,
}

impl AggregatorSettings {
    /// Changes length of aggregation window
    ///
    /// # Arguments
    ///
    /// * `window`: size of the window to aggregate events into
    pub fn with_window(self, window: Duration) -> Self {
        Self { window, ..self }
    }

    /// Modifies clock used to stamp the first window and timer driven flushes
    ///
    /// # Arguments
    ///
    /// * `clock`: [`Clock`](crate::time::Clock) to read wall-clock time from
    pub fn with_clock(self, clock: Clock) -> Self {
        Self { clock, ..self }
    }

    /// Controls whether partially filled window is reported on shutdown
    pub fn with_flush_on_shutdown(self, flush_on_shutdown: bool) -> Self {
        Self {
            flush_on_shutdown,
            ..self
        }
    }

    /// Enables timer driven rollover check with provided interval
    ///
    /// Without it a window is closed only by the first event of a later window.
    pub fn with_idle_flush(self, interval: Duration) -> Self {
        Self {
            idle_flush: Some(interval),
            ..self
        }
    }

    /// Maximum number of events waiting for aggregator task
    pub fn with_channel_capacity(self, channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
            ..self
        }
    }

    pub fn window(&self) -> &Duration {
        &self.window
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn flush_on_shutdown(&self) -> bool {
        self.flush_on_shutdown
    }

    pub fn idle_flush(&self) -> Option<Duration> {
        self.idle_flush
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            window: ONE_MINUTE,
            clock: Clock::system(),
            flush_on_shutdown: true,
            idle_flush: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

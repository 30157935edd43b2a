/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */

use crate::aggregate::{ExactLatencies, LatencyStorage, WindowSummary};
use crate::time::WindowStart;

const P95: f64 = 0.95;

/// Class of response status counted separately in a window
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum StatusClass {
    /// Statuses from 200 till 299
    Success,
    /// Statuses from 400 till 499
    ClientError,
    /// Any status starting from 500
    ServerError,
}

impl StatusClass {
    /// Classifies status code, returns `None` for 1xx, 3xx and anything below
    pub fn of(status: u32) -> Option<Self> {
        match status {
            200..=299 => Some(Self::Success),
            400..=499 => Some(Self::ClientError),
            500.. => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Mutable accounting of all events in a single window
#[derive(Debug)]
pub struct WindowAccumulator<S = ExactLatencies> {
    start: WindowStart,
    total: u64,
    count_2xx: u64,
    count_4xx: u64,
    count_5xx: u64,
    latencies: S,
}

impl<S> WindowAccumulator<S>
where
    S: LatencyStorage,
{
    pub fn new(start: WindowStart, latencies: S) -> Self {
        Self {
            start,
            total: 0,
            count_2xx: 0,
            count_4xx: 0,
            count_5xx: 0,
            latencies,
        }
    }

    pub fn start(&self) -> WindowStart {
        self.start
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn record(&mut self, status: u32, latency_millis: i64) {
        self.total += 1;
        self.latencies.record(latency_millis);

        match StatusClass::of(status) {
            Some(StatusClass::Success) => self.count_2xx += 1,
            Some(StatusClass::ClientError) => self.count_4xx += 1,
            Some(StatusClass::ServerError) => self.count_5xx += 1,
            None => (),
        }
    }

    /// Empty accumulator for the window that follows, keeping storage settings
    pub(crate) fn reopen(&self, start: WindowStart) -> Self {
        Self::new(start, self.latencies.empty())
    }

    /// Computes window statistics, empty windows produce nothing
    pub fn finalize(mut self) -> Option<WindowSummary> {
        if self.total == 0 {
            return None;
        }

        let avg = self.latencies.mean()?;
        let p95 = self.latencies.percentile(P95)?;

        Some(WindowSummary::new(
            self.start,
            self.total,
            self.count_2xx,
            self.count_4xx,
            self.count_5xx,
            avg,
            p95,
        ))
    }
}

use tracing::info;

use crate::aggregate::WindowSummary;
use crate::report::SummaryReporter;

/// Emits every summary as a structured `INFO` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl SummaryReporter for TracingReporter {
    fn report(&mut self, summary: WindowSummary) {
        info!(
            window = %summary.window_start(),
            total = summary.total(),
            status_2xx = summary.count_2xx(),
            status_4xx = summary.count_4xx(),
            status_5xx = summary.count_5xx(),
            avg_latency_ms = summary.avg_latency_millis(),
            p95_latency_ms = summary.p95_latency_millis(),
            "{summary}"
        );
    }
}

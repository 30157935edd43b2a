//! Sinks for finalized window summaries.

pub use channel::ChannelReporter;
#[cfg(any(feature = "test_util", test))]
pub use test_reporter::TestReporter;
pub use log_line::TracingReporter;

use crate::aggregate::WindowSummary;

mod channel;
mod log_line;
#[cfg(any(feature = "test_util", test))]
mod test_reporter;

/// Receives summary of every closed non-empty window
///
/// Called at most once per window, in the order windows were closed.
pub trait SummaryReporter: Send {
    fn report(&mut self, summary: WindowSummary);
}

impl<F> SummaryReporter for F
where
    F: FnMut(WindowSummary) + Send,
{
    fn report(&mut self, summary: WindowSummary) {
        self(summary)
    }
}

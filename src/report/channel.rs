use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::aggregate::WindowSummary;
use crate::report::SummaryReporter;

/// Forwards summaries into a channel for consumption by another task
///
/// Summaries are dropped with a warning once the receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<WindowSummary>,
}

impl ChannelReporter {
    pub fn new(sender: UnboundedSender<WindowSummary>) -> Self {
        Self { sender }
    }
}

impl SummaryReporter for ChannelReporter {
    fn report(&mut self, summary: WindowSummary) {
        if self.sender.send(summary).is_err() {
            warn!(window = %summary.window_start(), "Summary receiver is closed, dropping summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use crate::time::WindowStart;

    use super::*;

    fn summary(total: u64) -> WindowSummary {
        WindowSummary::new(WindowStart::default(), total, total, 0, 0, 1.0, 1)
    }

    #[tokio::test]
    async fn sends_summaries_in_order() {
        let (sender, mut receiver) = unbounded_channel();
        let mut reporter = ChannelReporter::new(sender);

        reporter.report(summary(1));
        reporter.report(summary(2));

        assert_eq!(receiver.recv().await.map(|summary| summary.total()), Some(1));
        assert_eq!(receiver.recv().await.map(|summary| summary.total()), Some(2));
    }

    #[tokio::test]
    async fn does_not_fail_when_receiver_is_dropped() {
        let (sender, receiver) = unbounded_channel();
        drop(receiver);

        ChannelReporter::new(sender).report(summary(1));
    }
}

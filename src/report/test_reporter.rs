use std::sync::{Arc, Mutex, PoisonError};

use crate::aggregate::WindowSummary;
use crate::report::SummaryReporter;

/// Test reporter
///
/// Collects reported summaries for later verification in tests,
/// clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct TestReporter {
    summaries: Arc<Mutex<Vec<WindowSummary>>>,
}

impl TestReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> Vec<WindowSummary> {
        self.summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn totals(&self) -> Vec<u64> {
        self.summaries()
            .iter()
            .map(WindowSummary::total)
            .collect()
    }
}

impl SummaryReporter for TestReporter {
    fn report(&mut self, summary: WindowSummary) {
        self.summaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(summary)
    }
}

use std::fmt::{Debug, Formatter};
use std::time::SystemTime;

use crate::aggregate::{
    Aggregator, AggregatorSettings, ExactLatencies, LatencyStorage, WindowAccumulator,
};
use crate::report::SummaryReporter;
use crate::sync::{Arc, Mutex, MutexGuard};

struct Shared<R, S> {
    aggregator: Mutex<Aggregator<S>>,
    reporter: Mutex<R>,
}

/// Aggregator for synchronous callers guarded by a mutex
///
/// Aggregator lock is held only for the rollover check and counter update.
/// Statistics of a closed window are computed under the reporter lock alone.
pub struct SharedAggregator<R, S = ExactLatencies> {
    inner: Arc<Shared<R, S>>,
}

impl<R, S> Clone for SharedAggregator<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S> Debug for SharedAggregator<R, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedAggregator").finish_non_exhaustive()
    }
}

impl<R> SharedAggregator<R, ExactLatencies>
where
    R: SummaryReporter,
{
    pub fn new(settings: AggregatorSettings, reporter: R) -> Self {
        Self::with_storage(settings, ExactLatencies::default(), reporter)
    }
}

impl<R, S> SharedAggregator<R, S>
where
    R: SummaryReporter,
    S: LatencyStorage,
{
    pub fn with_storage(settings: AggregatorSettings, storage: S, reporter: R) -> Self {
        Self {
            inner: Arc::new(Shared {
                aggregator: Mutex::new(Aggregator::with_storage(settings, storage)),
                reporter: Mutex::new(reporter),
            }),
        }
    }

    pub fn add(&self, status: u32, latency_millis: i64, observed_at: SystemTime) {
        self.apply(|aggregator| aggregator.add(status, latency_millis, observed_at));
    }

    pub fn tick(&self, now: SystemTime) {
        self.apply(|aggregator| aggregator.tick(now));
    }

    /// Reports partially filled window if enabled in settings
    pub fn shutdown(&self) {
        self.apply(Aggregator::shutdown);
    }

    /// Number of events in the live window
    pub fn total(&self) -> u64 {
        self.aggregator().total()
    }

    fn aggregator(&self) -> MutexGuard<'_, Aggregator<S>> {
        self.inner
            .aggregator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reporter lock is taken before the aggregator lock is released,
    /// so closed windows reach the reporter in the order they were closed.
    fn apply(
        &self,
        action: impl FnOnce(&mut Aggregator<S>) -> Option<WindowAccumulator<S>>,
    ) {
        let mut aggregator = self.aggregator();
        let Some(closed) = action(&mut *aggregator) else {
            return;
        };

        let mut reporter = self
            .inner
            .reporter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(aggregator);

        if let Some(summary) = closed.finalize() {
            reporter.report(summary);
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::thread;

    use crate::aggregate::WindowSummary;
    use crate::report::TestReporter;
    use crate::time::{Clock, Duration};

    use super::*;

    const T0: Duration = Duration::from_secs(1_700_000_040);

    fn shared(reporter: &TestReporter) -> SharedAggregator<TestReporter> {
        SharedAggregator::new(
            AggregatorSettings::default().with_clock(Clock::at(T0)),
            reporter.clone(),
        )
    }

    fn at(offset: Duration) -> SystemTime {
        SystemTime::UNIX_EPOCH + T0 + offset
    }

    #[test]
    fn keeps_every_update_from_concurrent_callers() {
        let reporter = TestReporter::new();
        let aggregator = shared(&reporter);

        let workers = (0..8)
            .map(|worker| {
                let aggregator = aggregator.clone();
                thread::spawn(move || {
                    for index in 0..1_000 {
                        aggregator.add(200 + worker, index, at(Duration::from_millis(index as u64)));
                    }
                })
            })
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .for_each(|worker| worker.join().unwrap());

        assert_eq!(aggregator.total(), 8_000);
        assert!(reporter.summaries().is_empty());
    }

    #[test]
    fn reports_closed_window_to_reporter() {
        let reporter = TestReporter::new();
        let aggregator = shared(&reporter);

        aggregator.add(200, 10, at(Duration::from_secs(1)));
        aggregator.add(404, 30, at(Duration::from_secs(29)));
        aggregator.add(500, 50, at(Duration::from_secs(61)));

        assert_eq!(reporter.totals(), vec![2]);
        assert_eq!(aggregator.total(), 1);
    }

    #[test]
    fn reports_windows_in_close_order_from_concurrent_callers() {
        let reporter = TestReporter::new();
        let aggregator = shared(&reporter);

        let workers = (0..4)
            .map(|worker| {
                let aggregator = aggregator.clone();
                thread::spawn(move || {
                    for minute in 0..50u64 {
                        aggregator.add(
                            200,
                            worker,
                            at(Duration::from_secs(minute * 60 + worker as u64)),
                        );
                    }
                })
            })
            .collect::<Vec<_>>();

        workers
            .into_iter()
            .for_each(|worker| worker.join().unwrap());
        aggregator.shutdown();

        let starts = reporter
            .summaries()
            .iter()
            .map(WindowSummary::window_start)
            .collect::<Vec<_>>();

        assert!(!starts.is_empty());
        assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(reporter.totals().iter().sum::<u64>(), 200);
    }

    #[test]
    fn reports_window_on_tick_and_shutdown() {
        let reporter = TestReporter::new();
        let aggregator = shared(&reporter);

        aggregator.add(200, 10, at(Duration::from_secs(1)));
        aggregator.tick(at(Duration::from_secs(60)));
        aggregator.add(200, 10, at(Duration::from_secs(70)));
        aggregator.add(200, 10, at(Duration::from_secs(71)));
        aggregator.shutdown();

        assert_eq!(reporter.totals(), vec![1, 2]);
    }
}

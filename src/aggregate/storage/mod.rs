pub use exact::*;
pub use histogram::*;

mod exact;
mod histogram;

/// Storage for latency samples of a single window
pub trait LatencyStorage: Send {
    /// Records latency sample
    ///
    /// # Arguments
    ///
    /// * `latency_millis`: latency value to be recorded
    fn record(&mut self, latency_millis: i64);

    /// Number of recorded samples
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Arithmetic mean of recorded samples
    ///
    /// Returns `None` when no sample has been recorded
    fn mean(&self) -> Option<f64>;

    /// Nearest-rank percentile of recorded samples
    ///
    /// # Arguments
    ///
    /// * `quantile`: value in `0.0..=1.0` range, e.g. `0.95` for p95
    fn percentile(&mut self, quantile: f64) -> Option<i64>;

    /// Creates a new empty storage with the same settings
    fn empty(&self) -> Self
    where
        Self: Sized;
}

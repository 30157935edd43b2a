pub use hdrhistogram::{CreationError, Histogram};
use tracing::debug;

use crate::aggregate::LatencyStorage;

/// Keeps latency samples in a high dynamic range histogram
///
/// Memory stays bounded regardless of window size, while percentiles
/// are only precise up to the configured number of significant figures.
/// Every sample is counted: negative values go into the histogram as zero
/// and values above its limit as the limit. Mean is exact.
#[derive(Debug, Clone)]
pub struct HistogramLatencies {
    inner: Histogram<u64>,
    sum: i128,
    count: u64,
}

impl Default for HistogramLatencies {
    fn default() -> Self {
        Self::from_histogram(match Histogram::new(3) {
            Ok(histogram) => histogram,
            Err(_) => unreachable!(),
        })
    }
}

impl HistogramLatencies {
    pub fn with_limit(sigfig: u8, max_value: u64) -> Result<Self, CreationError> {
        Ok(Self::from_histogram(Histogram::new_with_max(max_value, sigfig)?))
    }

    pub fn with_sigfig(sigfig: u8) -> Result<Self, CreationError> {
        Ok(Self::from_histogram(Histogram::new(sigfig)?))
    }

    fn from_histogram(inner: Histogram<u64>) -> Self {
        Self {
            inner,
            sum: 0,
            count: 0,
        }
    }

    pub fn value(&self) -> &Histogram<u64> {
        &self.inner
    }
}

impl LatencyStorage for HistogramLatencies {
    #[inline]
    fn record(&mut self, latency_millis: i64) {
        self.sum += i128::from(latency_millis);
        self.count += 1;

        let value = u64::try_from(latency_millis).unwrap_or(0);
        let saturated = !self.inner.is_auto_resize() && value > self.inner.high();
        if latency_millis < 0 || saturated {
            debug!(latency_value = latency_millis, "Latency value is outside of histogram range");
        }

        self.inner.saturating_record(value);
    }

    fn len(&self) -> u64 {
        self.count
    }

    fn mean(&self) -> Option<f64> {
        match self.count {
            0 => None,
            count => Some(self.sum as f64 / count as f64),
        }
    }

    fn percentile(&mut self, quantile: f64) -> Option<i64> {
        match self.inner.len() {
            0 => None,
            _ => Some(self.inner.value_at_quantile(quantile.clamp(0.0, 1.0)) as i64),
        }
    }

    fn empty(&self) -> Self {
        let mut inner = self.inner.clone();
        inner.clear();

        Self::from_histogram(inner)
    }
}

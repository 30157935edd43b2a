use crate::aggregate::LatencyStorage;

/// Keeps every latency sample of a window
///
/// Produces exact nearest-rank percentiles at the cost of memory proportional
/// to the number of events in the window.
#[derive(Debug, Default, Clone)]
pub struct ExactLatencies {
    values: Vec<i64>,
    sum: i128,
    sorted: bool,
}

impl ExactLatencies {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            sum: 0,
            sorted: false,
        }
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

impl LatencyStorage for ExactLatencies {
    #[inline]
    fn record(&mut self, latency_millis: i64) {
        self.values.push(latency_millis);
        self.sum += latency_millis as i128;
        self.sorted = false;
    }

    fn len(&self) -> u64 {
        self.values.len() as u64
    }

    fn mean(&self) -> Option<f64> {
        match self.values.len() {
            0 => None,
            count => Some(self.sum as f64 / count as f64),
        }
    }

    fn percentile(&mut self, quantile: f64) -> Option<i64> {
        if self.values.is_empty() {
            return None;
        }

        if !self.sorted {
            self.values.sort_unstable();
            self.sorted = true;
        }

        let last = self.values.len() - 1;
        let rank = ((last as f64) * quantile.clamp(0.0, 1.0)) as usize;

        Some(self.values[rank.min(last)])
    }

    fn empty(&self) -> Self {
        Self::default()
    }
}

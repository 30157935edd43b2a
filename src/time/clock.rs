use std::time::{Duration, SystemTime};

use tokio::time::Instant;

/// Wall clock anchored to a monotonic [`Instant`]
///
/// Reported time is the anchor timestamp plus the time elapsed on tokio's clock,
/// so [`tokio::time::pause`] and [`tokio::time::advance`] move it in tests
/// exactly as they move timers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Clock {
    timestamp: Duration,
    instant: Instant,
}

impl Clock {
    /// Anchors clock to the current system time
    pub fn system() -> Self {
        Self {
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default(),
            instant: Instant::now(),
        }
    }

    /// Anchors clock to provided offset from unix epoch at the current instant
    ///
    /// # Example
    /// ```
    /// use logpulse::time::{Clock, Duration, SystemTime};
    ///
    /// #[tokio::main(flavor = "current_thread", start_paused = true)]
    /// async fn main() {
    ///     let clock = Clock::at(Duration::from_secs(120));
    ///     tokio::time::advance(Duration::from_secs(5)).await;
    ///     assert_eq!(
    ///         clock.now(),
    ///         SystemTime::UNIX_EPOCH + Duration::from_secs(125)
    ///     );
    /// }
    /// ```
    pub fn at(timestamp: Duration) -> Self {
        Self {
            timestamp,
            instant: Instant::now(),
        }
    }

    pub fn new(timestamp: Duration, instant: std::time::Instant) -> Self {
        Self {
            timestamp,
            instant: Instant::from_std(instant),
        }
    }

    #[inline]
    pub fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + self.timestamp + self.instant.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

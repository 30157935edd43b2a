use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime};

const NANOS_PER_SEC: u128 = 1_000_000_000;
const SECONDS_PER_MINUTE: u64 = 60;
const MINUTES_PER_HOUR: u64 = 60;
const SECONDS_PER_HOUR: u64 = MINUTES_PER_HOUR * SECONDS_PER_MINUTE;
const HOURS_PER_DAY: u64 = 24;

/// Start of an aggregation window as an offset from unix epoch
///
/// Always aligned to a multiple of the window length it was created with.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStart(Duration);

impl WindowStart {
    /// Truncates moment of time down to the start of its window
    ///
    /// Moments before unix epoch are put into the very first window.
    /// Zero length window keeps the time as is.
    ///
    /// # Example
    /// ```
    /// use logpulse::time::{Duration, SystemTime, WindowStart};
    ///
    /// let observed = SystemTime::UNIX_EPOCH + Duration::from_secs(125);
    ///
    /// assert_eq!(
    ///     WindowStart::truncate(observed, &Duration::from_secs(60)).since_epoch(),
    ///     Duration::from_secs(120)
    /// );
    /// ```
    pub fn truncate(time: SystemTime, window: &Duration) -> Self {
        Self::from_epoch_offset(
            time.duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default(),
            window,
        )
    }

    /// Truncates offset from unix epoch down to the start of its window
    pub fn from_epoch_offset(offset: Duration, window: &Duration) -> Self {
        let window_nanos = window.as_nanos();

        if window_nanos == 0 {
            return Self(offset);
        }

        let offset_nanos = offset.as_nanos();
        let aligned = offset_nanos - offset_nanos % window_nanos;

        Self(Duration::new(
            (aligned / NANOS_PER_SEC) as u64,
            (aligned % NANOS_PER_SEC) as u32,
        ))
    }

    pub fn since_epoch(&self) -> Duration {
        self.0
    }

    pub fn as_system_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + self.0
    }
}

/// Renders UTC wall-clock time of the window as `HH:MM`
impl Display for WindowStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let seconds = self.0.as_secs();

        write!(
            f,
            "{:02}:{:02}",
            seconds / SECONDS_PER_HOUR % HOURS_PER_DAY,
            seconds / SECONDS_PER_MINUTE % MINUTES_PER_HOUR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: &Duration = &Duration::from_secs(60);

    fn at(seconds: u64, millis: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(seconds) + Duration::from_millis(millis)
    }

    #[test]
    fn keeps_time_aligned_to_minute_as_is() {
        assert_eq!(
            WindowStart::truncate(at(1_700_000_040, 0), MINUTE).since_epoch(),
            Duration::from_secs(1_700_000_040)
        );
    }

    #[test]
    fn truncates_down_to_minute_start() {
        assert_eq!(
            WindowStart::truncate(at(1_700_000_099, 999), MINUTE).since_epoch(),
            Duration::from_secs(1_700_000_040)
        );
    }

    #[test]
    fn never_rounds_up_to_next_minute() {
        assert_eq!(
            WindowStart::truncate(at(59, 999), MINUTE),
            WindowStart::truncate(at(0, 0), MINUTE)
        );
    }

    #[test]
    fn truncates_by_custom_window() {
        assert_eq!(
            WindowStart::truncate(at(14, 250), &Duration::from_secs(5)).since_epoch(),
            Duration::from_secs(10)
        );
        assert_eq!(
            WindowStart::truncate(at(14, 250), &Duration::from_millis(100)).since_epoch(),
            Duration::from_millis(14_200)
        );
    }

    #[test]
    fn returns_time_as_is_if_window_is_zero() {
        assert_eq!(
            WindowStart::truncate(at(14, 250), &Duration::ZERO).since_epoch(),
            Duration::from_millis(14_250)
        );
    }

    #[test]
    fn puts_time_before_epoch_into_first_window() {
        let before_epoch = SystemTime::UNIX_EPOCH - Duration::from_secs(30);

        assert_eq!(
            WindowStart::truncate(before_epoch, MINUTE),
            WindowStart::default()
        );
    }

    #[test]
    fn orders_windows_chronologically() {
        assert!(WindowStart::truncate(at(120, 0), MINUTE) > WindowStart::truncate(at(119, 0), MINUTE));
    }

    #[test]
    fn renders_utc_hours_and_minutes() {
        // 2023-11-14 22:14:00 UTC
        assert_eq!(
            WindowStart::truncate(at(1_700_000_059, 0), MINUTE).to_string(),
            "22:14"
        );
        assert_eq!(WindowStart::default().to_string(), "00:00");
    }

    #[test]
    fn renders_last_minute_of_day_and_wraps_to_midnight() {
        let last_minute = 23 * 3_600 + 59 * 60;

        assert_eq!(
            WindowStart::truncate(at(last_minute + 59, 0), MINUTE).to_string(),
            "23:59"
        );
        assert_eq!(
            WindowStart::truncate(at(last_minute + 60, 0), MINUTE).to_string(),
            "00:00"
        );
    }
}

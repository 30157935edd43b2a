use std::fmt::{Display, Formatter};

use crate::time::WindowStart;

/// Finalized statistics of a closed window
///
/// Produced once per window that has seen at least one event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSummary {
    window_start: WindowStart,
    total: u64,
    count_2xx: u64,
    count_4xx: u64,
    count_5xx: u64,
    avg_latency_millis: f64,
    p95_latency_millis: i64,
}

impl WindowSummary {
    pub fn new(
        window_start: WindowStart,
        total: u64,
        count_2xx: u64,
        count_4xx: u64,
        count_5xx: u64,
        avg_latency_millis: f64,
        p95_latency_millis: i64,
    ) -> Self {
        Self {
            window_start,
            total,
            count_2xx,
            count_4xx,
            count_5xx,
            avg_latency_millis,
            p95_latency_millis,
        }
    }

    pub fn window_start(&self) -> WindowStart {
        self.window_start
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count_2xx(&self) -> u64 {
        self.count_2xx
    }

    pub fn count_4xx(&self) -> u64 {
        self.count_4xx
    }

    pub fn count_5xx(&self) -> u64 {
        self.count_5xx
    }

    /// Events with status outside of 2xx, 4xx and 5xx classes
    pub fn unclassified(&self) -> u64 {
        self.total - self.count_2xx - self.count_4xx - self.count_5xx
    }

    pub fn avg_latency_millis(&self) -> f64 {
        self.avg_latency_millis
    }

    pub fn p95_latency_millis(&self) -> i64 {
        self.p95_latency_millis
    }
}

impl Display for WindowSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] Requests={} 2xx={} 4xx={} 5xx={} avg={:.2}ms p95={}ms",
            self.window_start,
            self.total,
            self.count_2xx,
            self.count_4xx,
            self.count_5xx,
            self.avg_latency_millis,
            self.p95_latency_millis
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::time::{Duration, ONE_MINUTE};

    use super::*;

    fn summary() -> WindowSummary {
        WindowSummary::new(
            WindowStart::from_epoch_offset(Duration::from_secs(1_700_000_040), &ONE_MINUTE),
            10,
            6,
            2,
            1,
            12.5,
            40,
        )
    }

    #[test]
    fn counts_statuses_outside_of_known_classes() {
        assert_eq!(summary().unclassified(), 1);
    }

    #[test]
    fn renders_single_report_line() {
        assert_eq!(
            summary().to_string(),
            "[22:14] Requests=10 2xx=6 4xx=2 5xx=1 avg=12.50ms p95=40ms"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_every_field_once() {
        use serde_test::{assert_ser_tokens, Token};

        let summary = WindowSummary::new(WindowStart::default(), 1, 1, 0, 0, 5.0, 5);

        assert_ser_tokens(
            &summary,
            &[
                Token::Struct {
                    name: "WindowSummary",
                    len: 7,
                },
                Token::Str("window_start"),
                Token::NewtypeStruct {
                    name: "WindowStart",
                },
                Token::Struct {
                    name: "Duration",
                    len: 2,
                },
                Token::Str("secs"),
                Token::U64(0),
                Token::Str("nanos"),
                Token::U32(0),
                Token::StructEnd,
                Token::Str("total"),
                Token::U64(1),
                Token::Str("count_2xx"),
                Token::U64(1),
                Token::Str("count_4xx"),
                Token::U64(0),
                Token::Str("count_5xx"),
                Token::U64(0),
                Token::Str("avg_latency_millis"),
                Token::F64(5.0),
                Token::Str("p95_latency_millis"),
                Token::I64(5),
                Token::StructEnd,
            ],
        );
    }
}

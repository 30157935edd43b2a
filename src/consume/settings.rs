use std::time::Duration;

use crate::decode::DecodePolicy;
use crate::time::Clock;

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct BridgeSettings {
    decode_policy: DecodePolicy,
    clock: Clock,
}

impl BridgeSettings {
    pub fn with_decode_policy(self, decode_policy: DecodePolicy) -> Self {
        Self {
            decode_policy,
            ..self
        }
    }

    /// Clock that stamps events with their processing time
    pub fn with_clock(self, clock: Clock) -> Self {
        Self { clock, ..self }
    }

    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode_policy
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            decode_policy: DecodePolicy::default(),
            clock: Clock::system(),
        }
    }
}

/// Backoff between attempts to rejoin consumer group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupervisorSettings {
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl SupervisorSettings {
    pub fn with_initial_backoff(self, initial_backoff: Duration) -> Self {
        Self {
            initial_backoff,
            max_backoff: self.max_backoff.max(initial_backoff),
        }
    }

    /// Upper bound for backoff, never lower than initial one
    pub fn with_max_backoff(self, max_backoff: Duration) -> Self {
        Self {
            max_backoff: max_backoff.max(self.initial_backoff),
            ..self
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_backoff_is_never_below_initial() {
        let settings = SupervisorSettings::default()
            .with_initial_backoff(Duration::from_secs(5))
            .with_max_backoff(Duration::from_secs(1));

        assert_eq!(settings.max_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn initial_backoff_raises_max_backoff() {
        let settings = SupervisorSettings::default().with_initial_backoff(Duration::from_secs(60));

        assert_eq!(settings.initial_backoff(), Duration::from_secs(60));
        assert_eq!(settings.max_backoff(), Duration::from_secs(60));
    }

    #[test]
    fn bridge_defaults_to_lenient_decoding() {
        let settings = BridgeSettings::default();

        assert_eq!(settings.decode_policy(), DecodePolicy::Lenient);
        assert_eq!(
            settings
                .with_decode_policy(DecodePolicy::Strict)
                .decode_policy(),
            DecodePolicy::Strict
        );
    }
}

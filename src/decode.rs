//! Decoding of `key=value` log lines into events.
//!
//! A payload looks like `request_id=1 path=/api status=200 latency=12`,
//! only `status` and `latency` tokens are used, in any order.

use std::borrow::Cow;
use std::num::{IntErrorKind, ParseIntError};
use std::str::{FromStr, Utf8Error};

use thiserror::Error;

const STATUS_KEY: &str = "status";
const LATENCY_KEY: &str = "latency";

/// Single decoded request log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogEvent {
    pub status: u32,
    pub latency_millis: i64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Field `{0}` is missing in payload")]
    MissingField(&'static str),

    #[error("Field `{field}` has non integer value `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Payload is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] Utf8Error),
}

/// How to treat payloads with missing or malformed fields
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodePolicy {
    /// Missing or malformed field becomes zero, payload is never rejected
    ///
    /// Number out of field range saturates to the nearest bound.
    #[default]
    Lenient,
    /// Missing, malformed or out of range field rejects the payload
    Strict,
}

trait NumericField: FromStr<Err = ParseIntError> + Default {
    const MIN: Self;
    const MAX: Self;
}

impl NumericField for u32 {
    const MIN: Self = u32::MIN;
    const MAX: Self = u32::MAX;
}

impl NumericField for i64 {
    const MIN: Self = i64::MIN;
    const MAX: Self = i64::MAX;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct EventDecoder {
    policy: DecodePolicy,
}

impl EventDecoder {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Decodes raw payload
    ///
    /// # Example
    /// ```
    /// use logpulse::decode::{EventDecoder, LogEvent};
    ///
    /// assert_eq!(
    ///     EventDecoder::default().decode(b"request_id=1 path=/api status=200 latency=12"),
    ///     Ok(LogEvent { status: 200, latency_millis: 12 })
    /// );
    /// ```
    pub fn decode(&self, payload: &[u8]) -> Result<LogEvent, DecodeError> {
        let line = match self.policy {
            DecodePolicy::Lenient => String::from_utf8_lossy(payload),
            DecodePolicy::Strict => Cow::Borrowed(std::str::from_utf8(payload)?),
        };

        self.decode_line(&line)
    }

    pub fn decode_line(&self, line: &str) -> Result<LogEvent, DecodeError> {
        let (mut status, mut latency) = (None, None);

        for (key, value) in line
            .split_whitespace()
            .filter_map(|token| token.split_once('='))
        {
            match key {
                STATUS_KEY => status = Some(value),
                LATENCY_KEY => latency = Some(value),
                _ => (),
            }
        }

        Ok(LogEvent {
            status: self.field(STATUS_KEY, status)?,
            latency_millis: self.field(LATENCY_KEY, latency)?,
        })
    }

    fn field<T: NumericField>(
        &self,
        field: &'static str,
        value: Option<&str>,
    ) -> Result<T, DecodeError> {
        let Some(value) = value else {
            return self.lenient_or(T::default(), DecodeError::MissingField(field));
        };

        value.parse().or_else(|error: ParseIntError| {
            let fallback = match error.kind() {
                IntErrorKind::PosOverflow => T::MAX,
                IntErrorKind::NegOverflow => T::MIN,
                _ => T::default(),
            };

            self.lenient_or(
                fallback,
                DecodeError::InvalidNumber {
                    field,
                    value: value.to_owned(),
                },
            )
        })
    }

    fn lenient_or<T>(&self, fallback: T, error: DecodeError) -> Result<T, DecodeError> {
        match self.policy {
            DecodePolicy::Lenient => Ok(fallback),
            DecodePolicy::Strict => Err(error),
        }
    }
}

//! Humane duration strings for event configuration.
//!
//! Accepts a single magnitude plus unit: `"500ms"`, `"30s"`, `"0.5s"`,
//! `"5m"`, `"2h"`. A bare number is seconds. Whitespace around the value is
//! ignored.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{BrawlError, Result};

/// A `std::time::Duration` that deserializes from a humane string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EventDuration(pub Duration);

impl EventDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for EventDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl<'de> Deserialize<'de> for EventDuration {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw)
            .map(EventDuration)
            .map_err(serde::de::Error::custom)
    }
}

/// Parse a duration string like `"30s"` or `"0.5s"`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "empty duration"));
    }

    let unit_start = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (magnitude, unit) = trimmed.split_at(unit_start);

    let value: f64 = magnitude
        .trim()
        .parse()
        .map_err(|_| invalid(input, "magnitude is not a number"))?;
    if value < 0.0 || !value.is_finite() {
        return Err(invalid(input, "magnitude must be a finite non-negative number"));
    }

    let millis = match unit {
        "ms" => value,
        "" | "s" => value * 1_000.0,
        "m" => value * 60_000.0,
        "h" => value * 3_600_000.0,
        other => {
            return Err(invalid(
                input,
                &format!("unknown unit `{other}` (expected ms, s, m, or h)"),
            ));
        }
    };

    Ok(Duration::from_millis(millis.round() as u64))
}

fn invalid(input: &str, reason: &str) -> BrawlError {
    BrawlError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

//! Recording length value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::DurationParseError;

/// Default recording length (10 seconds)
pub const DEFAULT_LENGTH_SECS: u64 = 10;

/// Longest accepted recording length (24 hours)
pub const MAX_LENGTH_SECS: u64 = 24 * 60 * 60;

/// How long a timed recording runs before it is stopped.
///
/// Accepts `90`, `90s`, `1m30s`, `2h` and `1h5m`; the value must be
/// positive and at most 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordingLength {
    secs: u64,
}

impl RecordingLength {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    pub const fn as_std(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for RecordingLength {
    fn default() -> Self {
        Self::from_secs(DEFAULT_LENGTH_SECS)
    }
}

impl FromStr for RecordingLength {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();
        if input.is_empty() {
            return Err(invalid());
        }

        // Bare number means seconds
        if let Ok(secs) = input.parse::<u64>() {
            return match secs {
                1..=MAX_LENGTH_SECS => Ok(Self::from_secs(secs)),
                _ => Err(invalid()),
            };
        }

        let mut total: u64 = 0;
        let mut digits = String::new();
        // Units must appear in descending order: h, m, s
        let mut last_rank = u8::MAX;
        for ch in input.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let (rank, factor) = match ch {
                'h' => (2, 3600),
                'm' => (1, 60),
                's' => (0, 1),
                _ => return Err(invalid()),
            };
            if digits.is_empty() || rank >= last_rank {
                return Err(invalid());
            }
            let value: u64 = digits.parse().map_err(|_| invalid())?;
            total = value
                .checked_mul(factor)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
            digits.clear();
            last_rank = rank;
        }

        if !digits.is_empty() || total == 0 || total > MAX_LENGTH_SECS {
            return Err(invalid());
        }
        Ok(Self::from_secs(total))
    }
}

impl fmt::Display for RecordingLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.secs / 3600;
        let minutes = (self.secs % 3600) / 60;
        let seconds = self.secs % 60;

        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        if seconds > 0 || self.secs == 0 {
            write!(f, "{}s", seconds)?;
        }
        Ok(())
    }
}

use std::{fmt, iter::Sum, ops::Add, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A whole-second duration written the way course listings show it.
///
/// Parses `M:SS` and `H:MM:SS`; displays `m:ss` below an hour and `h:mm:ss`
/// from an hour on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockDuration(pub u64);

impl ClockDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Parse a catalog duration, counting empty or malformed values as zero.
    pub fn parse_or_zero(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// `None` when the total does not fit in a `u64`.
fn clock_secs(h: u64, m: u64, s: u64) -> Option<u64> {
    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

impl FromStr for ClockDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidDuration(s.to_string());
        let parts = s
            .split(':')
            .map(|p| p.trim().parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let secs = match parts.as_slice() {
            [m, s] if *s < 60 => clock_secs(0, *m, *s),
            [h, m, s] if *m < 60 && *s < 60 => clock_secs(*h, *m, *s),
            _ => None,
        };
        secs.map(Self).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        if h > 0 {
            write!(f, "{h}:{m:02}:{s:02}")
        } else {
            write!(f, "{m}:{s:02}")
        }
    }
}

impl Add for ClockDuration {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for ClockDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Format a playhead position in seconds; unknown positions show as `00:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    ClockDuration(seconds.floor() as u64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_hours() {
        assert_eq!("1:30".parse::<ClockDuration>().unwrap().as_secs(), 90);
        assert_eq!("0:45".parse::<ClockDuration>().unwrap().as_secs(), 45);
        assert_eq!("1:02:03".parse::<ClockDuration>().unwrap().as_secs(), 3723);
        assert!("".parse::<ClockDuration>().is_err());
        assert!("1:75".parse::<ClockDuration>().is_err());
        assert!("abc".parse::<ClockDuration>().is_err());
    }

    #[test]
    fn sums_and_displays() {
        let total: ClockDuration = ["1:30", "0:45"]
            .iter()
            .map(|d| ClockDuration::parse_or_zero(d))
            .sum();
        assert_eq!(total.to_string(), "2:15");
        assert_eq!(ClockDuration(3725).to_string(), "1:02:05");
        assert_eq!(ClockDuration::parse_or_zero("").to_string(), "0:00");
    }

    #[test]
    fn oversized_values_count_as_zero() {
        assert!("999999999999999999:00".parse::<ClockDuration>().is_err());
        assert!("9999999999999999:00:00".parse::<ClockDuration>().is_err());
        assert_eq!(
            ClockDuration::parse_or_zero("999999999999999999:00"),
            ClockDuration(0)
        );
        let total = ClockDuration(u64::MAX) + ClockDuration(1);
        assert_eq!(total, ClockDuration(u64::MAX));
    }

    #[test]
    fn clock_handles_unknown_positions() {
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(0.0), "0:00");
    }
}

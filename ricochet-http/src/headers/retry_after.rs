use std::fmt;
use std::str::FromStr;

use crate::error::InvalidArgument;
use crate::headers::HttpDate;

/// The value of a `Retry-After` field: either a delay in seconds
/// or an absolute date.
///
/// Numeric values are kept as integers at set time; anything else is
/// parsed as an HTTP date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAfter {
    /// Retry after this many seconds have elapsed.
    Delay(u64),
    /// Retry after the given instant.
    Date(HttpDate),
}

impl FromStr for RetryAfter {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(seconds) = s.trim().parse::<u64>() {
            return Ok(Self::Delay(seconds));
        }
        s.parse().map(Self::Date)
    }
}

impl fmt::Display for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delay(seconds) => fmt::Display::fmt(seconds, f),
            Self::Date(date) => fmt::Display::fmt(date, f),
        }
    }
}

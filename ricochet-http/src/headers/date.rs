use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use crate::error::InvalidArgument;

/// A timezone-aware instant carried by a date header field
/// (`Date`, `Expires`, `Last-Modified`, `If-Modified-Since`, ...).
///
/// Renders as an RFC 1123 string; parses the three classic HTTP date
/// formats. An *absent* date is expressed by removing the field from the
/// [`Headers`](crate::Headers) map, never by a zero instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HttpDate(SystemTime);

impl HttpDate {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// The wrapped instant.
    #[must_use]
    pub fn instant(&self) -> SystemTime {
        self.0
    }

    /// Seconds elapsed since this instant, saturating to zero
    /// when the instant lies in the future.
    #[must_use]
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.0)
            .unwrap_or(Duration::ZERO)
    }
}

impl From<SystemTime> for HttpDate {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

impl From<HttpDate> for SystemTime {
    fn from(date: HttpDate) -> Self {
        date.0
    }
}

impl FromStr for HttpDate {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        httpdate::parse_http_date(s)
            .map(Self)
            .map_err(|_| InvalidArgument::new(format!("not a valid http date: `{s}`")))
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&httpdate::fmt_http_date(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc1123_round_trip() {
        let date: HttpDate = "Sun, 06 Nov 1994 08:49:37 GMT".parse().unwrap();
        assert_eq!(date.to_string(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn legacy_formats() {
        let rfc1123: HttpDate = "Sun, 06 Nov 1994 08:49:37 GMT".parse().unwrap();
        let rfc850: HttpDate = "Sunday, 06-Nov-94 08:49:37 GMT".parse().unwrap();
        let asctime: HttpDate = "Sun Nov  6 08:49:37 1994".parse().unwrap();
        assert_eq!(rfc1123, rfc850);
        assert_eq!(rfc1123, asctime);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("yesterday".parse::<HttpDate>().is_err());
    }

    #[test]
    fn future_age_is_zero() {
        let date = HttpDate::from(SystemTime::now() + Duration::from_secs(60));
        assert_eq!(date.age(), Duration::ZERO);
    }
}

//! Byte-range negotiation for partial content responses.

use std::fmt;

use crate::headers::{FieldName, Headers};

/// A resolved `Range` request against a resource of known length.
///
/// Resolution can decline (`None`): the request carries no `Range` field,
/// the field is malformed, or an `If-Range` precondition went stale. A
/// declined range is not an error, the response falls back to a full `200`.
///
/// An unsatisfiable range is a different outcome: the field parsed but the
/// bounds cannot be served, which callers surface as `416`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRange {
    start: i64,
    end: i64,
    total: u64,
}

impl RequestRange {
    /// Resolve the `Range` field of `headers` against a resource `total`
    /// bytes long whose current entity tag is `etag`.
    #[must_use]
    pub fn resolve(headers: &Headers, total: u64, etag: &str) -> Option<Self> {
        let range = headers.get_text(&FieldName::Range)?;

        // a stale If-Range abandons the range, not the response
        if let Some(if_range) = headers.get_text(&FieldName::IfRange)
            && if_range.trim() != etag
        {
            return None;
        }

        let (first, last) = range.trim().strip_prefix("bytes=")?.split_once('-')?;
        if !first.bytes().all(|b| b.is_ascii_digit()) || !last.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let eof = total as i64 - 1;
        let (start, end) = match (first.is_empty(), last.is_empty()) {
            (true, true) => return None,
            (false, true) => (first.parse().ok()?, eof),
            // suffix form: the last N bytes of the resource
            (true, false) => (total as i64 - last.parse::<i64>().ok()?, eof),
            (false, false) => (first.parse().ok()?, last.parse().ok()?),
        };

        Some(Self { start, end, total })
    }

    /// Whether the resolved bounds can actually be served.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        !(self.start < 0 || self.start >= self.end || self.end > self.total as i64 - 1)
    }

    /// Whether the range covers the entire resource.
    #[must_use]
    pub fn is_total(&self) -> bool {
        self.start == 0 && self.end == self.total as i64 - 1
    }

    /// First byte position. Only meaningful for a satisfiable range.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.start.max(0) as u64
    }

    /// Amount of bytes covered by the range.
    #[must_use]
    pub fn length(&self) -> u64 {
        (self.end - self.start + 1).max(0) as u64
    }

    /// Amount of bytes to copy from [`offset`](Self::offset), or `None`
    /// when the copy should run to the end of the resource.
    #[must_use]
    pub fn max_length(&self) -> Option<u64> {
        (self.end < self.total as i64).then(|| self.length())
    }
}

impl fmt::Display for RequestRange {
    /// The `Content-Range` form: `bytes {start}-{end}/{total}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

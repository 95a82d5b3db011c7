//! The outbound response model.

use std::fmt;
use std::io;
use std::time::SystemTime;

use crate::Status;
use crate::headers::{Cacheable, FieldName, Headers};

mod body;
pub use body::{Body, StreamProducer};

mod file;
pub use file::{FileResponse, FileResponseOptions};

/// The HTTP protocol version of a response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "1.0",
            Self::Http11 => "1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound HTTP response.
///
/// A response is assembled freely, then *finalized* right before
/// transmission or string rendering: [`finalize`](Self::finalize) is the
/// point where derived header values are computed. Sending writes the
/// status line, the header block and the body to a transport sink.
///
/// # Example
///
/// ```
/// use ricochet_http::{Response, Status};
///
/// let response = Response::new("hello", Status::OK);
/// let mut wire = Vec::new();
/// response.send(&mut wire).unwrap();
/// assert!(wire.starts_with(b"HTTP/1.1 200 OK\r\n"));
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub version: Version,
    body: Body,
}

impl Response {
    /// Create a response. The `Date` field defaults to now when the
    /// headers do not carry one.
    pub fn new(body: impl Into<Body>, status: Status) -> Self {
        Self::with_headers(body, status, Headers::new())
    }

    /// Create a response with preset headers.
    pub fn with_headers(body: impl Into<Body>, status: Status, mut headers: Headers) -> Self {
        if !headers.contains(&FieldName::Date) {
            headers.set(FieldName::Date, SystemTime::now());
        }
        Self {
            status,
            headers,
            version: Version::default(),
            body: body.into(),
        }
    }

    /// A redirect response targeting `location`.
    pub fn redirect(location: impl Into<String>, status: Status) -> Self {
        let mut response = Self::new(Body::None, status);
        response.headers.set(FieldName::Location, location.into());
        response
    }

    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Compute derived header values immediately before transmission.
    ///
    /// The base implementation fills `Content-Length` from the body when
    /// its length is knowable and the field is not already set.
    pub fn finalize(&mut self) {
        if !self.headers.contains(&FieldName::ContentLength)
            && let Some(len) = self.body.len()
            && !self.status.is_empty()
        {
            self.headers.set(FieldName::ContentLength, len);
        }
    }

    /// Finalize a copy of the response and write it to `sink`.
    ///
    /// The body is suppressed for statuses that forbid one. Stream bodies
    /// write their own bytes and receive the response for reference.
    pub fn send(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        let mut response = self.clone();
        response.finalize();
        response.send_head(sink)?;
        response.send_body(sink)
    }

    fn send_head(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        write!(
            sink,
            "HTTP/{} {} {}\r\n{}\r\n",
            self.version,
            self.status.code(),
            self.status.message(),
            self.headers,
        )
    }

    fn send_body(&self, sink: &mut dyn io::Write) -> io::Result<()> {
        if self.status.is_empty() {
            return Ok(());
        }
        match &self.body {
            Body::None => Ok(()),
            Body::Text(text) => sink.write_all(text.as_bytes()),
            Body::Stream(producer) => producer(sink, self),
        }
    }

    /// Whether the response carries a cache validator.
    #[must_use]
    pub fn is_validateable(&self) -> bool {
        self.headers.contains(&FieldName::LastModified) || self.headers.contains(&FieldName::Etag)
    }

    /// Whether a shared cache may store the response.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        if !self.status.is_cacheable() {
            return false;
        }
        if let Some(cache_control) = self.headers.cache_control()
            && (cache_control.no_store || cache_control.cacheable == Some(Cacheable::Private))
        {
            return false;
        }
        self.is_validateable() || self.is_fresh()
    }

    /// Whether the response is still fresh.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.ttl().is_some_and(|ttl| ttl > 0)
    }

    /// Seconds of freshness left, when `max-age` is set.
    #[must_use]
    pub fn ttl(&self) -> Option<i64> {
        let max_age = self.headers.cache_control()?.max_age?;
        Some(max_age as i64 - self.age() as i64)
    }

    /// The age of the response: the explicit `Age` field when present,
    /// seconds elapsed since the `Date` field otherwise.
    #[must_use]
    pub fn age(&self) -> u64 {
        if let Some(age) = self.headers.get_u64(&FieldName::Age) {
            return age;
        }
        self.headers
            .date_field(&FieldName::Date)
            .map(|date| date.age().as_secs())
            .unwrap_or(0)
    }

    /// The `Location` field, if any.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.headers
            .get_text(&FieldName::Location)
            .map(Into::into)
    }

    /// The `Content-Length` field, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers.get_u64(&FieldName::ContentLength)
    }

    /// The `ETag` field, if any.
    #[must_use]
    pub fn etag(&self) -> Option<String> {
        self.headers.get_text(&FieldName::Etag).map(Into::into)
    }
}

impl fmt::Display for Response {
    /// The finalized wire form:
    /// `HTTP/{version} {code} {message}\r\n` + headers + `\r\n` + body.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wire = Vec::new();
        self.send(&mut wire).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::CacheControl;

    #[test]
    fn date_defaults_to_now() {
        let response = Response::new(Body::None, Status::OK);
        assert!(response.headers.contains(&FieldName::Date));
    }

    #[test]
    fn preset_date_is_kept() {
        let mut headers = Headers::new();
        headers.set(FieldName::Date, "Sun, 06 Nov 1994 08:49:37 GMT");
        let response = Response::with_headers(Body::None, Status::OK, headers);
        assert_eq!(
            response
                .headers
                .date_field(&FieldName::Date)
                .unwrap()
                .to_string(),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn finalize_computes_content_length() {
        let mut response = Response::new("hello", Status::OK);
        response.finalize();
        assert_eq!(response.content_length(), Some(5));
    }

    #[test]
    fn explicit_content_length_is_kept() {
        let mut response = Response::new("hello", Status::OK);
        response.headers.set(FieldName::ContentLength, 99u64);
        response.finalize();
        assert_eq!(response.content_length(), Some(99));
    }

    #[test]
    fn wire_form() {
        let mut headers = Headers::new();
        headers.set(FieldName::Date, "Sun, 06 Nov 1994 08:49:37 GMT");
        headers.set(FieldName::ContentType, "text/plain");
        let response = Response::with_headers("hello", Status::OK, headers);
        assert_eq!(
            response.to_string(),
            "HTTP/1.1 200 OK\r\n\
             Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n\
             Content-Type: text/plain\r\n\
             Content-Length: 5\r\n\
             \r\n\
             hello"
        );
    }

    #[test]
    fn empty_status_suppresses_body() {
        let response = Response::new("cached", Status::NOT_MODIFIED);
        let wire = response.to_string();
        assert!(wire.starts_with("HTTP/1.1 304 Not Modified\r\n"));
        assert!(!wire.ends_with("cached"));
    }

    #[test]
    fn stream_body_writes_through() {
        let response = Response::new(
            Body::stream(|sink, _| sink.write_all(b"streamed")),
            Status::OK,
        );
        let wire = response.to_string();
        assert!(wire.ends_with("streamed"));
    }

    #[test]
    fn redirect_sets_location() {
        let response = Response::redirect("/next", Status::FOUND);
        assert_eq!(response.status, Status::FOUND);
        assert_eq!(response.location().as_deref(), Some("/next"));
    }

    #[test]
    fn cache_predicates() {
        let mut response = Response::new("x", Status::OK);
        assert!(!response.is_validateable());

        response.headers.set(FieldName::Etag, "\"abc\"");
        assert!(response.is_validateable());
        assert!(response.is_cacheable());

        let mut cc = CacheControl::new();
        cc.no_store = true;
        response.headers.set(FieldName::CacheControl, cc);
        assert!(!response.is_cacheable());
    }

    #[test]
    fn ttl_from_max_age_and_age() {
        let mut response = Response::new("x", Status::OK);
        response
            .headers
            .set(FieldName::CacheControl, "max-age=60");
        response.headers.set(FieldName::Age, "20");
        assert_eq!(response.ttl(), Some(40));
        assert!(response.is_fresh());

        response.headers.set(FieldName::Age, "90");
        assert_eq!(response.ttl(), Some(-30));
        assert!(!response.is_fresh());
    }
}

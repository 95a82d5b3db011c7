use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::StatusCodeNotValid;

/// An HTTP status: a validated code and its reason phrase.
///
/// The code is guaranteed to be within `100..600`. The reason phrase
/// defaults to the standard text for the code and re-defaults when an
/// explicit message is cleared.
///
/// # Example
///
/// ```
/// use ricochet_http::Status;
///
/// let status: Status = "200 Because I can".parse().unwrap();
/// assert_eq!(status.code(), 200);
/// assert_eq!(status.message(), "Because I can");
///
/// let status = Status::try_from(404).unwrap();
/// assert_eq!(status.to_string(), "404 Not Found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: u16,
    message: Option<Cow<'static, str>>,
}

macro_rules! status_consts {
    ($($(#[$m:meta])* $name:ident = $code:literal;)+) => {
        $(
            $(#[$m])*
            pub const $name: Self = Self {
                code: $code,
                message: None,
            };
        )+
    };
}

impl Status {
    status_consts! {
        /// `100 Continue`
        CONTINUE = 100;
        /// `200 OK`
        OK = 200;
        /// `201 Created`
        CREATED = 201;
        /// `202 Accepted`
        ACCEPTED = 202;
        /// `204 No Content`
        NO_CONTENT = 204;
        /// `206 Partial Content`
        PARTIAL_CONTENT = 206;
        /// `301 Moved Permanently`
        MOVED_PERMANENTLY = 301;
        /// `302 Found`
        FOUND = 302;
        /// `303 See Other`
        SEE_OTHER = 303;
        /// `304 Not Modified`
        NOT_MODIFIED = 304;
        /// `307 Temporary Redirect`
        TEMPORARY_REDIRECT = 307;
        /// `400 Bad Request`
        BAD_REQUEST = 400;
        /// `401 Unauthorized`
        UNAUTHORIZED = 401;
        /// `403 Forbidden`
        FORBIDDEN = 403;
        /// `404 Not Found`
        NOT_FOUND = 404;
        /// `405 Method Not Allowed`
        METHOD_NOT_ALLOWED = 405;
        /// `410 Gone`
        GONE = 410;
        /// `416 Requested Range Not Satisfiable`
        REQUESTED_RANGE_NOT_SATISFIABLE = 416;
        /// `500 Internal Server Error`
        INTERNAL_SERVER_ERROR = 500;
        /// `501 Not Implemented`
        NOT_IMPLEMENTED = 501;
        /// `503 Service Unavailable`
        SERVICE_UNAVAILABLE = 503;
    }

    /// Create a [`Status`] with an explicit reason phrase.
    ///
    /// Fails with [`StatusCodeNotValid`] if the code is outside `100..600`.
    pub fn with_message(
        code: u16,
        message: impl Into<Cow<'static, str>>,
    ) -> Result<Self, StatusCodeNotValid> {
        let mut status = Self::try_from(code)?;
        status.set_message(Some(message.into()));
        Ok(status)
    }

    /// The status code, within `100..600`.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The reason phrase.
    ///
    /// Defaults to the standard reason phrase for the code when no explicit
    /// message was supplied (or after it was cleared).
    #[must_use]
    pub fn message(&self) -> &str {
        match self.message {
            Some(ref message) => message,
            None => reason_phrase(self.code),
        }
    }

    /// Set or clear the explicit reason phrase.
    ///
    /// Clearing re-defaults to the standard phrase.
    pub fn set_message(&mut self, message: Option<Cow<'static, str>>) {
        self.message = message;
    }

    /// Whether the status is informational (1xx).
    #[must_use]
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether the status is successful (2xx).
    #[must_use]
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Whether the status is a redirect (3xx).
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// Whether the status is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// Whether the status is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Whether responses with this status are cacheable by default.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        matches!(self.code, 200 | 203 | 300 | 301 | 302 | 404 | 410)
    }

    /// Whether responses with this status never carry an entity body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.code, 201 | 204 | 304)
    }
}

impl TryFrom<u16> for Status {
    type Error = StatusCodeNotValid;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        if (100..600).contains(&code) {
            Ok(Self {
                code,
                message: None,
            })
        } else {
            Err(StatusCodeNotValid::new(code))
        }
    }
}

impl TryFrom<(u16, &'static str)> for Status {
    type Error = StatusCodeNotValid;

    fn try_from((code, message): (u16, &'static str)) -> Result<Self, Self::Error> {
        Self::with_message(code, message)
    }
}

impl FromStr for Status {
    type Err = StatusCodeNotValid;

    /// Parse a `"### Reason phrase"` string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, message) = match s.split_once(' ') {
            Some((code, message)) if !message.trim().is_empty() => (code, Some(message.trim())),
            _ => (s, None),
        };
        let code: u16 = code.parse().map_err(|_| StatusCodeNotValid::unparsable())?;
        let mut status = Self::try_from(code)?;
        status.set_message(message.map(|m| Cow::Owned(m.to_owned())));
        Ok(status)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message())
    }
}

/// Standard reason phrase for the given code.
fn reason_phrase(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        422 => "Unprocessable Entity",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        assert!(Status::try_from(100).is_ok());
        assert!(Status::try_from(599).is_ok());
        assert!(Status::try_from(99).is_err());
        assert!(Status::try_from(600).is_err());
        assert!(Status::try_from(0).is_err());
    }

    #[test]
    fn default_and_explicit_message() {
        let mut status = Status::try_from(404).unwrap();
        assert_eq!(status.message(), "Not Found");

        status.set_message(Some("Nope".into()));
        assert_eq!(status.message(), "Nope");

        // clearing re-defaults
        status.set_message(None);
        assert_eq!(status.message(), "Not Found");
    }

    #[test]
    fn from_str_with_message() {
        let status: Status = "302 Over there".parse().unwrap();
        assert_eq!(status.code(), 302);
        assert_eq!(status.message(), "Over there");

        let status: Status = "500".parse().unwrap();
        assert_eq!(status.message(), "Internal Server Error");

        assert!("999 Nope".parse::<Status>().is_err());
        assert!("abc".parse::<Status>().is_err());
    }

    #[test]
    fn classification() {
        assert!(Status::CONTINUE.is_informational());
        assert!(Status::OK.is_successful());
        assert!(Status::FOUND.is_redirect());
        assert!(Status::NOT_FOUND.is_client_error());
        assert!(Status::INTERNAL_SERVER_ERROR.is_server_error());
    }

    #[test]
    fn cacheable_allow_list() {
        for code in [200, 203, 300, 301, 302, 404, 410] {
            assert!(Status::try_from(code).unwrap().is_cacheable(), "{code}");
        }
        for code in [201, 206, 303, 500] {
            assert!(!Status::try_from(code).unwrap().is_cacheable(), "{code}");
        }
    }

    #[test]
    fn empty_statuses() {
        for code in [201, 204, 304] {
            assert!(Status::try_from(code).unwrap().is_empty(), "{code}");
        }
        assert!(!Status::OK.is_empty());
    }
}

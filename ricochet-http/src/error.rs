//! The error taxonomy of `ricochet`.
//!
//! Client errors (4xx) and server errors (5xx) are concrete types carrying a
//! default [`Status`] and a default human-readable message, both overridable.
//! They all capture their construction site with [`Location::caller`] so a
//! rescued error can be traced back to its origin (the dispatch pipeline
//! stamps that origin onto the rescued response as a diagnostic header).
//!
//! [`ForceRedirect`] is not a real failure: it is a control-flow signal that
//! the pipeline intercepts and converts into a redirect response.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use crate::Status;

macro_rules! define_http_error {
    ($(
        $(#[$m:meta])*
        $name:ident {
            status: $status:expr,
            message: $message:literal,
        }
    )+) => {
        $(
            $(#[$m])*
            #[derive(Debug)]
            pub struct $name {
                status: Status,
                message: Cow<'static, str>,
                origin: &'static Location<'static>,
            }

            impl $name {
                /// Create the error with its default status and message.
                #[track_caller]
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        status: $status,
                        message: Cow::Borrowed($message),
                        origin: Location::caller(),
                    }
                }

                /// Create the error with a custom message.
                #[track_caller]
                #[must_use]
                pub fn with_message(message: impl Into<Cow<'static, str>>) -> Self {
                    Self {
                        status: $status,
                        message: message.into(),
                        origin: Location::caller(),
                    }
                }

                /// Override the status carried by the error.
                #[must_use]
                pub fn with_status(mut self, status: Status) -> Self {
                    self.status = status;
                    self
                }

                /// The status this error maps to.
                #[must_use]
                pub fn status(&self) -> &Status {
                    &self.status
                }

                /// The message carried by the error.
                #[must_use]
                pub fn message(&self) -> &str {
                    &self.message
                }

                /// Where the error was constructed.
                #[must_use]
                pub fn origin(&self) -> &'static Location<'static> {
                    self.origin
                }
            }

            impl Default for $name {
                #[track_caller]
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.message)
                }
            }

            impl std::error::Error for $name {}
        )+

        /// The construction site of a taxonomy error, if `error` is one.
        #[must_use]
        pub fn origin_of(error: &ricochet_core::error::OpaqueError)
            -> Option<&'static Location<'static>>
        {
            $(
                if let Some(error) = error.downcast_ref::<$name>() {
                    return Some(error.origin());
                }
            )+
            if let Some(error) = error.downcast_ref::<ForceRedirect>() {
                return Some(error.origin());
            }
            if let Some(error) = error.downcast_ref::<MethodNotSupported>() {
                return Some(error.origin());
            }
            None
        }
    };
}

define_http_error! {
    /// No handler produced a response for the request.
    NotFound {
        status: Status::NOT_FOUND,
        message: "The requested URL was not found on this server.",
    }

    /// The resource exists but does not answer to this method.
    MethodNotAllowed {
        status: Status::METHOD_NOT_ALLOWED,
        message: "Method not allowed.",
    }

    /// The request requires an authenticated user.
    AuthenticationRequired {
        status: Status::UNAUTHORIZED,
        message: "The requested URL requires authentication.",
    }

    /// The authenticated user lacks the required permission.
    PermissionRequired {
        status: Status::FORBIDDEN,
        message: "You don't have permission to access the requested URL.",
    }

    /// Generic server-side failure.
    ServerError {
        status: Status::INTERNAL_SERVER_ERROR,
        message: "An internal server error occurred.",
    }

    /// The service is temporarily unable to answer.
    ServiceUnavailable {
        status: Status::SERVICE_UNAVAILABLE,
        message: "The server is currently unavailable.",
    }
}

/// A control-flow signal requesting a redirect.
///
/// Thrown by handlers deep in a dispatch to abort processing and answer
/// with a redirect; the pipeline's rescue step converts it into a redirect
/// response without requiring any rescue hook.
#[derive(Debug)]
pub struct ForceRedirect {
    location: String,
    status: Status,
    origin: &'static Location<'static>,
}

impl ForceRedirect {
    /// Redirect to `location` with the default `302 Found` status.
    #[track_caller]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: Status::FOUND,
            origin: Location::caller(),
        }
    }

    /// Override the redirect status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// The redirect target.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The redirect status.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Where the signal was raised.
    #[must_use]
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }
}

impl fmt::Display for ForceRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redirect to `{}`", self.location)
    }
}

impl std::error::Error for ForceRedirect {}

/// A status code outside the valid `100..600` range was used.
#[derive(Debug)]
pub struct StatusCodeNotValid {
    code: Option<u16>,
}

impl StatusCodeNotValid {
    #[must_use]
    pub(crate) fn new(code: u16) -> Self {
        Self { code: Some(code) }
    }

    #[must_use]
    pub(crate) fn unparsable() -> Self {
        Self { code: None }
    }

    /// The offending code, if it could be parsed at all.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        self.code
    }
}

impl fmt::Display for StatusCodeNotValid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "status code is not valid: {code}"),
            None => f.write_str("status code is not valid"),
        }
    }
}

impl std::error::Error for StatusCodeNotValid {}

/// A request verb outside the supported method set.
#[derive(Debug)]
pub struct MethodNotSupported {
    method: String,
    origin: &'static Location<'static>,
}

impl MethodNotSupported {
    #[track_caller]
    pub(crate) fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            origin: Location::caller(),
        }
    }

    /// The unsupported verb as received.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Where the error was constructed.
    #[must_use]
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }
}

impl fmt::Display for MethodNotSupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method not supported: `{}`", self.method)
    }
}

impl std::error::Error for MethodNotSupported {}

/// A malformed value was assigned to a header field or option.
#[derive(Debug)]
pub struct InvalidArgument {
    message: Cow<'static, str>,
}

impl InvalidArgument {
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InvalidArgument {}

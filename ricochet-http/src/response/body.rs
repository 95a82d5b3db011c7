use std::fmt;
use std::io;
use std::sync::Arc;

use crate::response::Response;

/// A producer writing its own bytes to the transport sink.
pub type StreamProducer = Arc<dyn Fn(&mut dyn io::Write, &Response) -> io::Result<()> + Send + Sync>;

/// The body of a response: absent, a text payload, or a producer that
/// streams its bytes straight to the transport.
#[derive(Clone, Default)]
pub enum Body {
    #[default]
    None,
    Text(String),
    Stream(StreamProducer),
}

impl Body {
    /// A streaming body.
    pub fn stream<F>(producer: F) -> Self
    where
        F: Fn(&mut dyn io::Write, &Response) -> io::Result<()> + Send + Sync + 'static,
    {
        Self::Stream(Arc::new(producer))
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the body is known to carry no bytes. A stream is assumed
    /// non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(text) => text.is_empty(),
            Self::Stream(_) => false,
        }
    }

    /// The byte length of the body, when it is knowable without running
    /// a producer.
    #[must_use]
    pub fn len(&self) -> Option<u64> {
        match self {
            Self::None => Some(0),
            Self::Text(text) => Some(text.len() as u64),
            Self::Stream(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Body::None"),
            Self::Text(text) => f.debug_tuple("Body::Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Body::Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<u64> for Body {
    fn from(value: u64) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Body>> From<Option<T>> for Body {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

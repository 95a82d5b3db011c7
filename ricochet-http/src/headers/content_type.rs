use std::fmt;
use std::str::FromStr;

use crate::error::InvalidArgument;

/// A `Content-Type` field: a MIME type plus an optional `charset` parameter.
///
/// # Example
///
/// ```
/// use ricochet_http::headers::ContentType;
///
/// let ct: ContentType = "text/html; charset=utf-8".parse().unwrap();
/// assert_eq!(ct.mime, "text/html");
/// assert_eq!(ct.charset.as_deref(), Some("utf-8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// The MIME type, e.g. `text/plain`.
    pub mime: String,
    /// The `charset` parameter, if any.
    pub charset: Option<String>,
}

impl ContentType {
    /// A content type without charset parameter.
    pub fn new(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            charset: None,
        }
    }

    /// Attach a `charset` parameter.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

impl From<mime::Mime> for ContentType {
    fn from(mime: mime::Mime) -> Self {
        let charset = mime
            .get_param(mime::CHARSET)
            .map(|charset| charset.as_str().to_owned());
        Self {
            mime: mime.essence_str().to_owned(),
            charset,
        }
    }
}

impl FromStr for ContentType {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let mime = parts
            .next()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .ok_or_else(|| InvalidArgument::new("empty content type"))?;

        let mut charset = None;
        for param in parts {
            if let Some((key, value)) = param.split_once('=')
                && key.trim().eq_ignore_ascii_case("charset")
            {
                charset = Some(value.trim().trim_matches('"').to_owned());
            }
        }

        Ok(Self {
            mime: mime.to_owned(),
            charset,
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime)?;
        if let Some(charset) = &self.charset {
            write!(f, "; charset={charset}")?;
        }
        Ok(())
    }
}

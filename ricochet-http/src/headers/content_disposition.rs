use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::InvalidArgument;

/// The characters that may appear bare in an RFC 5987 extended value;
/// everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// A parameter value with an optional language tag,
/// per RFC 2231 / RFC 5987 extended parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtParam {
    pub value: String,
    /// RFC 5646 language tag, e.g. `en`.
    pub language: Option<String>,
}

impl ExtParam {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
        }
    }

    /// Whether the plain `key="value"` form suffices,
    /// or the `key*=` extended form is required.
    fn needs_ext_form(&self) -> bool {
        self.language.is_some() || !self.value.is_ascii() || self.value.contains('"')
    }

    /// Parse a `charset'language'percent-encoded` extended value.
    fn parse_ext(s: &str) -> Result<Self, InvalidArgument> {
        let mut parts = s.splitn(3, '\'');
        let charset = parts.next().unwrap_or_default();
        let language = parts.next();
        let encoded = parts
            .next()
            .ok_or_else(|| InvalidArgument::new("malformed extended parameter value"))?;

        if !charset.eq_ignore_ascii_case("utf-8") {
            return Err(InvalidArgument::new(format!(
                "unsupported extended parameter charset: `{charset}`"
            )));
        }

        let value = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|_| InvalidArgument::new("extended parameter value is not valid utf-8"))?
            .into_owned();

        Ok(Self {
            value,
            language: language.filter(|l| !l.is_empty()).map(str::to_owned),
        })
    }
}

impl fmt::Display for ExtParam {
    /// The `charset'language'value` extended form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UTF-8'{}'{}",
            self.language.as_deref().unwrap_or_default(),
            utf8_percent_encode(&self.value, ATTR_CHAR)
        )
    }
}

/// A `Content-Disposition` field: a disposition type plus
/// an optional `filename` parameter.
///
/// # Example
///
/// ```
/// use ricochet_http::headers::ContentDisposition;
///
/// let cd = ContentDisposition::attachment("résumé.pdf");
/// assert_eq!(
///     cd.to_string(),
///     "attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition type: `inline`, `attachment`, ...
    pub disposition: String,
    /// The `filename` parameter, if any.
    pub filename: Option<ExtParam>,
}

impl ContentDisposition {
    pub fn new(disposition: impl Into<String>) -> Self {
        Self {
            disposition: disposition.into(),
            filename: None,
        }
    }

    /// An `attachment` disposition carrying a filename.
    pub fn attachment(filename: impl Into<String>) -> Self {
        Self {
            disposition: "attachment".to_owned(),
            filename: Some(ExtParam::new(filename)),
        }
    }
}

impl FromStr for ContentDisposition {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';');
        let disposition = parts
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| InvalidArgument::new("empty content disposition"))?;

        let mut filename = None;
        let mut ext_filename = None;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            match key.trim() {
                key if key.eq_ignore_ascii_case("filename*") => {
                    ext_filename = Some(ExtParam::parse_ext(value.trim())?);
                }
                key if key.eq_ignore_ascii_case("filename") => {
                    filename = Some(ExtParam::new(value.trim().trim_matches('"')));
                }
                _ => {}
            }
        }

        Ok(Self {
            disposition: disposition.to_owned(),
            // the extended form wins over the plain fallback
            filename: ext_filename.or(filename),
        })
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disposition)?;
        if let Some(filename) = &self.filename {
            if filename.needs_ext_form() {
                write!(f, "; filename*={filename}")?;
            } else {
                write!(f, "; filename=\"{}\"", filename.value)?;
            }
        }
        Ok(())
    }
}

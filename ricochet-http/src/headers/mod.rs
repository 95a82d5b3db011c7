//! The typed, ordered header map.
//!
//! [`Headers`] maps a [`FieldName`] to a [`FieldValue`]: either a raw string
//! or one of the structured field types ([`CacheControl`], [`ContentType`],
//! [`ContentDisposition`], [`HttpDate`], [`RetryAfter`]). Raw strings
//! assigned to a recognized field name are coerced into their structured
//! type at set time, so repeated reads observe the same materialized value
//! until the field is replaced.
//!
//! Iteration order is insertion order. Setting a field to an empty value
//! removes it.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

mod cache_control;
pub use cache_control::{CacheControl, Cacheable};

mod content_disposition;
pub use content_disposition::{ContentDisposition, ExtParam};

mod content_type;
pub use content_type::ContentType;

mod date;
pub use date::HttpDate;

mod retry_after;
pub use retry_after::RetryAfter;

/// A header field name.
///
/// Well-known names are closed enum variants; anything else is carried by
/// [`FieldName::Other`] in canonical `Title-Case` form so lookups stay
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldName {
    AcceptRanges,
    Age,
    CacheControl,
    ContentDisposition,
    ContentLength,
    ContentRange,
    ContentType,
    Date,
    Etag,
    Expires,
    IfModifiedSince,
    IfNoneMatch,
    IfRange,
    IfUnmodifiedSince,
    LastModified,
    Location,
    Range,
    Referer,
    RetryAfter,
    UserAgent,
    XForwardedFor,
    /// Any other field, in canonical `Title-Case` form.
    Other(String),
}

impl FieldName {
    /// The canonical wire form of the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AcceptRanges => "Accept-Ranges",
            Self::Age => "Age",
            Self::CacheControl => "Cache-Control",
            Self::ContentDisposition => "Content-Disposition",
            Self::ContentLength => "Content-Length",
            Self::ContentRange => "Content-Range",
            Self::ContentType => "Content-Type",
            Self::Date => "Date",
            Self::Etag => "ETag",
            Self::Expires => "Expires",
            Self::IfModifiedSince => "If-Modified-Since",
            Self::IfNoneMatch => "If-None-Match",
            Self::IfRange => "If-Range",
            Self::IfUnmodifiedSince => "If-Unmodified-Since",
            Self::LastModified => "Last-Modified",
            Self::Location => "Location",
            Self::Range => "Range",
            Self::Referer => "Referer",
            Self::RetryAfter => "Retry-After",
            Self::UserAgent => "User-Agent",
            Self::XForwardedFor => "X-Forwarded-For",
            Self::Other(name) => name,
        }
    }

    /// Whether raw values assigned to this name coerce into a structured
    /// field type.
    fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::CacheControl
                | Self::ContentDisposition
                | Self::ContentType
                | Self::Date
                | Self::Expires
                | Self::IfModifiedSince
                | Self::IfUnmodifiedSince
                | Self::LastModified
                | Self::RetryAfter
        )
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "accept-ranges" => Self::AcceptRanges,
            "age" => Self::Age,
            "cache-control" => Self::CacheControl,
            "content-disposition" => Self::ContentDisposition,
            "content-length" => Self::ContentLength,
            "content-range" => Self::ContentRange,
            "content-type" => Self::ContentType,
            "date" => Self::Date,
            "etag" => Self::Etag,
            "expires" => Self::Expires,
            "if-modified-since" => Self::IfModifiedSince,
            "if-none-match" => Self::IfNoneMatch,
            "if-range" => Self::IfRange,
            "if-unmodified-since" => Self::IfUnmodifiedSince,
            "last-modified" => Self::LastModified,
            "location" => Self::Location,
            "range" => Self::Range,
            "referer" => Self::Referer,
            "retry-after" => Self::RetryAfter,
            "user-agent" => Self::UserAgent,
            "x-forwarded-for" => Self::XForwardedFor,
            _ => Self::Other(title_case(name)),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a header field: a raw string or a structured field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Raw(String),
    CacheControl(CacheControl),
    ContentDisposition(ContentDisposition),
    ContentType(ContentType),
    Date(HttpDate),
    RetryAfter(RetryAfter),
}

impl FieldValue {
    /// The wire form of the value.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Raw(value) => Cow::Borrowed(value),
            Self::CacheControl(value) => Cow::Owned(value.to_string()),
            Self::ContentDisposition(value) => Cow::Owned(value.to_string()),
            Self::ContentType(value) => Cow::Owned(value.to_string()),
            Self::Date(value) => Cow::Owned(value.to_string()),
            Self::RetryAfter(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Whether the wire form of the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(value) => value.is_empty(),
            Self::CacheControl(value) => value == &CacheControl::default(),
            _ => false,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_owned())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<CacheControl> for FieldValue {
    fn from(value: CacheControl) -> Self {
        Self::CacheControl(value)
    }
}

impl From<ContentDisposition> for FieldValue {
    fn from(value: ContentDisposition) -> Self {
        Self::ContentDisposition(value)
    }
}

impl From<ContentType> for FieldValue {
    fn from(value: ContentType) -> Self {
        Self::ContentType(value)
    }
}

impl From<HttpDate> for FieldValue {
    fn from(value: HttpDate) -> Self {
        Self::Date(value)
    }
}

impl From<std::time::SystemTime> for FieldValue {
    fn from(value: std::time::SystemTime) -> Self {
        Self::Date(value.into())
    }
}

impl From<RetryAfter> for FieldValue {
    fn from(value: RetryAfter) -> Self {
        Self::RetryAfter(value)
    }
}

/// An ordered mapping of header field names to typed values.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Headers {
    fields: IndexMap<FieldName, FieldValue>,
}

impl Headers {
    /// An empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build headers from a CGI-style environment map.
    ///
    /// When the map looks like a raw transport environment (it carries a
    /// `REQUEST_URI` marker), only `HTTP_`-prefixed keys are considered.
    /// Otherwise `HTTP_`-prefixed keys are normalized the same way and any
    /// other key passes through as an already-named field.
    #[must_use]
    pub fn from_env(env: &IndexMap<String, String>) -> Self {
        let is_transport_env = env.contains_key("REQUEST_URI");
        let mut headers = Self::new();
        for (key, value) in env {
            let name = match key.strip_prefix("HTTP_") {
                Some(stripped) => normalize_env_key(stripped),
                None if is_transport_env => continue,
                None => key.clone(),
            };
            headers.set(FieldName::from(name.as_str()), value.as_str());
        }
        headers
    }

    /// Set a field, coercing raw values assigned to recognized names into
    /// their structured type.
    ///
    /// Setting an empty value removes the field.
    pub fn set(&mut self, name: FieldName, value: impl Into<FieldValue>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.shift_remove(&name);
            return;
        }
        let value = match value {
            FieldValue::Raw(raw) if name.is_structured() => coerce(&name, raw),
            value => value,
        };
        self.fields.insert(name, value);
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, name: &FieldName) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, name: &FieldName) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get the wire form of a field value.
    #[must_use]
    pub fn get_text(&self, name: &FieldName) -> Option<Cow<'_, str>> {
        self.fields.get(name).map(FieldValue::as_text)
    }

    /// Get a field value parsed as an integer.
    #[must_use]
    pub fn get_u64(&self, name: &FieldName) -> Option<u64> {
        match self.fields.get(name)? {
            FieldValue::Raw(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// The structured `Cache-Control` field, if set.
    #[must_use]
    pub fn cache_control(&self) -> Option<&CacheControl> {
        match self.fields.get(&FieldName::CacheControl)? {
            FieldValue::CacheControl(value) => Some(value),
            _ => None,
        }
    }

    /// Modify the structured `Cache-Control` field in place,
    /// materializing an empty one when absent.
    pub fn modify_cache_control(&mut self, modify: impl FnOnce(&mut CacheControl)) {
        let entry = self
            .fields
            .entry(FieldName::CacheControl)
            .or_insert_with(|| FieldValue::CacheControl(CacheControl::new()));
        let mut value = match std::mem::replace(entry, FieldValue::Raw(String::new())) {
            FieldValue::CacheControl(value) => value,
            _ => CacheControl::new(),
        };
        modify(&mut value);
        *entry = FieldValue::CacheControl(value);
    }

    /// The structured `Content-Type` field, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&ContentType> {
        match self.fields.get(&FieldName::ContentType)? {
            FieldValue::ContentType(value) => Some(value),
            _ => None,
        }
    }

    /// The structured `Content-Disposition` field, if set.
    #[must_use]
    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        match self.fields.get(&FieldName::ContentDisposition)? {
            FieldValue::ContentDisposition(value) => Some(value),
            _ => None,
        }
    }

    /// The date carried by the given field, if set and well-formed.
    #[must_use]
    pub fn date_field(&self, name: &FieldName) -> Option<HttpDate> {
        match self.fields.get(name)? {
            FieldValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether the field is present.
    #[must_use]
    pub fn contains(&self, name: &FieldName) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter()
    }

    /// The amount of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the map holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a FieldName, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, FieldName, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Headers {
    /// The wire form of the header block: one `Name: value\r\n` line per
    /// field, fields with an empty string form suppressed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.fields {
            let text = value.as_text();
            if text.is_empty() {
                continue;
            }
            write!(f, "{name}: {text}\r\n")?;
        }
        Ok(())
    }
}

/// Coerce a raw string assigned to a structured field name.
///
/// Failures keep the raw value: a malformed inbound header should not take
/// the whole request down, reads through the typed accessors simply see
/// nothing.
fn coerce(name: &FieldName, raw: String) -> FieldValue {
    match name {
        FieldName::CacheControl => match raw.parse::<CacheControl>() {
            Ok(value) => FieldValue::CacheControl(value),
            Err(never) => match never {},
        },
        FieldName::ContentDisposition => match raw.parse::<ContentDisposition>() {
            Ok(value) => FieldValue::ContentDisposition(value),
            Err(error) => {
                tracing::trace!("invalid Content-Disposition `{raw}`: {error}");
                FieldValue::Raw(raw)
            }
        },
        FieldName::ContentType => match raw.parse::<ContentType>() {
            Ok(value) => FieldValue::ContentType(value),
            Err(error) => {
                tracing::trace!("invalid Content-Type `{raw}`: {error}");
                FieldValue::Raw(raw)
            }
        },
        FieldName::RetryAfter => match raw.parse::<RetryAfter>() {
            Ok(value) => FieldValue::RetryAfter(value),
            Err(error) => {
                tracing::trace!("invalid Retry-After `{raw}`: {error}");
                FieldValue::Raw(raw)
            }
        },
        FieldName::IfModifiedSince => {
            // some legacy clients append a `;length=...` suffix
            let date = match raw.split_once(';') {
                Some((date, suffix)) if suffix.trim_start().starts_with("length=") => date,
                _ => raw.as_str(),
            };
            parse_date_or_raw(date.trim().to_owned())
        }
        FieldName::Date
        | FieldName::Expires
        | FieldName::IfUnmodifiedSince
        | FieldName::LastModified => parse_date_or_raw(raw),
        _ => FieldValue::Raw(raw),
    }
}

fn parse_date_or_raw(raw: String) -> FieldValue {
    match raw.parse::<HttpDate>() {
        Ok(date) => FieldValue::Date(date),
        Err(error) => {
            tracing::trace!("invalid date field `{raw}`: {error}");
            FieldValue::Raw(raw)
        }
    }
}

/// `CONTENT_TYPE` -> `Content-Type`.
fn normalize_env_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for (i, segment) in key.split('_').enumerate() {
        if i > 0 {
            name.push('-');
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.extend(chars.flat_map(char::to_lowercase));
        }
    }
    name
}

/// `content-type` -> `Content-Type`.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split('-').enumerate() {
        if i > 0 {
            out.push('-');
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(char::to_lowercase));
        }
    }
    out
}

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::InvalidArgument;

/// The tri-state `public`/`private`/`no-cache` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cacheable {
    Public,
    Private,
    NoCache,
}

impl Cacheable {
    /// The bare directive name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::NoCache => "no-cache",
        }
    }
}

impl FromStr for Cacheable {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "public" => Self::Public,
            "private" => Self::Private,
            "no-cache" => Self::NoCache,
            // legacy alias kept from the previous generation of the API
            "false" => Self::NoCache,
            _ => {
                return Err(InvalidArgument::new(format!(
                    "`cacheable` must be one of public/private/no-cache, got `{s}`"
                )));
            }
        })
    }
}

impl fmt::Display for Cacheable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decomposed `Cache-Control` directive set.
///
/// Parsing never fails: known directives land in their typed slot,
/// anything else is preserved under [`extensions`](Self::extensions) so a
/// round-trip loses nothing.
///
/// # Example
///
/// ```
/// use ricochet_http::headers::CacheControl;
///
/// let cc: CacheControl = "public, no-store, max-age=0".parse().unwrap();
/// assert!(cc.no_store);
/// assert_eq!(cc.max_age, Some(0));
/// assert_eq!(cc.to_string(), "public, no-store, max-age=0");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheControl {
    /// `public` / `private` / `no-cache`, if any.
    pub cacheable: Option<Cacheable>,
    pub no_store: bool,
    pub no_transform: bool,
    pub only_if_cached: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    /// `max-age=N`, in seconds. `Some(0)` is meaningful and distinct
    /// from absent.
    pub max_age: Option<u64>,
    /// `s-maxage=N`, in seconds.
    pub s_maxage: Option<u64>,
    /// `max-stale=N`, in seconds.
    pub max_stale: Option<u64>,
    /// `min-fresh=N`, in seconds.
    pub min_fresh: Option<u64>,
    /// Directives this type does not know about, preserved verbatim.
    pub extensions: IndexMap<String, Option<String>>,
}

impl CacheControl {
    /// An empty directive set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the directives of `value` on top of the current state.
    ///
    /// Tokens are comma-separated and trimmed; `key=value` values that
    /// look numeric are coerced for the known TTL directives.
    pub fn modify(&mut self, value: &str) {
        for token in value.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token {
                "public" => self.cacheable = Some(Cacheable::Public),
                "private" => self.cacheable = Some(Cacheable::Private),
                "no-cache" => self.cacheable = Some(Cacheable::NoCache),
                "no-store" => self.no_store = true,
                "no-transform" => self.no_transform = true,
                "only-if-cached" => self.only_if_cached = true,
                "must-revalidate" => self.must_revalidate = true,
                "proxy-revalidate" => self.proxy_revalidate = true,
                _ => match token.split_once('=') {
                    Some((key, value)) => {
                        let value = value.trim().trim_matches('"');
                        match (key.trim(), value.parse::<u64>()) {
                            ("max-age", Ok(seconds)) => self.max_age = Some(seconds),
                            ("s-maxage", Ok(seconds)) => self.s_maxage = Some(seconds),
                            ("max-stale", Ok(seconds)) => self.max_stale = Some(seconds),
                            ("min-fresh", Ok(seconds)) => self.min_fresh = Some(seconds),
                            (key, _) => {
                                self.extensions
                                    .insert(key.to_owned(), Some(value.to_owned()));
                            }
                        }
                    }
                    None => {
                        self.extensions.insert(token.to_owned(), None);
                    }
                },
            }
        }
    }

    /// Set the `cacheable` directive from its string form.
    ///
    /// `"false"` is accepted as a legacy alias for `"no-cache"`; anything
    /// outside the enumerated values fails with [`InvalidArgument`].
    pub fn set_cacheable(&mut self, value: Option<&str>) -> Result<(), InvalidArgument> {
        self.cacheable = match value {
            Some(value) => Some(value.parse()?),
            None => None,
        };
        Ok(())
    }
}

impl FromStr for CacheControl {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cache_control = Self::new();
        cache_control.modify(s);
        Ok(cache_control)
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut write = |directive: &dyn fmt::Display| -> fmt::Result {
            if first {
                first = false;
            } else {
                f.write_str(", ")?;
            }
            directive.fmt(f)
        };

        if let Some(cacheable) = &self.cacheable {
            write(cacheable)?;
        }
        for (flag, name) in [
            (self.no_store, "no-store"),
            (self.no_transform, "no-transform"),
            (self.only_if_cached, "only-if-cached"),
            (self.must_revalidate, "must-revalidate"),
            (self.proxy_revalidate, "proxy-revalidate"),
        ] {
            if flag {
                write(&name)?;
            }
        }
        for (seconds, name) in [
            (self.max_age, "max-age"),
            (self.s_maxage, "s-maxage"),
            (self.max_stale, "max-stale"),
            (self.min_fresh, "min-fresh"),
        ] {
            if let Some(seconds) = seconds {
                write(&format_args!("{name}={seconds}"))?;
            }
        }
        for (key, value) in &self.extensions {
            match value {
                Some(value) => write(&format_args!("{key}={value}"))?,
                None => write(key)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> CacheControl {
        s.parse().unwrap()
    }

    #[test]
    fn round_trip_is_order_stable() {
        let source = "public, no-store, max-age=0";
        assert_eq!(parse(source).to_string(), source);
    }

    #[test]
    fn directive_decomposition() {
        let cc = parse("private, must-revalidate, max-age=600, s-maxage=30");
        assert_eq!(cc.cacheable, Some(Cacheable::Private));
        assert!(cc.must_revalidate);
        assert_eq!(cc.max_age, Some(600));
        assert_eq!(cc.s_maxage, Some(30));
        assert!(!cc.no_store);
    }

    #[test]
    fn unknown_directives_survive_in_extensions() {
        let cc = parse("no-cache, immutable, community=UCI");
        assert_eq!(cc.cacheable, Some(Cacheable::NoCache));
        assert_eq!(cc.extensions.get("immutable"), Some(&None));
        assert_eq!(
            cc.extensions.get("community"),
            Some(&Some("UCI".to_owned()))
        );
        assert_eq!(cc.to_string(), "no-cache, immutable, community=UCI");
    }

    #[test]
    fn quoted_numeric_value() {
        assert_eq!(parse("max-age=\"200\"").max_age, Some(200));
    }

    #[test]
    fn cacheable_validation() {
        let mut cc = CacheControl::new();
        cc.set_cacheable(Some("public")).unwrap();
        assert_eq!(cc.cacheable, Some(Cacheable::Public));

        // legacy alias
        cc.set_cacheable(Some("false")).unwrap();
        assert_eq!(cc.cacheable, Some(Cacheable::NoCache));

        assert!(cc.set_cacheable(Some("sometimes")).is_err());

        cc.set_cacheable(None).unwrap();
        assert_eq!(cc.cacheable, None);
    }

    #[test]
    fn zero_max_age_renders() {
        let mut cc = CacheControl::new();
        cc.max_age = Some(0);
        assert_eq!(cc.to_string(), "max-age=0");
    }

    #[test]
    fn empty_renders_empty() {
        assert_eq!(CacheControl::new().to_string(), "");
    }
}

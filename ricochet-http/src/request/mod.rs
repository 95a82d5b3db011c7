//! The inbound request model.
//!
//! A [`Request`] is built once, either from a transport [`Env`] or from a
//! typed [`RequestOptions`] bag, and is immutable by convention: derived
//! requests are produced with [`Request::with`], never by mutating the
//! original.

use std::borrow::Cow;
use std::net::IpAddr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

use ricochet_core::Context;

use crate::Method;
use crate::error::MethodNotSupported;
use crate::headers::{FieldName, Headers};

mod files;
pub use files::{File, FileList};

mod options;
pub use options::RequestOptions;

/// A parameter set: ordered string keys to string values.
pub type Params = IndexMap<String, String>;

/// The transport environment: a read-only snapshot of CGI-style metadata
/// (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*`, ...).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Env {
    vars: IndexMap<String, String>,
}

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.shift_remove(key);
    }

    #[must_use]
    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }
}

impl From<IndexMap<String, String>> for Env {
    fn from(vars: IndexMap<String, String>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// An inbound HTTP request.
#[derive(Debug)]
pub struct Request {
    env: Env,
    headers: Headers,
    path_params: Params,
    request_params: Params,
    query_params: Params,
    params: OnceLock<Params>,
    files: FileList,
    context: Context,
}

impl Request {
    /// Build a request from a transport environment.
    ///
    /// Headers are extracted from the `HTTP_*` keys and the query string,
    /// when present, is parsed into query parameters.
    #[must_use]
    pub fn from_env(env: Env) -> Self {
        let headers = Headers::from_env(env.vars());
        let query_params = env
            .get("QUERY_STRING")
            .map(parse_query_string)
            .unwrap_or_default();
        Self {
            env,
            headers,
            path_params: Params::new(),
            request_params: Params::new(),
            query_params,
            params: OnceLock::new(),
            files: FileList::new(),
            context: Context::new(),
        }
    }

    /// Build a synthetic request from typed options.
    #[must_use]
    pub fn new(options: RequestOptions) -> Self {
        let mut request = Self {
            env: Env::new(),
            headers: Headers::new(),
            path_params: Params::new(),
            request_params: Params::new(),
            query_params: Params::new(),
            params: OnceLock::new(),
            files: FileList::new(),
            context: Context::new(),
        };
        request.apply(options);
        request
    }

    /// Build a GET request targeting `uri`.
    #[must_use]
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self::new(RequestOptions::default().uri(uri))
    }

    /// Derive a request: clone, then reapply `options` on the copy.
    ///
    /// The original is never mutated and the derived request recomputes
    /// its unified parameters on first use.
    #[must_use]
    pub fn with(&self, options: RequestOptions) -> Self {
        let mut next = Self {
            env: self.env.clone(),
            headers: self.headers.clone(),
            path_params: self.path_params.clone(),
            request_params: self.request_params.clone(),
            query_params: self.query_params.clone(),
            params: OnceLock::new(),
            files: self.files.clone(),
            context: self.context.clone(),
        };
        next.apply(options);
        next
    }

    fn apply(&mut self, options: RequestOptions) {
        options.write_env(&mut self.env);

        match options.headers {
            Some(headers) => self.headers = headers,
            None => {
                // env-mapped options that are header fields
                if let Some(value) = &options.cache_control {
                    self.headers.set(FieldName::CacheControl, value.as_str());
                }
                if let Some(value) = &options.referer {
                    self.headers.set(FieldName::Referer, value.as_str());
                }
                if let Some(value) = &options.user_agent {
                    self.headers.set(FieldName::UserAgent, value.as_str());
                }
            }
        }

        if let Some(params) = options.path_params {
            self.path_params = params;
        }
        if let Some(params) = options.request_params {
            self.request_params = params;
        }
        match options.query_params {
            Some(params) => self.query_params = params,
            None if options.uri.is_some() || self.query_params.is_empty() => {
                self.query_params = self
                    .env
                    .get("QUERY_STRING")
                    .map(parse_query_string)
                    .unwrap_or_default();
            }
            None => {}
        }
        if let Some(files) = options.files {
            self.files = files;
        }
    }

    /// The request method.
    ///
    /// Resolved from the environment, defaulting to GET. A `_method` body
    /// parameter overrides the method, but only when the raw method is
    /// POST. An unrecognized method name is an error, not a default.
    pub fn method(&self) -> Result<Method, MethodNotSupported> {
        let method: Method = self.env.get("REQUEST_METHOD").unwrap_or("GET").parse()?;
        if method == Method::Post
            && let Some(next) = self.request_params.get("_method").filter(|m| !m.is_empty())
        {
            return next.to_uppercase().parse();
        }
        Ok(method)
    }

    /// Whether the resolved method is GET.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method().ok() == Some(Method::Get)
    }

    /// Whether the resolved method is POST.
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method().ok() == Some(Method::Post)
    }

    /// Whether the resolved method is HEAD.
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method().ok() == Some(Method::Head)
    }

    /// Whether the resolved method has read-only semantics.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.method().is_ok_and(|method| method.is_safe())
    }

    /// Whether the resolved method is idempotent.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        self.method().is_ok_and(|method| method.is_idempotent())
    }

    /// The request URI, path and query string included.
    #[must_use]
    pub fn uri(&self) -> &str {
        self.env.get("REQUEST_URI").unwrap_or("/")
    }

    /// The path component of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        let uri = self.uri();
        uri.split_once('?').map_or(uri, |(path, _)| path)
    }

    /// The raw query string, if any.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.env.get("QUERY_STRING")
    }

    /// The advertised body length, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.env.get("CONTENT_LENGTH")?.trim().parse().ok()
    }

    /// The `Referer` field, if any.
    #[must_use]
    pub fn referer(&self) -> Option<Cow<'_, str>> {
        self.headers.get_text(&FieldName::Referer)
    }

    /// The `User-Agent` field, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<Cow<'_, str>> {
        self.headers.get_text(&FieldName::UserAgent)
    }

    /// The remote address: the first `X-Forwarded-For` entry when present,
    /// the transport peer address otherwise, loopback as a last resort.
    #[must_use]
    pub fn ip(&self) -> String {
        if let Some(forwarded) = self.headers.get_text(&FieldName::XForwardedFor)
            && let Some(first) = forwarded.split(',').next()
        {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
        self.env.get("REMOTE_ADDR").unwrap_or("::1").to_owned()
    }

    /// Whether the request originates from the local host.
    #[must_use]
    pub fn is_local(&self) -> bool {
        match self.ip().parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => ip.is_loopback(),
            Ok(IpAddr::V6(ip)) => {
                ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
            }
            Err(_) => false,
        }
    }

    /// Whether the request was made with `XMLHttpRequest`.
    #[must_use]
    pub fn is_xhr(&self) -> bool {
        self.env
            .get("HTTP_X_REQUESTED_WITH")
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    #[must_use]
    pub fn request_params(&self) -> &Params {
        &self.request_params
    }

    #[must_use]
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// The unified parameters, computed once per request instance.
    ///
    /// Later layers win on key collision: query parameters override
    /// request parameters override path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        self.params.get_or_init(|| {
            let mut params = self.path_params.clone();
            for (key, value) in &self.request_params {
                params.insert(key.clone(), value.clone());
            }
            for (key, value) in &self.query_params {
                params.insert(key.clone(), value.clone());
            }
            params
        })
    }

    /// Look up a unified parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params().get(name).map(String::as_str)
    }

    #[must_use]
    pub fn files(&self) -> &FileList {
        &self.files
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

/// Parse an URL-encoded query string. `+` decodes to a space and keys
/// without `=` map to the empty string.
fn parse_query_string(query: &str) -> Params {
    let mut params = Params::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode_component(key), decode_component(value));
    }
    params
}

fn decode_component(component: &str) -> String {
    let component = component.replace('+', " ");
    percent_decode_str(&component)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_extracts_headers_and_query() {
        let env: Env = [
            ("REQUEST_METHOD", "GET"),
            ("REQUEST_URI", "/articles?page=2&tag=rust"),
            ("QUERY_STRING", "page=2&tag=rust"),
            ("HTTP_USER_AGENT", "test/1.0"),
            ("REMOTE_ADDR", "192.0.2.7"),
        ]
        .into_iter()
        .collect();

        let request = Request::from_env(env);
        assert_eq!(request.method().unwrap(), Method::Get);
        assert_eq!(request.path(), "/articles");
        assert_eq!(request.user_agent().as_deref(), Some("test/1.0"));
        assert_eq!(request.param("page"), Some("2"));
        assert_eq!(request.ip(), "192.0.2.7");
        assert!(!request.is_local());
    }

    #[test]
    fn uri_option_populates_query_params() {
        let request = Request::from_uri("/search?q=hello+world&lang=fr");
        assert_eq!(request.param("q"), Some("hello world"));
        assert_eq!(request.param("lang"), Some("fr"));
        assert_eq!(request.path(), "/search");
    }

    #[test]
    fn params_precedence_query_over_request_over_path() {
        let request = Request::new(
            RequestOptions::default()
                .path_params([("id", "path"), ("a", "1")])
                .request_params([("id", "request"), ("b", "2")])
                .query_params([("id", "query"), ("c", "3")]),
        );
        assert_eq!(request.param("id"), Some("query"));
        assert_eq!(request.param("a"), Some("1"));
        assert_eq!(request.param("b"), Some("2"));
        assert_eq!(request.param("c"), Some("3"));
    }

    #[test]
    fn method_override_applies_only_to_post() {
        let request = Request::new(
            RequestOptions::default()
                .method(Method::Post)
                .request_params([("_method", "delete")]),
        );
        assert_eq!(request.method().unwrap(), Method::Delete);

        let request = Request::new(
            RequestOptions::default()
                .method(Method::Get)
                .request_params([("_method", "delete")]),
        );
        assert_eq!(request.method().unwrap(), Method::Get);
    }

    #[test]
    fn invalid_method_override_is_an_error() {
        let request = Request::new(
            RequestOptions::default()
                .method(Method::Post)
                .request_params([("_method", "TELEPORT")]),
        );
        assert!(request.method().is_err());
    }

    #[test]
    fn with_derives_without_mutating_the_original() {
        let original = Request::from_uri("/a?x=1");
        let derived = original.with(RequestOptions::default().uri("/b?x=2").method(Method::Put));

        assert_eq!(original.uri(), "/a?x=1");
        assert_eq!(original.param("x"), Some("1"));
        assert_eq!(original.method().unwrap(), Method::Get);

        assert_eq!(derived.uri(), "/b?x=2");
        assert_eq!(derived.param("x"), Some("2"));
        assert_eq!(derived.method().unwrap(), Method::Put);
    }

    #[test]
    fn forwarded_ip_wins_and_loopback_detection() {
        let mut headers = Headers::new();
        headers.set(FieldName::XForwardedFor, "203.0.113.9, 10.0.0.1");
        let request = Request::new(RequestOptions::default().headers(headers).ip("127.0.0.1"));
        assert_eq!(request.ip(), "203.0.113.9");

        let request = Request::new(RequestOptions::default().ip("127.0.0.3"));
        assert!(request.is_local());

        let request = Request::new(RequestOptions::default().ip("::ffff:127.0.0.1"));
        assert!(request.is_local());

        let request = Request::new(RequestOptions::default().is_local(true));
        assert!(request.is_local());
    }

    #[test]
    fn xhr_flag() {
        let request = Request::new(RequestOptions::default().is_xhr(true));
        assert!(request.is_xhr());
        assert!(!Request::from_uri("/").is_xhr());
    }

    #[test]
    fn method_predicates() {
        let get = Request::from_uri("/");
        assert!(get.is_get());
        assert!(get.is_safe());
        assert!(get.is_idempotent());
        assert!(!get.is_post());
        assert!(!get.is_head());

        let post = Request::new(RequestOptions::default().method(Method::Post));
        assert!(post.is_post());
        assert!(!post.is_safe());
        assert!(!post.is_idempotent());

        assert!(Request::new(RequestOptions::default().method(Method::Head)).is_head());
    }
}

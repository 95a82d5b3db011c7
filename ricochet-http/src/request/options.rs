//! Typed construction options for synthetic requests.

use indexmap::IndexMap;

use crate::Method;
use crate::headers::Headers;
use crate::request::{Env, FileList, Params};

/// Options for building a [`Request`](crate::Request) without a transport
/// environment, or for deriving one request from another.
///
/// Each option either lands on a request field directly (params, files,
/// headers) or on its synthetic environment key. The closed set of fields
/// makes an unknown option a compile-time error rather than a runtime one.
///
/// # Example
///
/// ```
/// use ricochet_http::{Method, Request, RequestOptions};
///
/// let request = Request::new(
///     RequestOptions::default()
///         .uri("/articles?page=2")
///         .method(Method::Get)
///         .is_xhr(true),
/// );
/// assert_eq!(request.uri(), "/articles?page=2");
/// assert_eq!(request.param("page"), Some("2"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub uri: Option<String>,
    pub referer: Option<String>,
    pub cache_control: Option<String>,
    pub ip: Option<String>,
    pub is_local: bool,
    pub is_xhr: bool,
    pub user_agent: Option<String>,
    pub content_length: Option<u64>,
    pub headers: Option<Headers>,
    pub path_params: Option<Params>,
    pub request_params: Option<Params>,
    pub query_params: Option<Params>,
    pub files: Option<FileList>,
}

impl RequestOptions {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    #[must_use]
    pub fn cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    #[must_use]
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    #[must_use]
    pub fn is_local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    #[must_use]
    pub fn is_xhr(mut self, is_xhr: bool) -> Self {
        self.is_xhr = is_xhr;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn path_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.path_params = Some(collect(params));
        self
    }

    #[must_use]
    pub fn request_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request_params = Some(collect(params));
        self
    }

    #[must_use]
    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params = Some(collect(params));
        self
    }

    #[must_use]
    pub fn files(mut self, files: FileList) -> Self {
        self.files = Some(files);
        self
    }

    /// Project the environment-backed options onto `env`.
    pub(crate) fn write_env(&self, env: &mut Env) {
        if let Some(method) = self.method {
            env.set("REQUEST_METHOD", method.as_str());
        }
        if let Some(uri) = &self.uri {
            env.set("REQUEST_URI", uri);
            match uri.split_once('?') {
                Some((_, query)) => env.set("QUERY_STRING", query),
                None => env.remove("QUERY_STRING"),
            }
        }
        if let Some(referer) = &self.referer {
            env.set("HTTP_REFERER", referer);
        }
        if let Some(cache_control) = &self.cache_control {
            env.set("HTTP_CACHE_CONTROL", cache_control);
        }
        if let Some(ip) = &self.ip {
            env.set("REMOTE_ADDR", ip);
        }
        if self.is_local {
            env.set("REMOTE_ADDR", "::1");
        }
        if self.is_xhr {
            env.set("HTTP_X_REQUESTED_WITH", "XMLHttpRequest");
        }
        if let Some(user_agent) = &self.user_agent {
            env.set("HTTP_USER_AGENT", user_agent);
        }
        if let Some(content_length) = self.content_length {
            env.set("CONTENT_LENGTH", content_length.to_string());
        }
    }
}

fn collect<I, K, V>(params: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    params
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

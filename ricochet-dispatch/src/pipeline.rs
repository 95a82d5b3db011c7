//! The weighted dispatch pipeline and its rescue protocol.

use ricochet_core::error::OpaqueError;
use ricochet_http::error::{ForceRedirect, NotFound, origin_of};
use ricochet_http::headers::FieldName;
use ricochet_http::{Body, Method, Request, RequestOptions, Response};

use crate::hook::{Hook, RescueHook, ResponseSlot};
use crate::registry::DispatcherRegistry;

/// The diagnostic field stamped on responses produced via rescue.
pub const RESCUED_EXCEPTION_FIELD: &str = "X-Ricochet-Rescued-Exception";

/// Drives a request through an ordered list of dispatchers, with before
/// and after hooks and an exception rescue protocol.
///
/// The lifecycle of [`respond`](Self::respond):
/// 1. before hooks run; a hook-provided response short-circuits dispatch,
/// 2. dispatchers run in weight order until one produces a response,
/// 3. after hooks run, the last chance to substitute a response,
/// 4. on error, rescue hooks run; an unrescued [`ForceRedirect`] becomes
///    a redirect response, any other unrescued error propagates,
/// 5. a HEAD response is stripped of its body.
pub struct RequestDispatcher {
    registry: DispatcherRegistry,
    before: Vec<Hook>,
    after: Vec<Hook>,
    rescue: Vec<RescueHook>,
}

impl RequestDispatcher {
    #[must_use]
    pub fn new(registry: DispatcherRegistry) -> Self {
        Self {
            registry,
            before: Vec::new(),
            after: Vec::new(),
            rescue: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &DispatcherRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DispatcherRegistry {
        &mut self.registry
    }

    /// Register a hook running before the dispatcher list is consulted.
    pub fn on_before<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut ResponseSlot) + Send + Sync + 'static,
    {
        self.before.push(Box::new(hook));
    }

    /// Register a hook running after dispatch, success or not found.
    pub fn on_after<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut ResponseSlot) + Send + Sync + 'static,
    {
        self.after.push(Box::new(hook));
    }

    /// Register a hook consulted when an error reaches the pipeline.
    pub fn on_rescue<F>(&mut self, hook: F)
    where
        F: Fn(&OpaqueError, &Request, &mut ResponseSlot) + Send + Sync + 'static,
    {
        self.rescue.push(Box::new(hook));
    }

    /// Produce the response for `request`.
    ///
    /// A HEAD request must never transmit an entity body: when the
    /// resolved response carries one, a copy with the same status and
    /// headers but no body is returned instead.
    pub fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        let response = self.handle(request)?;
        if request.method().ok() == Some(Method::Head) && !response.body().is_empty() {
            let mut head = response.clone();
            head.set_body(Body::None);
            return Ok(head);
        }
        Ok(response)
    }

    /// Dispatch, falling back from HEAD to GET on not found, and rescue
    /// whatever error remains.
    fn handle(&self, request: &Request) -> Result<Response, OpaqueError> {
        let error = match self.dispatch(request) {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        if error.is::<NotFound>() && request.method().ok() == Some(Method::Head) {
            let get = request.with(RequestOptions::default().method(Method::Get));
            match self.handle(&get) {
                Ok(mut response) => {
                    // best effort: the head of the entity should still
                    // advertise its length
                    if response.content_length().is_none()
                        && let Some(len) = response.body().len()
                    {
                        response.headers.set(FieldName::ContentLength, len);
                    }
                    return Ok(response);
                }
                // the fallback failure is discarded, the original
                // not-found is the one rescued
                Err(fallback) => {
                    tracing::debug!("discarded GET fallback failure: {fallback}");
                }
            }
        }

        self.rescue(error, request)
    }

    /// Run the before hooks, the dispatcher list and the after hooks.
    fn dispatch(&self, request: &Request) -> Result<Response, OpaqueError> {
        let mut slot = ResponseSlot::new();

        for hook in &self.before {
            hook(request, &mut slot);
        }

        if slot.is_empty() {
            for (id, handler) in self.registry.ordered() {
                let result = match handler.dispatch(request) {
                    Ok(Some(response)) => Some(response),
                    Ok(None) => None,
                    Err(error) => {
                        tracing::debug!(dispatcher = id, "dispatcher failed: {error}");
                        Some(handler.rescue(error, request)?)
                    }
                };
                if let Some(response) = result {
                    slot.set(response);
                    break;
                }
            }
        }

        for hook in &self.after {
            hook(request, &mut slot);
        }

        slot.take()
            .ok_or_else(|| OpaqueError::from_std(NotFound::new()))
    }

    /// Consult the rescue hooks, then intercept [`ForceRedirect`].
    ///
    /// A rescued response is stamped with a diagnostic field locating the
    /// origin of the error. An unrescued error propagates unchanged.
    fn rescue(&self, error: OpaqueError, request: &Request) -> Result<Response, OpaqueError> {
        let origin = origin_of(&error);

        let mut slot = ResponseSlot::new();
        for hook in &self.rescue {
            hook(&error, request, &mut slot);
        }

        let mut response = match slot.take() {
            Some(response) => response,
            None => match error.downcast::<ForceRedirect>() {
                Ok(redirect) => {
                    Response::redirect(redirect.location(), redirect.status().clone())
                }
                Err(error) => return Err(error),
            },
        };

        if let Some(origin) = origin {
            let file = relativize(origin.file(), request);
            response.headers.set(
                FieldName::Other(RESCUED_EXCEPTION_FIELD.to_owned()),
                format!("{}@{}", file, origin.line()),
            );
        }
        Ok(response)
    }
}

/// Strip the document root from `file` when the request carries one.
fn relativize<'a>(file: &'a str, request: &Request) -> &'a str {
    request
        .env()
        .get("DOCUMENT_ROOT")
        .and_then(|root| file.strip_prefix(root))
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(file)
}

impl From<DispatcherRegistry> for RequestDispatcher {
    fn from(registry: DispatcherRegistry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::dispatch_fn;
    use crate::registry::Weight;
    use ricochet_http::Status;

    fn single(handler: impl crate::Dispatch) -> RequestDispatcher {
        let mut registry = DispatcherRegistry::new();
        registry.add("only", handler, Weight::default());
        RequestDispatcher::new(registry)
    }

    #[test]
    fn first_response_wins() {
        let mut registry = DispatcherRegistry::new();
        registry.add("declines", dispatch_fn(|_| Ok(None)), Weight::default());
        registry.add(
            "answers",
            dispatch_fn(|_| Ok(Some(Response::new("hit", Status::OK)))),
            Weight::default(),
        );
        registry.add(
            "unreached",
            dispatch_fn(|_| Ok(Some(Response::new("late", Status::ACCEPTED)))),
            Weight::default(),
        );

        let response = RequestDispatcher::new(registry)
            .respond(&Request::from_uri("/"))
            .unwrap();
        assert_eq!(response.status, Status::OK);
    }

    #[test]
    fn empty_pipeline_is_not_found() {
        let pipeline = RequestDispatcher::new(DispatcherRegistry::new());
        let error = pipeline.respond(&Request::from_uri("/")).unwrap_err();
        assert!(error.is::<NotFound>());
    }

    #[test]
    fn before_hook_short_circuits_dispatch() {
        let mut pipeline = single(dispatch_fn(|_| {
            panic!("the dispatcher list must not be consulted")
        }));
        pipeline.on_before(|_, slot| slot.set(Response::new("early", Status::OK)));

        let response = pipeline.respond(&Request::from_uri("/")).unwrap();
        assert!(matches!(response.body(), Body::Text(text) if text == "early"));
    }

    #[test]
    fn after_hook_has_the_last_word() {
        let mut pipeline = single(dispatch_fn(|_| {
            Ok(Some(Response::new("dispatched", Status::OK)))
        }));
        pipeline.on_after(|_, slot| slot.set(Response::new("substituted", Status::ACCEPTED)));

        let response = pipeline.respond(&Request::from_uri("/")).unwrap();
        assert_eq!(response.status, Status::ACCEPTED);
    }

    #[test]
    fn head_response_body_is_suppressed() {
        let pipeline = single(dispatch_fn(|_| {
            Ok(Some(Response::new("entity body", Status::OK)))
        }));
        let request = Request::new(
            RequestOptions::default().uri("/resource").method(Method::Head),
        );

        let response = pipeline.respond(&request).unwrap();
        assert_eq!(response.status, Status::OK);
        assert!(response.body().is_empty());
    }

    #[test]
    fn head_falls_back_to_get_and_advertises_length() {
        let pipeline = single(dispatch_fn(|request| {
            if request.method().ok() != Some(Method::Get) {
                return Err(OpaqueError::from_std(NotFound::new()));
            }
            Ok(Some(Response::new("0123456789", Status::OK)))
        }));
        let request = Request::new(RequestOptions::default().method(Method::Head));

        let response = pipeline.respond(&request).unwrap();
        assert_eq!(response.status, Status::OK);
        assert_eq!(response.content_length(), Some(10));
        assert!(response.body().is_empty());
    }

    #[test]
    fn failing_head_fallback_rescues_the_original_error() {
        let pipeline = single(dispatch_fn(|request| {
            if request.method().ok() == Some(Method::Get) {
                return Err(OpaqueError::from_display("secondary failure"));
            }
            Err(OpaqueError::from_std(NotFound::new()))
        }));
        let request = Request::new(RequestOptions::default().method(Method::Head));

        let error = pipeline.respond(&request).unwrap_err();
        assert!(error.is::<NotFound>());
    }

    #[test]
    fn force_redirect_is_intercepted_without_any_hook() {
        let pipeline = single(dispatch_fn(|_| {
            Err(OpaqueError::from_std(
                ForceRedirect::new("/x").with_status(Status::SEE_OTHER),
            ))
        }));

        let response = pipeline.respond(&Request::from_uri("/")).unwrap();
        assert_eq!(response.status, Status::SEE_OTHER);
        assert_eq!(response.location().as_deref(), Some("/x"));
    }

    #[test]
    fn rescue_hook_provides_a_stamped_response() {
        let mut pipeline = single(dispatch_fn(|_| {
            Err(OpaqueError::from_std(NotFound::new()))
        }));
        pipeline.on_rescue(|error, _, slot| {
            assert!(error.is::<NotFound>());
            slot.set(Response::new("rescued", Status::OK));
        });

        let response = pipeline.respond(&Request::from_uri("/")).unwrap();
        assert_eq!(response.status, Status::OK);
        let stamp = response
            .headers
            .get_text(&FieldName::Other(RESCUED_EXCEPTION_FIELD.to_owned()))
            .unwrap();
        assert!(stamp.contains('@'));
    }

    #[test]
    fn handler_level_rescue_gets_one_chance() {
        struct SelfHealing;

        impl crate::Dispatch for SelfHealing {
            fn dispatch(&self, _: &Request) -> Result<Option<Response>, OpaqueError> {
                Err(OpaqueError::from_display("broken"))
            }

            fn rescue(
                &self,
                _: OpaqueError,
                _: &Request,
            ) -> Result<Response, OpaqueError> {
                Ok(Response::new("healed", Status::OK))
            }
        }

        let response = single(SelfHealing)
            .respond(&Request::from_uri("/"))
            .unwrap();
        assert!(matches!(response.body(), Body::Text(text) if text == "healed"));
    }

    #[test]
    fn unrescued_error_propagates_unchanged() {
        let pipeline = single(dispatch_fn(|_| {
            Err(OpaqueError::from_display("fatal"))
        }));
        let error = pipeline.respond(&Request::from_uri("/")).unwrap_err();
        assert_eq!(error.to_string(), "fatal");
    }
}

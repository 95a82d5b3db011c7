//! The responder chain, a simpler alternative to the weighted pipeline.
//!
//! A [`Responder`] always produces a response or fails, a
//! [`ResponderProvider`] picks the responder matching a request. Small
//! decorators compose the same before/after/rescue semantics as the
//! dispatcher pipeline around a single delegate.

use std::sync::Arc;

use ricochet_core::error::OpaqueError;
use ricochet_http::error::NotFound;
use ricochet_http::{Request, Response};

use crate::hook::{Hook, ResponseSlot};

/// A handler that always produces a [`Response`] or fails.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError>;
}

/// A shared, type-erased [`Responder`].
pub type BoxResponder = Arc<dyn Responder>;

impl<R: Responder + ?Sized> Responder for Arc<R> {
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        (**self).respond(request)
    }
}

/// Adapt a closure into a [`Responder`].
pub fn respond_fn<F>(f: F) -> RespondFn<F>
where
    F: Fn(&Request) -> Result<Response, OpaqueError> + Send + Sync + 'static,
{
    RespondFn(f)
}

/// A [`Responder`] backed by a closure, created with [`respond_fn`].
pub struct RespondFn<F>(F);

impl<F> Responder for RespondFn<F>
where
    F: Fn(&Request) -> Result<Response, OpaqueError> + Send + Sync + 'static,
{
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        (self.0)(request)
    }
}

/// Picks the responder matching a request, or declines.
pub trait ResponderProvider: Send + Sync + 'static {
    fn responder_for(&self, request: &Request) -> Option<BoxResponder>;
}

/// Adapt a closure into a [`ResponderProvider`].
pub fn provider_fn<F>(f: F) -> ProviderFn<F>
where
    F: Fn(&Request) -> Option<BoxResponder> + Send + Sync + 'static,
{
    ProviderFn(f)
}

/// A [`ResponderProvider`] backed by a closure, created with
/// [`provider_fn`].
pub struct ProviderFn<F>(F);

impl<F> ResponderProvider for ProviderFn<F>
where
    F: Fn(&Request) -> Option<BoxResponder> + Send + Sync + 'static,
{
    fn responder_for(&self, request: &Request) -> Option<BoxResponder> {
        (self.0)(request)
    }
}

/// A [`Responder`] that looks its delegate up through a provider, failing
/// with [`NotFound`] when no responder matches.
pub struct DelegateToProvider<P> {
    provider: P,
}

impl<P: ResponderProvider> DelegateToProvider<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ResponderProvider> Responder for DelegateToProvider<P> {
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        match self.provider.responder_for(request) {
            Some(responder) => responder.respond(request),
            None => Err(OpaqueError::from_std(NotFound::new())),
        }
    }
}

/// A [`ResponderProvider`] trying several providers in order, returning
/// the first match.
#[derive(Default)]
pub struct Chain {
    providers: Vec<Arc<dyn ResponderProvider>>,
}

impl Chain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, provider: impl ResponderProvider) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }
}

impl ResponderProvider for Chain {
    fn responder_for(&self, request: &Request) -> Option<BoxResponder> {
        self.providers
            .iter()
            .find_map(|provider| provider.responder_for(request))
    }
}

/// Wrap a responder with before and after hooks.
///
/// Before hooks may provide a response and short-circuit the delegate;
/// after hooks get the last chance to substitute one. Within each stage
/// the last hook to write wins.
pub struct WithEvent<R> {
    responder: R,
    before: Vec<Hook>,
    after: Vec<Hook>,
}

impl<R: Responder> WithEvent<R> {
    pub fn new(responder: R) -> Self {
        Self {
            responder,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    #[must_use]
    pub fn on_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &mut ResponseSlot) + Send + Sync + 'static,
    {
        self.before.push(Box::new(hook));
        self
    }

    #[must_use]
    pub fn on_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Request, &mut ResponseSlot) + Send + Sync + 'static,
    {
        self.after.push(Box::new(hook));
        self
    }
}

impl<R: Responder> Responder for WithEvent<R> {
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        let mut slot = ResponseSlot::new();
        for hook in &self.before {
            hook(request, &mut slot);
        }
        if slot.is_empty() {
            slot.set(self.responder.respond(request)?);
        }
        for hook in &self.after {
            hook(request, &mut slot);
        }
        slot.take()
            .ok_or_else(|| OpaqueError::from_std(NotFound::new()))
    }
}

/// Wrap a responder with a single recovery hook: on error the hook may
/// substitute a response, or replace the error that propagates, or leave
/// both alone and let the original error propagate unchanged.
pub struct WithRecovery<R, F> {
    responder: R,
    recover: F,
}

impl<R, F> WithRecovery<R, F>
where
    R: Responder,
    F: Fn(&mut OpaqueError, &Request, &mut ResponseSlot) + Send + Sync + 'static,
{
    pub fn new(responder: R, recover: F) -> Self {
        Self { responder, recover }
    }
}

impl<R, F> Responder for WithRecovery<R, F>
where
    R: Responder,
    F: Fn(&mut OpaqueError, &Request, &mut ResponseSlot) + Send + Sync + 'static,
{
    fn respond(&self, request: &Request) -> Result<Response, OpaqueError> {
        let mut error = match self.responder.respond(request) {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        let mut slot = ResponseSlot::new();
        (self.recover)(&mut error, request, &mut slot);
        slot.take().ok_or(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_http::Status;

    fn ok_responder(body: &'static str) -> BoxResponder {
        Arc::new(respond_fn(move |_| Ok(Response::new(body, Status::OK))))
    }

    #[test]
    fn delegate_fails_with_not_found_when_nothing_matches() {
        let responder = DelegateToProvider::new(provider_fn(|_| None));
        let error = responder.respond(&Request::from_uri("/")).unwrap_err();
        assert!(error.is::<NotFound>());
    }

    #[test]
    fn chain_returns_the_first_match() {
        let chain = Chain::new()
            .with(provider_fn(|_| None))
            .with(provider_fn(|request| {
                (request.path() == "/a").then(|| ok_responder("from a"))
            }))
            .with(provider_fn(|_| Some(ok_responder("fallback"))));

        let responder = DelegateToProvider::new(chain);
        let response = responder.respond(&Request::from_uri("/a")).unwrap();
        assert!(
            matches!(response.body(), ricochet_http::Body::Text(text) if text == "from a")
        );

        let response = responder.respond(&Request::from_uri("/b")).unwrap();
        assert!(
            matches!(response.body(), ricochet_http::Body::Text(text) if text == "fallback")
        );
    }

    #[test]
    fn with_event_mirrors_the_pipeline_hooks() {
        let responder = WithEvent::new(respond_fn(|_| {
            Ok(Response::new("delegate", Status::OK))
        }))
        .on_before(|_, slot| slot.set(Response::new("before", Status::ACCEPTED)));

        let response = responder.respond(&Request::from_uri("/")).unwrap();
        assert_eq!(response.status, Status::ACCEPTED);

        let responder = WithEvent::new(respond_fn(|_| {
            Ok(Response::new("delegate", Status::OK))
        }))
        .on_after(|_, slot| slot.set(Response::new("after", Status::CREATED)));

        let response = responder.respond(&Request::from_uri("/")).unwrap();
        assert_eq!(response.status, Status::CREATED);
    }

    #[test]
    fn recovery_substitutes_or_rethrows() {
        let failing = respond_fn(|_| Err(OpaqueError::from_std(NotFound::new())));
        let recovered = WithRecovery::new(failing, |_, _, slot| {
            slot.set(Response::new("recovered", Status::OK));
        });
        assert!(recovered.respond(&Request::from_uri("/")).is_ok());

        let failing = respond_fn(|_| Err(OpaqueError::from_std(NotFound::new())));
        let silent = WithRecovery::new(failing, |_, _, _| {});
        let error = silent.respond(&Request::from_uri("/")).unwrap_err();
        assert!(error.is::<NotFound>());
    }

    #[test]
    fn recovery_may_replace_the_propagated_error() {
        use ricochet_http::error::ServerError;

        let failing = respond_fn(|_| Err(OpaqueError::from_std(NotFound::new())));
        let reclassifying = WithRecovery::new(failing, |error, _, _| {
            if error.is::<NotFound>() {
                *error = OpaqueError::from_std(ServerError::new());
            }
        });

        let error = reclassifying.respond(&Request::from_uri("/")).unwrap_err();
        assert!(error.is::<ServerError>());
        assert!(!error.is::<NotFound>());
    }
}

//! The handler seam of the pipeline.

use std::sync::Arc;

use ricochet_core::error::OpaqueError;
use ricochet_http::{Request, Response};

/// A handler capable of producing a [`Response`] for a [`Request`], or
/// declining by returning `None`.
///
/// A dispatcher may also declare its own recovery capability: when its
/// [`dispatch`](Dispatch::dispatch) fails, the pipeline gives it exactly
/// one chance to convert the error into a response through
/// [`rescue`](Dispatch::rescue) before propagating.
pub trait Dispatch: Send + Sync + 'static {
    fn dispatch(&self, request: &Request) -> Result<Option<Response>, OpaqueError>;

    /// Convert an error raised by this handler's own dispatch into a
    /// response. The default implementation declines.
    fn rescue(&self, error: OpaqueError, request: &Request) -> Result<Response, OpaqueError> {
        let _ = request;
        Err(error)
    }
}

/// A shared, type-erased [`Dispatch`].
pub type BoxDispatch = Arc<dyn Dispatch>;

/// Adapt a closure into a [`Dispatch`] at registration time.
///
/// # Example
///
/// ```
/// use ricochet_dispatch::dispatch_fn;
/// use ricochet_http::{Response, Status};
///
/// let handler = dispatch_fn(|request| {
///     if request.path() != "/ping" {
///         return Ok(None);
///     }
///     Ok(Some(Response::new("pong", Status::OK)))
/// });
/// ```
pub fn dispatch_fn<F>(f: F) -> DispatchFn<F>
where
    F: Fn(&Request) -> Result<Option<Response>, OpaqueError> + Send + Sync + 'static,
{
    DispatchFn(f)
}

/// A [`Dispatch`] backed by a closure, created with [`dispatch_fn`].
pub struct DispatchFn<F>(F);

impl<F> std::fmt::Debug for DispatchFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DispatchFn(..)")
    }
}

impl<F> Dispatch for DispatchFn<F>
where
    F: Fn(&Request) -> Result<Option<Response>, OpaqueError> + Send + Sync + 'static,
{
    fn dispatch(&self, request: &Request) -> Result<Option<Response>, OpaqueError> {
        (self.0)(request)
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, request: &Request) -> Result<Option<Response>, OpaqueError> {
        (**self).dispatch(request)
    }

    fn rescue(&self, error: OpaqueError, request: &Request) -> Result<Response, OpaqueError> {
        (**self).rescue(error, request)
    }
}

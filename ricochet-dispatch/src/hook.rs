//! Hook callbacks and the shared response slot they write to.

use ricochet_core::error::OpaqueError;
use ricochet_http::{Request, Response};

/// A single mutable cell shared by the hooks of one pipeline stage.
///
/// Hooks run in registration order and each may overwrite the slot: the
/// last hook to set a response wins.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    response: Option<Response>,
}

impl ResponseSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a response, replacing any previous one.
    pub fn set(&mut self, response: Response) {
        self.response = Some(response);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.response.is_none()
    }

    #[must_use]
    pub fn get(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn take(&mut self) -> Option<Response> {
        self.response.take()
    }
}

/// A before/after dispatch hook.
pub type Hook = Box<dyn Fn(&Request, &mut ResponseSlot) + Send + Sync>;

/// A rescue hook, consulted when an error reaches the pipeline level.
pub type RescueHook = Box<dyn Fn(&OpaqueError, &Request, &mut ResponseSlot) + Send + Sync>;

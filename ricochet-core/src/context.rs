//! Ambient objects attached to a request.
//!
//! A [`Context`] is a stack of arbitrary typed values queried by type.
//! It is how request-handling code receives ambient collaborators, for
//! example "the dispatcher currently handling this request", without any
//! process-wide state: whoever owns the request pushes the object, whoever
//! needs it asks for it by type.
//!
//! Lookup is most-recently-pushed-first, so a value pushed later shadows an
//! earlier one of the same type.
//!
//! # Example
//!
//! ```
//! use ricochet_core::Context;
//!
//! #[derive(Debug)]
//! struct Tenant(&'static str);
//!
//! let mut ctx = Context::new();
//! ctx.push(Tenant("a"));
//! ctx.push(Tenant("b"));
//! assert_eq!(ctx.get::<Tenant>().unwrap().0, "b");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A stack of typed ambient objects attached to a request.
///
/// Values are stored behind [`Arc`] so cloning a request (and its context)
/// is cheap and the clones observe the same objects.
#[derive(Clone, Default)]
pub struct Context {
    stack: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create a new empty [`Context`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a value onto the stack.
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.stack.push(Arc::new(value));
    }

    /// Push an already shared value onto the stack.
    pub fn push_arc<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.stack.push(value);
    }

    /// Get the most recently pushed value of type `T`, if any.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.stack
            .iter()
            .rev()
            .find_map(|value| value.downcast_ref::<T>())
    }

    /// Get the most recently pushed value of type `T` as an [`Arc`].
    #[must_use]
    pub fn get_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.stack
            .iter()
            .rev()
            .find_map(|value| Arc::clone(value).downcast::<T>().ok())
    }

    /// Remove the most recently pushed value of type `T`.
    ///
    /// Returns whether a value was removed.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> bool {
        match self.stack.iter().rposition(|value| value.is::<T>()) {
            Some(index) => {
                self.stack.remove(index);
                true
            }
            None => false,
        }
    }

    /// The amount of values on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if the stack holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("len", &self.stack.len())
            .finish()
    }
}

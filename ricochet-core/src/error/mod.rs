//! Error utilities for `ricochet`.
//!
//! Errors cross several seams in this project: a dispatcher may fail with a
//! domain error (`NotFound`, `ForceRedirect`, ...) that rescue code needs to
//! recognize again by concrete type. [`OpaqueError`] is the type-erased
//! currency used on those seams: cheap to construct from anything
//! `std::error::Error`, and downcastable on the other side.
//!
//! The [`ErrorContext`] and [`ErrorExt`] extension traits add human context
//! while keeping the original error as `source()`.

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A type-erased error that can still be downcast to its concrete type.
#[repr(transparent)]
pub struct OpaqueError(BoxError);

impl OpaqueError {
    /// Create an [`OpaqueError`] from an std error.
    pub fn from_std(error: impl StdError + Send + Sync + 'static) -> Self {
        Self(Box::new(error))
    }

    /// Create an [`OpaqueError`] from a display object.
    pub fn from_display(msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self::from_std(MessageError(msg))
    }

    /// Create an [`OpaqueError`] from a boxed error.
    #[must_use]
    pub fn from_boxed(inner: BoxError) -> Self {
        Self(inner)
    }

    /// Returns true if the underlying error is of type `T`.
    #[must_use]
    pub fn is<T>(&self) -> bool
    where
        T: StdError + 'static,
    {
        self.0.is::<T>()
    }

    /// Consume the [`OpaqueError`] and return it as a [`BoxError`].
    #[must_use]
    pub fn into_boxed(self) -> BoxError {
        self.0
    }

    /// Attempt to downcast the error to the concrete type `T`.
    pub fn downcast<T>(self) -> Result<T, Self>
    where
        T: StdError + 'static,
    {
        match self.0.downcast::<T>() {
            Ok(error) => Ok(*error),
            Err(inner) => Err(Self(inner)),
        }
    }

    /// Attempt to downcast the error to a shared reference of `T`.
    #[must_use]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        self.0.downcast_ref()
    }
}

impl Debug for OpaqueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for OpaqueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for OpaqueError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<BoxError> for OpaqueError {
    fn from(error: BoxError) -> Self {
        Self(error)
    }
}

/// An error type that wraps a message.
#[repr(transparent)]
pub(crate) struct MessageError<M>(pub(crate) M);

impl<M> Debug for MessageError<M>
where
    M: Display + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl<M> Display for MessageError<M>
where
    M: Display + Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<M> StdError for MessageError<M> where M: Display + Debug + 'static {}

/// An error enriched with a context message; the wrapped error is
/// preserved as `source()`.
pub struct ContextError<E> {
    context: &'static str,
    error: E,
}

impl<E: Debug> Debug for ContextError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContextError")
            .field("context", &self.context)
            .field("error", &self.error)
            .finish()
    }
}

impl<E: Display> Display for ContextError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.error)
    }
}

impl<E> StdError for ContextError<E>
where
    E: StdError + 'static,
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

/// Extension trait to wrap any error into an [`OpaqueError`],
/// optionally with extra context.
pub trait ErrorExt: private::SealedErrorExt {
    /// Wrap the error in a context message.
    fn context(self, context: &'static str) -> OpaqueError;

    /// Erase the concrete type of the error.
    fn into_opaque(self) -> OpaqueError;
}

impl<E: StdError + Send + Sync + 'static> ErrorExt for E {
    fn context(self, context: &'static str) -> OpaqueError {
        OpaqueError::from_std(ContextError {
            context,
            error: self,
        })
    }

    fn into_opaque(self) -> OpaqueError {
        OpaqueError::from_std(self)
    }
}

/// Extension trait to add context to the error case of
/// a `Result` or the `None` case of an `Option`.
pub trait ErrorContext: private::SealedErrorContext {
    /// The `Ok`/`Some` output type.
    type Output;

    /// Add a context message to the failure case.
    fn context(self, context: &'static str) -> Result<Self::Output, OpaqueError>;
}

impl<T, E: StdError + Send + Sync + 'static> ErrorContext for Result<T, E> {
    type Output = T;

    fn context(self, context: &'static str) -> Result<T, OpaqueError> {
        self.map_err(|error| error.context(context))
    }
}

impl<T> ErrorContext for Option<T> {
    type Output = T;

    fn context(self, context: &'static str) -> Result<T, OpaqueError> {
        self.ok_or_else(|| OpaqueError::from_display(context))
    }
}

mod private {
    pub trait SealedErrorExt {}
    impl<E: std::error::Error + Send + Sync + 'static> SealedErrorExt for E {}

    pub trait SealedErrorContext {}
    impl<T, E: std::error::Error + Send + Sync + 'static> SealedErrorContext for Result<T, E> {}
    impl<T> SealedErrorContext for Option<T> {}
}

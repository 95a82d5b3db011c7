//! Request dispatch for `ricochet`.
//!
//! Two ways to route a [`Request`](ricochet_http::Request) to a handler:
//!
//! - the [`RequestDispatcher`] pipeline: an ordered registry of
//!   [`Dispatch`] handlers with weighted ordering, before/after hooks and
//!   an exception rescue protocol,
//! - the [`Responder`] chain: a single-delegate contract composed out of
//!   provider lookup, event decoration and recovery decoration.
//!
//! Both are synchronous: a request is handled sequentially by one thread,
//! hooks are plain in-process callbacks.

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod dispatcher;
pub use dispatcher::{BoxDispatch, Dispatch, DispatchFn, dispatch_fn};

mod hook;
pub use hook::{Hook, RescueHook, ResponseSlot};

mod registry;
pub use registry::{DispatcherRegistry, Weight};

mod pipeline;
pub use pipeline::{RESCUED_EXCEPTION_FIELD, RequestDispatcher};

mod responder;
pub use responder::{
    BoxResponder, Chain, DelegateToProvider, ProviderFn, RespondFn, Responder, ResponderProvider,
    WithEvent, WithRecovery, provider_fn, respond_fn,
};

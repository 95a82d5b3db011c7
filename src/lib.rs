//! ricochet models one HTTP exchange: a request built from a transport
//! environment, a response with a finalize/send lifecycle, and a dispatch
//! pipeline routing the former to the latter, with hooks and exception
//! rescue along the way.
//!
//! This crate is a facade re-exporting the workspace members:
//!
//! - [`core`]: ambient plumbing, the error wrappers and the typed
//!   [`Context`] stack,
//! - [`http`]: [`Request`], [`Response`], [`Headers`], [`Status`], byte
//!   ranges and file serving,
//! - [`dispatch`]: the weighted [`RequestDispatcher`] pipeline and the
//!   [`Responder`] chain.
//!
//! # Example
//!
//! ```
//! use ricochet::dispatch::{DispatcherRegistry, RequestDispatcher, Weight, dispatch_fn};
//! use ricochet::{Request, Response, Status};
//!
//! let mut registry = DispatcherRegistry::new();
//! registry.add(
//!     "hello",
//!     dispatch_fn(|request| {
//!         if request.path() != "/hello" {
//!             return Ok(None);
//!         }
//!         Ok(Some(Response::new("Hello there!", Status::OK)))
//!     }),
//!     Weight::default(),
//! );
//!
//! let pipeline = RequestDispatcher::new(registry);
//! let response = pipeline.respond(&Request::from_uri("/hello")).unwrap();
//! assert_eq!(response.status, Status::OK);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

#[doc(inline)]
pub use ricochet_core as core;

#[doc(inline)]
pub use ricochet_http as http;

#[doc(inline)]
pub use ricochet_dispatch as dispatch;

pub use ricochet_core::Context;
pub use ricochet_dispatch::{RequestDispatcher, Responder};
pub use ricochet_http::{
    Headers, Method, Request, RequestOptions, RequestRange, Response, Status,
};

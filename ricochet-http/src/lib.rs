//! HTTP types for `ricochet`.
//!
//! This crate models the two halves of an HTTP exchange: a [`Request`] built
//! from a CGI-style environment map and a [`Response`] with its finalize/send
//! lifecycle. It also provides the typed [`Headers`] map, validated
//! [`Status`] codes, byte [`RequestRange`] resolution and the
//! conditional-GET aware [`FileResponse`].
//!
//! The transport itself (sockets, raw HTTP parsing) is out of scope: requests
//! come in as an [`Env`] key/value snapshot, responses go out through any
//! [`std::io::Write`] sink.

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

mod status;
pub use status::Status;

mod method;
pub use method::Method;

pub mod error;

pub mod headers;
pub use headers::{FieldName, FieldValue, Headers};

pub mod request;
pub use request::{Env, Request, RequestOptions};

pub mod response;
pub use response::{Body, FileResponse, FileResponseOptions, Response, Version};

mod range;
pub use range::RequestRange;

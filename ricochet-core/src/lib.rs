//! Core building blocks shared by the `ricochet` crates:
//! type-erased error plumbing and the per-request [`Context`] stack.
//!
//! Nothing in this crate knows about HTTP. The `ricochet-http` and
//! `ricochet-dispatch` crates build on top of it.

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
#![cfg_attr(not(test), warn(clippy::print_stdout, clippy::dbg_macro))]

pub mod context;
pub use context::Context;

pub mod error;

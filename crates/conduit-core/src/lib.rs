//! Shared primitives for the conduit gateway crates
//!
//! Holds the per-request context threaded through dispatch and tool
//! execution, and the error trait every domain error implements.

#![allow(clippy::must_use_candidate)]

mod context;
mod error;

pub use context::RequestContext;
pub use error::{ErrorBody, HttpError};

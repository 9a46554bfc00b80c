//! Devtools Types - Shared data model for host introspection
//!
//! This crate contains the point-in-time descriptors produced by the
//! introspection readers and the traits a host implements so the devtools
//! server can look inside it. Nothing here performs I/O; hosts supply the
//! data, the server shapes it.

mod descriptors;
mod health;
mod host;

pub use descriptors::*;
pub use health::*;
pub use host::*;

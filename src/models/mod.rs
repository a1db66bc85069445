//! Data shapes exchanged by the gateway.
//!
//! Nothing here is persisted by the gateway itself; image objects live in
//! the object store and search results are rebuilt on every request.

pub mod image;

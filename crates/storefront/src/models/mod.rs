//! Domain models for the storefront.
//!
//! Catalog types live in `atiga-core`; this module holds the types that only
//! make sense inside the HTTP server.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};

//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin credential checks and password hashing
//! - `catalog` - Product CRUD with image storage and list caching

pub mod auth;
pub mod catalog;

pub use catalog::CatalogService;

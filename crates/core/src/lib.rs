//! Atiga Meubel Core - Shared types library.
//!
//! This crate provides the domain types and pure helpers used across the
//! Atiga Meubel components:
//! - `storefront` - Public catalog, admin panel, and JSON API
//! - `cli` - Command-line tools for migrations, seeding, and inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Anything that touches the network or disk lives in
//! the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, and the product record itself
//! - [`upload`] - Image upload limits and filename sanitizing
//! - [`image`] - Provider transform URLs (Cloudinary, Supabase)
//! - [`text`] - Character-safe text truncation for listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod image;
pub mod text;
pub mod types;
pub mod upload;

pub use types::*;

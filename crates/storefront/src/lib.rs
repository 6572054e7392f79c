//! Atiga Meubel storefront library.
//!
//! Catalog pages, the admin panel, and the product JSON API live here so the
//! binary, the CLI, and tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

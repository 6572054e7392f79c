//! Core types for Atiga Meubel.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::{CATEGORY_OPTIONS, Product, ProductDraft, ProductFieldError, parse_featured};

//! The catalog's product record and validated admin input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::{Price, PriceError};

/// Category choices offered by the admin product form.
///
/// The API accepts any non-empty category; this list only drives the form.
pub const CATEGORY_OPTIONS: &[&str] = &["Semua Produk", "Meja", "Kursi", "Lemari", "Buffet", "Sofa"];

/// A product as stored in the catalog.
///
/// Serialized in camelCase (`createdAt`, `updatedAt`) to match the JSON the
/// admin panel and older clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Public URL of the product photo, if one was uploaded.
    pub image: Option<String>,
    pub category: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validation failures for admin product input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductFieldError {
    #[error("Nama produk wajib diisi")]
    MissingName,
    #[error("Kategori produk wajib diisi")]
    MissingCategory,
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Validated product fields, excluding the image.
///
/// Used for both create and full-replacement update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    pub featured: bool,
}

impl ProductDraft {
    /// Validate raw form values.
    ///
    /// Name and category are trimmed and must be non-empty. A blank
    /// description is stored as `NULL`. A blank price is zero.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductFieldError`] encountered, checking name,
    /// then category, then price.
    pub fn from_form(
        name: &str,
        description: &str,
        price: &str,
        category: &str,
        featured: &str,
    ) -> Result<Self, ProductFieldError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductFieldError::MissingName);
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(ProductFieldError::MissingCategory);
        }

        let price = Price::parse(price)?;
        let description = Some(description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        Ok(Self {
            name: name.to_owned(),
            description,
            price,
            category: category.to_owned(),
            featured: parse_featured(featured),
        })
    }
}

/// Interpret the form's `featured` field. Only `"true"` and `"1"` are truthy.
#[must_use]
pub fn parse_featured(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

//! Product API handlers.

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection, rejection::PathRejection,
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use atiga_core::{Product, ProductId, parse_featured};

use super::{multipart_rejection, product_id};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::services::catalog::ProductForm;
use crate::state::AppState;

/// Filters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `true`/`1` keeps only featured products.
    pub featured: Option<String>,
    /// Exact category match, ignoring case. `Semua Produk` means all.
    pub category: Option<String>,
}

impl ListQuery {
    fn matches(&self, product: &Product) -> bool {
        let featured_ok = self
            .featured
            .as_deref()
            .is_none_or(|f| !parse_featured(f) || product.featured);

        let category_ok = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("Semua Produk"))
            .is_none_or(|c| product.category.eq_ignore_ascii_case(c));

        featured_ok && category_ok
    }
}

/// Body of `DELETE /api/products/{id}`.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

/// List products, newest first.
///
/// # Errors
///
/// Returns 500 if the products cannot be loaded.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list().await?;
    Ok(Json(
        products.iter().filter(|p| query.matches(p)).cloned().collect(),
    ))
}

/// Get a single product.
///
/// # Errors
///
/// Returns 400 for a non-numeric ID and 404 if the product does not exist.
#[instrument(skip(state, path))]
pub async fn show(
    State(state): State<AppState>,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>> {
    let id = product_id(path)?;
    Ok(Json(state.catalog().get(id).await?))
}

/// Create a product from a multipart form.
///
/// # Errors
///
/// Returns 401 without a session, 400 for invalid fields or files, and 500
/// if storage or the database fails.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let multipart = multipart.map_err(|r| multipart_rejection(&r))?;
    let form = ProductForm::from_multipart(multipart).await?;

    let product = state.catalog().create(form).await?;
    let tag = product.id.to_string();
    add_breadcrumb(
        "admin",
        "Created product",
        Some(&[("product_id", tag.as_str())]),
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product from a multipart form.
///
/// # Errors
///
/// Returns 401 without a session, 400 for a bad ID or invalid input, 404 if
/// the product does not exist, and 500 if storage or the database fails.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<ProductId>, PathRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>> {
    let id = product_id(path)?;
    let multipart = multipart.map_err(|r| multipart_rejection(&r))?;
    let form = ProductForm::from_multipart(multipart).await?;

    let product = state.catalog().update(id, form).await?;
    let tag = id.to_string();
    add_breadcrumb(
        "admin",
        "Updated product",
        Some(&[("product_id", tag.as_str())]),
    );

    Ok(Json(product))
}

/// Delete a product and its image.
///
/// # Errors
///
/// Returns 401 without a session, 400 for a bad ID, and 404 if the product
/// does not exist.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<DeletedResponse>> {
    let id = product_id(path)?;
    state.catalog().delete(id).await?;
    let tag = id.to_string();
    add_breadcrumb(
        "admin",
        "Deleted product",
        Some(&[("product_id", tag.as_str())]),
    );

    Ok(Json(DeletedResponse {
        message: "Product deleted",
    }))
}

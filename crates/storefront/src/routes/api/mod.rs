//! JSON API for products and image uploads.
//!
//! Reads are public. Mutations need an admin session and answer 401
//! otherwise. Every error body is `{"error": "<message>"}`.

pub mod products;
pub mod upload;

use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Path,
        multipart::MultipartRejection, rejection::PathRejection,
    },
    routing::{get, post},
};

use atiga_core::ProductId;

use crate::error::AppError;
use crate::state::AppState;

/// Request body cap for multipart endpoints.
///
/// Larger than the 5 MB image limit so oversize images reach validation and
/// get the specific message instead of a bare 413.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Map a path rejection to a 400 with the JSON error body.
pub(crate) fn product_id(path: Result<Path<ProductId>, PathRejection>) -> Result<ProductId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest("Invalid product ID".to_string()))
}

/// Map a missing or malformed multipart body to a 400.
pub(crate) fn multipart_rejection(rejection: &MultipartRejection) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", rejection.body_text()))
}

/// Create the API router, mounted at `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/upload", post(upload::upload))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

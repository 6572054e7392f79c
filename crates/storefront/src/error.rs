//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. API handlers return `Result<T, AppError>`; the
//! body is always `{"error": "<message>"}`. Page handlers return
//! [`PageResult`], which renders the same error as an HTML page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use atiga_core::upload::UploadRejection;

use crate::filters;
use crate::services::catalog::{CatalogError, FormError};
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog operation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Multipart body could not be read.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => match err {
                CatalogError::Field(_) | CatalogError::Upload(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound => StatusCode::NOT_FOUND,
                CatalogError::Repository(_) | CatalogError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Form(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    ///
    /// Storage failures are forwarded so the admin can see which provider
    /// broke; database and internal details are hidden.
    fn public_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::Storage(err)) => storage_message(err),
            Self::Catalog(CatalogError::Repository(_)) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

fn storage_message(err: &StorageError) -> String {
    format!("Failed to store image: {err}")
}

impl From<UploadRejection> for AppError {
    fn from(err: UploadRejection) -> Self {
        Self::Catalog(CatalogError::Upload(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        self.report(status);
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl AppError {
    /// Capture server errors to Sentry.
    fn report(&self, status: StatusCode) {
        if status.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

/// An [`AppError`] raised by an HTML page handler.
#[derive(Debug)]
pub struct PageError(pub AppError);

/// Result type alias for page handlers.
pub type PageResult<T> = std::result::Result<T, PageError>;

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<CatalogError> for PageError {
    fn from(err: CatalogError) -> Self {
        Self(err.into())
    }
}

impl From<tower_sessions::session::Error> for PageError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self(err.into())
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "errors/error.html")]
struct ErrorPageTemplate {
    status: u16,
    message: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        self.0.report(status);

        let message = if status.is_server_error() {
            "Terjadi kesalahan pada server. Silakan coba lagi nanti.".to_string()
        } else {
            self.0.public_message()
        };

        (
            status,
            ErrorPageTemplate {
                status: status.as_u16(),
                message,
            },
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context to the logged-in admin.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the admin.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for admin actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atiga_core::ProductFieldError;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_request() {
        let (status, body) =
            body_of(CatalogError::Field(ProductFieldError::MissingName).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Nama produk wajib diisi");

        let (status, body) = body_of(UploadRejection::TooLarge.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File size must be less than 5MB");

        let (status, body) = body_of(FormError::Upload(UploadRejection::NotAnImage).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Only image files are allowed");
    }

    #[tokio::test]
    async fn test_page_error_renders_html() {
        let err = CatalogError::Repository(crate::db::RepositoryError::DataCorruption(
            "product 1 has negative price -1".to_string(),
        ));
        let response = PageError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = response.headers()[axum::http::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/html"), "{content_type}");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<h1>500</h1>"));
        assert!(html.contains("Terjadi kesalahan pada server"));
        assert!(!html.contains("negative price"));
        assert!(!html.contains("\"error\""));
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let (status, body) = body_of(CatalogError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Product not found");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let (status, body) = body_of(AppError::Unauthorized("Unauthorized".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_storage_message_is_forwarded() {
        let err = StorageError::Unreachable {
            provider: "Supabase Storage",
            message: "connection refused".to_string(),
        };
        let (status, body) = body_of(CatalogError::Storage(err).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("Cannot connect to Supabase Storage"));
    }

    #[tokio::test]
    async fn test_database_details_hidden() {
        let err = crate::db::RepositoryError::DataCorruption("price -1".to_string());
        let (status, body) = body_of(CatalogError::Repository(err).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}

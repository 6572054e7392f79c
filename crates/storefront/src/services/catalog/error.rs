//! Catalog error types.

use thiserror::Error;

use atiga_core::ProductFieldError;
use atiga_core::upload::UploadRejection;

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A product field failed validation.
    #[error(transparent)]
    Field(#[from] ProductFieldError),

    /// The uploaded file was rejected.
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    /// No product with this ID.
    #[error("Product not found")]
    NotFound,

    /// Database operation failed.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

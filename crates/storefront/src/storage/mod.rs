//! Product image storage.
//!
//! Uploaded images go to exactly one backend, chosen at startup by
//! `STORAGE_BACKEND`:
//!
//! - [`local::LocalStorage`] - files under `UPLOAD_DIR`, served at `/uploads/*`
//! - [`cloudinary::CloudinaryStorage`] - Cloudinary signed upload API
//! - [`supabase::SupabaseStorage`] - Supabase Storage object API
//!
//! Every backend returns a public URL from [`ImageStore::upload`] and accepts
//! that same URL back in [`ImageStore::delete`]. The URL is the only thing
//! persisted in the `product.image` column.

pub mod cloudinary;
pub mod local;
pub mod supabase;

use std::future::Future;

use axum::body::Bytes;
use thiserror::Error;

use crate::config::StorageConfig;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalStorage;
pub use supabase::SupabaseStorage;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Local filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider could not be reached at all.
    #[error("Cannot connect to {provider}: {message}")]
    Unreachable {
        provider: &'static str,
        message: String,
    },

    /// The provider answered with an error status.
    #[error("{provider} API error: {status} - {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider answered with something we could not read.
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// The URL was not produced by this backend.
    #[error("URL is not managed by the {0} backend")]
    ForeignUrl(&'static str),

    /// Backend could not be constructed.
    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

/// A place product images can be written to and removed from.
pub trait ImageStore {
    /// Store `bytes` and return the public URL of the new object.
    ///
    /// `filename` is the client-supplied name; backends sanitize it and
    /// prefix a millisecond timestamp.
    fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Remove the object a previously returned URL points at.
    ///
    /// Returns [`StorageError::ForeignUrl`] for URLs this backend did not
    /// produce (seed images, another provider's URL).
    fn delete(&self, url: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Short name for logs (`local`, `cloudinary`, `supabase`).
    fn backend_name(&self) -> &'static str;
}

/// The configured backend.
#[derive(Debug, Clone)]
pub enum Storage {
    Local(LocalStorage),
    Cloudinary(CloudinaryStorage),
    Supabase(SupabaseStorage),
}

impl Storage {
    /// Build the backend selected in configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` or `StorageError::Http` if an HTTP
    /// client for a remote provider cannot be built.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let storage = match config {
            StorageConfig::Local { upload_dir } => Self::Local(LocalStorage::new(upload_dir)),
            StorageConfig::Cloudinary(cfg) => Self::Cloudinary(CloudinaryStorage::new(cfg)?),
            StorageConfig::Supabase(cfg) => Self::Supabase(SupabaseStorage::new(cfg)?),
        };

        tracing::info!(backend = storage.backend_name(), "Image storage configured");
        Ok(storage)
    }

    /// Local upload directory, if the local backend is active.
    #[must_use]
    pub fn local_dir(&self) -> Option<&std::path::Path> {
        match self {
            Self::Local(local) => Some(local.dir()),
            _ => None,
        }
    }
}

impl ImageStore for Storage {
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        match self {
            Self::Local(s) => s.upload(bytes, filename, content_type).await,
            Self::Cloudinary(s) => s.upload(bytes, filename, content_type).await,
            Self::Supabase(s) => s.upload(bytes, filename, content_type).await,
        }
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(s) => s.delete(url).await,
            Self::Cloudinary(s) => s.delete(url).await,
            Self::Supabase(s) => s.delete(url).await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Local(s) => s.backend_name(),
            Self::Cloudinary(s) => s.backend_name(),
            Self::Supabase(s) => s.backend_name(),
        }
    }
}

/// Map a transport failure to `Unreachable` when nothing reached the provider.
pub(crate) fn classify_send_error(provider: &'static str, err: reqwest::Error) -> StorageError {
    if err.is_connect() || err.is_timeout() {
        StorageError::Unreachable {
            provider,
            message: format!("{err}. Check the network connection and the {provider} URL."),
        }
    } else {
        StorageError::Http(err)
    }
}

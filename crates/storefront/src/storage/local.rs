//! Local filesystem backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use tracing::instrument;

use atiga_core::upload::timestamped_filename;

use super::{ImageStore, StorageError};

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

const BACKEND: &str = "local";

/// Stores images as files in one directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Use `dir` for uploads. The directory is created on first upload.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The upload directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a `/uploads/{file}` URL to a path inside the upload directory.
    fn path_for_url(&self, url: &str) -> Result<PathBuf, StorageError> {
        let name = url
            .strip_prefix(PUBLIC_PREFIX)
            .ok_or(StorageError::ForeignUrl(BACKEND))?;

        let is_plain_name = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !is_plain_name {
            return Err(StorageError::ForeignUrl(BACKEND));
        }

        Ok(self.dir.join(name))
    }
}

impl ImageStore for LocalStorage {
    #[instrument(skip(self, bytes, _content_type), fields(backend = BACKEND, size = bytes.len()))]
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = timestamped_filename(filename, Utc::now());
        tokio::fs::write(self.dir.join(&name), &bytes).await?;

        tracing::info!(file = %name, "Stored image on local disk");
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self.path_for_url(url)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted local image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Local image already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested"));

        let url = storage
            .upload(Bytes::from_static(b"jpeg-bytes"), "meja jati.jpg", "image/jpeg")
            .await
            .unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("-meja_jati.jpg"));

        let name = url.strip_prefix(PUBLIC_PREFIX).unwrap();
        let stored = std::fs::read(dir.path().join("nested").join(name)).unwrap();
        assert_eq!(stored, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let url = storage
            .upload(Bytes::from_static(b"png"), "kursi.png", "image/png")
            .await
            .unwrap();
        storage.delete(&url).await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.delete("/uploads/1700000000000-gone.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_and_traversal_urls() {
        let storage = LocalStorage::new("/tmp/never-used");

        for url in [
            "/images/dining-table.jpg",
            "https://res.cloudinary.com/demo/image/upload/v1/a.jpg",
            "/uploads/",
            "/uploads/..",
            "/uploads/../secret.txt",
            "/uploads/a\\b.jpg",
        ] {
            let err = storage.delete(url).await.unwrap_err();
            assert!(matches!(err, StorageError::ForeignUrl("local")), "{url}");
        }
    }
}

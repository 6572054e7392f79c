//! Supabase Storage backend.
//!
//! Objects are written to `{bucket}/furniture-store/{millis}-{name}` with
//! upsert enabled and served from the bucket's public URL.

use axum::body::Bytes;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::instrument;
use url::Url;

use atiga_core::upload::timestamped_filename;

use super::{ImageStore, StorageError, classify_send_error};
use crate::config::SupabaseConfig;

/// Folder prefix inside the bucket.
const FOLDER: &str = "furniture-store";

const BACKEND: &str = "supabase";
const PROVIDER: &str = "Supabase Storage";

/// Supabase Storage client authenticated with the service role key.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    /// Project URL without trailing slash.
    base: String,
    origin: String,
    bucket: String,
}

impl SupabaseStorage {
    /// Create a new Supabase Storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let key = config.service_role_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| StorageError::Config(format!("invalid service role key: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let mut apikey = HeaderValue::from_str(key)
            .map_err(|e| StorageError::Config(format!("invalid service role key: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base: config.url.as_str().trim_end_matches('/').to_string(),
            origin: config.url.origin().ascii_serialization(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{path}", self.base, self.bucket)
    }

    /// Split a public object URL into `(bucket, path)`.
    ///
    /// Looks for the `public` segment: the next segment is the bucket and the
    /// rest is the object path.
    fn locate(&self, url: &str) -> Result<(String, String), StorageError> {
        let foreign = || StorageError::ForeignUrl(BACKEND);

        let parsed = Url::parse(url).map_err(|_| foreign())?;
        if parsed.origin().ascii_serialization() != self.origin {
            return Err(foreign());
        }

        let segments: Vec<&str> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
        let public = segments.iter().position(|s| *s == "public").ok_or_else(foreign)?;

        let mut rest = segments.iter().skip(public + 1).copied();
        let bucket = rest.next().filter(|b| !b.is_empty()).ok_or_else(foreign)?;
        let path = rest.collect::<Vec<_>>().join("/");
        if path.is_empty() {
            return Err(foreign());
        }

        Ok((bucket.to_string(), path))
    }

    async fn api_error(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StorageError::Api {
            provider: PROVIDER,
            status,
            message,
        }
    }
}

impl ImageStore for SupabaseStorage {
    #[instrument(skip(self, bytes), fields(backend = BACKEND, size = bytes.len()))]
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let path = format!("{FOLDER}/{}", timestamped_filename(filename, Utc::now()));

        let response = self
            .client
            .post(self.object_url(&self.bucket, &path))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .header("cache-control", "max-age=3600")
            .body(bytes)
            .send()
            .await
            .map_err(|e| classify_send_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        tracing::info!(bucket = %self.bucket, path = %path, "Uploaded image to Supabase Storage");
        Ok(self.public_url(&path))
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let (bucket, path) = self.locate(url)?;

        let response = self
            .client
            .delete(format!("{}/storage/v1/object/{bucket}", self.base))
            .json(&json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(|e| classify_send_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        tracing::info!(bucket = %bucket, path = %path, "Deleted Supabase image");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(&SupabaseConfig {
            url: Url::parse("https://abc.supabase.co/").unwrap(),
            service_role_key: SecretString::from("service-role-key"),
            bucket: "images".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_public_url_layout() {
        let s = storage();
        assert_eq!(
            s.public_url("furniture-store/1-meja.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/images/furniture-store/1-meja.jpg"
        );
        assert_eq!(
            s.object_url("images", "furniture-store/1-meja.jpg"),
            "https://abc.supabase.co/storage/v1/object/images/furniture-store/1-meja.jpg"
        );
    }

    #[test]
    fn test_locate_round_trips_public_url() {
        let s = storage();
        let url = s.public_url("furniture-store/1700000000123-kursi.png");
        let (bucket, path) = s.locate(&url).unwrap();
        assert_eq!(bucket, "images");
        assert_eq!(path, "furniture-store/1700000000123-kursi.png");
    }

    #[test]
    fn test_locate_ignores_transform_query() {
        let s = storage();
        let (bucket, path) = s
            .locate("https://abc.supabase.co/storage/v1/object/public/images/a/b.jpg?width=400")
            .unwrap();
        assert_eq!(bucket, "images");
        assert_eq!(path, "a/b.jpg");
    }

    #[test]
    fn test_locate_rejects_foreign_urls() {
        let s = storage();
        for url in [
            "/uploads/1-a.jpg",
            "https://other.supabase.co/storage/v1/object/public/images/a.jpg",
            "https://abc.supabase.co/storage/v1/object/images/a.jpg",
            "https://abc.supabase.co/storage/v1/object/public/images",
        ] {
            assert!(
                matches!(s.locate(url), Err(StorageError::ForeignUrl("supabase"))),
                "{url}"
            );
        }
    }
}

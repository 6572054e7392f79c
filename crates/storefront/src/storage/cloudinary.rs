//! Cloudinary backend using the signed upload REST API.
//!
//! Uploads go to `POST /v1_1/{cloud}/image/upload` with a signed request
//! (SHA-1 unless the account is switched to SHA-256); deletion uses
//! `/image/destroy`. Objects live in the
//! `furniture-store/` folder and are addressed by `public_id`.

use std::collections::BTreeMap;

use axum::body::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::instrument;
use url::Url;

use atiga_core::upload::{strip_extension, timestamped_filename};

use super::{ImageStore, StorageError, classify_send_error};
use crate::config::{CloudinaryConfig, SignatureAlgorithm};

/// Cloudinary API base URL.
const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Host serving delivered assets.
const DELIVERY_HOST: &str = "res.cloudinary.com";

/// Folder prefix for every product image.
const FOLDER: &str = "furniture-store";

const BACKEND: &str = "cloudinary";
const PROVIDER: &str = "Cloudinary";

/// Cloudinary upload client.
#[derive(Clone)]
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    algorithm: SignatureAlgorithm,
}

impl std::fmt::Debug for CloudinaryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryStorage")
            .field("cloud_name", &self.cloud_name)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStorage {
    /// Create a new Cloudinary client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            algorithm: config.signature_algorithm,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }

    /// Extract the `public_id` from a delivery URL produced by this account.
    ///
    /// `https://res.cloudinary.com/{cloud}/image/upload/v123/furniture-store/1-a.jpg`
    /// yields `furniture-store/1-a`.
    fn public_id_from_url(&self, url: &str) -> Result<String, StorageError> {
        let foreign = || StorageError::ForeignUrl(BACKEND);

        let parsed = Url::parse(url).map_err(|_| foreign())?;
        if parsed.host_str() != Some(DELIVERY_HOST) {
            return Err(foreign());
        }

        let segments: Vec<&str> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
        let mut rest = segments.iter().copied();
        if rest.next() != Some(self.cloud_name.as_str()) {
            return Err(foreign());
        }
        if rest.next() != Some("image") || rest.next() != Some("upload") {
            return Err(foreign());
        }

        let mut remaining: Vec<&str> = rest.collect();
        if remaining.first().is_some_and(|s| is_version_segment(s)) {
            remaining.remove(0);
        }
        if remaining.is_empty() {
            return Err(foreign());
        }

        let joined = remaining.join("/");
        Ok(strip_extension(&joined).to_string())
    }

    /// Parse an error body, falling back to the raw text.
    async fn api_error(response: reqwest::Response) -> StorageError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        StorageError::Api {
            provider: PROVIDER,
            status,
            message,
        }
    }
}

/// `v1700000000` style version segments.
fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

/// Cloudinary request signature.
///
/// Parameters are sorted by name, joined as `k=v&k=v`, the API secret is
/// appended, and the result is hashed (hex).
fn sign(params: &BTreeMap<&str, String>, api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    match algorithm {
        SignatureAlgorithm::Sha1 => digest_hex::<Sha1>(&to_sign, api_secret),
        SignatureAlgorithm::Sha256 => digest_hex::<Sha256>(&to_sign, api_secret),
    }
}

fn digest_hex<D: Digest>(to_sign: &str, api_secret: &str) -> String {
    let mut hasher = D::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl ImageStore for CloudinaryStorage {
    #[instrument(skip(self, bytes), fields(backend = BACKEND, size = bytes.len()))]
    async fn upload(
        &self,
        bytes: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let now = Utc::now();
        let object = timestamped_filename(filename, now);
        let public_id = format!("{FOLDER}/{}", strip_extension(&object));
        let timestamp = now.timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.clone());
        params.insert("timestamp", timestamp.clone());
        let signature = sign(&params, self.api_secret.expose_secret(), self.algorithm);

        let file = Part::bytes(bytes.to_vec())
            .file_name(object)
            .mime_str(content_type)?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("public_id", public_id.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", self.algorithm.as_str());

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_send_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(format!("upload response: {e}")))?;

        tracing::info!(public_id = %public_id, "Uploaded image to Cloudinary");
        Ok(uploaded.secure_url)
    }

    #[instrument(skip(self), fields(backend = BACKEND))]
    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let public_id = self.public_id_from_url(url)?;
        let timestamp = Utc::now().timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.clone());
        params.insert("timestamp", timestamp.clone());
        let signature = sign(&params, self.api_secret.expose_secret(), self.algorithm);

        let form = [
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", self.algorithm.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| classify_send_error(PROVIDER, e))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(format!("destroy response: {e}")))?;

        match destroyed.result.as_str() {
            "ok" => {
                tracing::info!(public_id = %public_id, "Deleted Cloudinary image");
                Ok(())
            }
            "not found" => {
                tracing::warn!(public_id = %public_id, "Cloudinary image already gone");
                Ok(())
            }
            other => Err(StorageError::Parse(format!("unexpected destroy result '{other}'"))),
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

    fn storage() -> CloudinaryStorage {
        CloudinaryStorage::new(&CloudinaryConfig {
            cloud_name: "atiga".to_string(),
            api_key: "1234".to_string(),
            api_secret: SecretString::from("abcd"),
            signature_algorithm: SignatureAlgorithm::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_sign_matches_documented_sha1_signature() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());
        params.insert("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string());

        assert_eq!(
            sign(&params, "abcd", SignatureAlgorithm::Sha1),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_sign_sha256_when_configured() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());

        let expected = {
            let mut h = Sha256::new();
            h.update(b"public_id=sample_image&timestamp=1315060510abcd");
            hex::encode(h.finalize())
        };
        assert_eq!(sign(&params, "abcd", SignatureAlgorithm::Sha256), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_public_id_from_url() {
        let s = storage();
        assert_eq!(
            s.public_id_from_url(
                "https://res.cloudinary.com/atiga/image/upload/v1700000000/furniture-store/1700000000123-meja.jpg"
            )
            .unwrap(),
            "furniture-store/1700000000123-meja"
        );
        assert_eq!(
            s.public_id_from_url("https://res.cloudinary.com/atiga/image/upload/furniture-store/x.png")
                .unwrap(),
            "furniture-store/x"
        );
    }

    #[test]
    fn test_public_id_rejects_foreign_urls() {
        let s = storage();
        for url in [
            "/uploads/1-a.jpg",
            "https://res.cloudinary.com/someone-else/image/upload/v1/a.jpg",
            "https://abc.supabase.co/storage/v1/object/public/images/a.jpg",
            "https://res.cloudinary.com/atiga/video/upload/v1/a.mp4",
            "https://res.cloudinary.com/atiga/image/upload/v1",
        ] {
            assert!(
                matches!(s.public_id_from_url(url), Err(StorageError::ForeignUrl("cloudinary"))),
                "{url}"
            );
        }
    }

    #[test]
    fn test_version_segment() {
        assert!(is_version_segment("v1700000000"));
        assert!(!is_version_segment("v"));
        assert!(!is_version_segment("furniture-store"));
    }
}

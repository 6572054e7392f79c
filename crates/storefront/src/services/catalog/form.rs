//! Multipart form parsing for product and upload requests.

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use thiserror::Error;

use atiga_core::upload::{UploadRejection, validate_image};
use atiga_core::{ProductDraft, ProductFieldError, parse_featured};

/// Content type assumed when a file part does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors reading a multipart body.
#[derive(Debug, Error)]
pub enum FormError {
    /// The body exceeded the request size limit.
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    /// The body was not valid multipart data.
    #[error("Invalid form data: {0}")]
    Malformed(String),
}

impl From<MultipartError> for FormError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::Upload(UploadRejection::TooLarge)
        } else {
            Self::Malformed(err.body_text())
        }
    }
}

/// A file part received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl UploadedFile {
    /// Check the declared type and size against the image rules.
    ///
    /// # Errors
    ///
    /// Returns the matching `UploadRejection`.
    pub fn validate(&self) -> Result<(), UploadRejection> {
        validate_image(Some(&self.content_type), self.bytes.len())
    }
}

/// Fields of the admin product form (`POST`/`PUT /api/products`).
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub featured: String,
    pub image: Option<UploadedFile>,
    pub remove_image: bool,
}

impl ProductForm {
    /// Read every known field from a multipart body. Unknown fields are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `FormError` if the body cannot be read.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "name" => form.name = field.text().await?,
                "description" => form.description = field.text().await?,
                "price" => form.price = field.text().await?,
                "category" => form.category = field.text().await?,
                "featured" => form.featured = field.text().await?,
                "remove_image" => form.remove_image = parse_featured(&field.text().await?),
                "image" => form.image = read_file(field).await?,
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate the text fields into a draft.
    ///
    /// # Errors
    ///
    /// Returns `ProductFieldError` for a missing name or category or a bad
    /// price.
    pub fn draft(&self) -> Result<ProductDraft, ProductFieldError> {
        ProductDraft::from_form(
            &self.name,
            &self.description,
            &self.price,
            &self.category,
            &self.featured,
        )
    }
}

/// Read the file part called `field_name`, ignoring all other parts.
///
/// # Errors
///
/// Returns `FormError` if the body cannot be read.
pub async fn read_file_field(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Option<UploadedFile>, FormError> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(field_name) {
            file = read_file(field).await?;
        }
    }

    Ok(file)
}

/// Browsers send an empty part with no filename when no file was picked;
/// that counts as no file.
async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, FormError> {
    let filename = field.file_name().unwrap_or_default().to_owned();
    let content_type = field
        .content_type()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_owned();
    let bytes = field.bytes().await?;

    if bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedFile {
        bytes,
        filename,
        content_type,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    use super::*;

    const BOUNDARY: &str = "atiga-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, &'a [u8]),
    }

    async fn multipart(parts: &[Part<'_>]) -> Multipart {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, filename, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/products")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_product_form_reads_all_fields() {
        let body = multipart(&[
            Part::Text("name", "Meja Makan Jati"),
            Part::Text("description", "Enam kursi"),
            Part::Text("price", "2500000"),
            Part::Text("category", "Meja"),
            Part::Text("featured", "true"),
            Part::Text("unknown", "ignored"),
            Part::File("image", "meja.jpg", "image/jpeg", b"\xff\xd8\xff"),
        ])
        .await;

        let form = ProductForm::from_multipart(body).await.unwrap();
        assert_eq!(form.name, "Meja Makan Jati");
        assert_eq!(form.category, "Meja");
        assert!(!form.remove_image);

        let image = form.image.as_ref().unwrap();
        assert_eq!(image.filename, "meja.jpg");
        assert_eq!(image.content_type, "image/jpeg");
        assert_eq!(image.bytes.len(), 3);
        assert!(image.validate().is_ok());

        let draft = form.draft().unwrap();
        assert!(draft.featured);
        assert_eq!(draft.price.display_idr(), "Rp 2.500.000");
    }

    #[tokio::test]
    async fn test_empty_file_part_is_no_file() {
        let body = multipart(&[
            Part::Text("name", "Kursi"),
            Part::File("image", "", "application/octet-stream", b""),
            Part::Text("remove_image", "1"),
        ])
        .await;

        let form = ProductForm::from_multipart(body).await.unwrap();
        assert!(form.image.is_none());
        assert!(form.remove_image);
    }

    #[tokio::test]
    async fn test_missing_name_fails_draft() {
        let body = multipart(&[Part::Text("category", "Sofa")]).await;
        let form = ProductForm::from_multipart(body).await.unwrap();
        assert!(matches!(form.draft(), Err(ProductFieldError::MissingName)));
    }

    #[tokio::test]
    async fn test_non_image_file_rejected() {
        let body = multipart(&[Part::File("file", "notes.txt", "text/plain", b"hello")]).await;
        let file = read_file_field(body, "file").await.unwrap().unwrap();
        assert!(matches!(file.validate(), Err(UploadRejection::NotAnImage)));
    }

    #[tokio::test]
    async fn test_read_file_field_ignores_other_parts() {
        let body = multipart(&[
            Part::File("image", "a.png", "image/png", b"png"),
            Part::Text("note", "x"),
        ])
        .await;
        assert!(read_file_field(body, "file").await.unwrap().is_none());
    }
}

//! Upload limits and object naming shared by every storage backend.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Largest accepted image, in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Why an uploaded file was refused before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No file uploaded")]
    Missing,
    #[error("Only image files are allowed")]
    NotAnImage,
    #[error("File size must be less than 5MB")]
    TooLarge,
}

/// Replace every character outside `[a-zA-Z0-9.-]` with `_`.
///
/// Works per Unicode scalar, so `"kursi rotan ü.jpg"` becomes
/// `"kursi_rotan__.jpg"`. An empty name becomes `"image"`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "image".to_string();
    }

    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Object name for a stored upload: `"{unix millis}-{sanitized name}"`.
#[must_use]
pub fn timestamped_filename(name: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.timestamp_millis(), sanitize_filename(name))
}

/// Strip the final extension, if any (`"a.b.jpg"` -> `"a.b"`).
#[must_use]
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Check an uploaded file before handing it to storage.
///
/// # Errors
///
/// - [`UploadRejection::Missing`] for an empty body
/// - [`UploadRejection::NotAnImage`] unless the content type starts with `image/`
/// - [`UploadRejection::TooLarge`] above [`MAX_IMAGE_BYTES`]
pub fn validate_image(content_type: Option<&str>, len: usize) -> Result<(), UploadRejection> {
    if len == 0 {
        return Err(UploadRejection::Missing);
    }

    let is_image = content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
    if !is_image {
        return Err(UploadRejection::NotAnImage);
    }

    if len > MAX_IMAGE_BYTES {
        return Err(UploadRejection::TooLarge);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("meja jati (1).jpg"), "meja_jati__1_.jpg");
        assert_eq!(sanitize_filename("kursi-rotan.PNG"), "kursi-rotan.PNG");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("sofa ü.webp"), "sofa__.webp");
        assert_eq!(sanitize_filename(""), "image");
    }

    #[test]
    fn test_timestamped_filename() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(
            timestamped_filename("lemari jati.jpg", now),
            "1700000000123-lemari_jati.jpg"
        );
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("buffet.jpg"), "buffet");
        assert_eq!(strip_extension("a.b.png"), "a.b");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image(Some("image/jpeg"), 1024), Ok(()));
        assert_eq!(validate_image(Some("image/png"), MAX_IMAGE_BYTES), Ok(()));
        assert_eq!(
            validate_image(Some("image/png"), MAX_IMAGE_BYTES + 1),
            Err(UploadRejection::TooLarge)
        );
        assert_eq!(
            validate_image(Some("application/pdf"), 10),
            Err(UploadRejection::NotAnImage)
        );
        assert_eq!(validate_image(None, 10), Err(UploadRejection::NotAnImage));
        assert_eq!(validate_image(Some("image/jpeg"), 0), Err(UploadRejection::Missing));
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(UploadRejection::Missing.to_string(), "No file uploaded");
        assert_eq!(UploadRejection::NotAnImage.to_string(), "Only image files are allowed");
        assert_eq!(UploadRejection::TooLarge.to_string(), "File size must be less than 5MB");
    }
}

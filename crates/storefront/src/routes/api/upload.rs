//! Standalone image upload (`POST /api/upload`).

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;
use tracing::instrument;

use atiga_core::upload::UploadRejection;

use super::multipart_rejection;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::catalog::form::read_file_field;
use crate::state::AppState;

/// Successful upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_url: String,
    pub filename: String,
}

/// Store the `file` part and return its public URL.
///
/// # Errors
///
/// Returns 401 without a session, 400 when the file is missing, not an
/// image, or too large, and 500 if the storage backend fails.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let multipart = multipart.map_err(|r| multipart_rejection(&r))?;
    let file = read_file_field(multipart, "file")
        .await?
        .ok_or(UploadRejection::Missing)?;

    let image_url = state.catalog().upload(file).await?;
    let filename = stored_filename(&image_url).to_string();

    Ok(Json(UploadResponse {
        success: true,
        image_url,
        filename,
    }))
}

/// Last path segment of a stored image URL.
fn stored_filename(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

//! Web app manifest route handler.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Serve the web app manifest.
pub async fn manifest() -> Response {
    let manifest = json!({
        "name": "Atiga Meubel",
        "short_name": "Atiga",
        "description": "Furnitur jati dan rotan premium dari Jepara",
        "start_url": "/",
        "scope": "/",
        "display": "standalone",
        "theme_color": "#5c3d2e",
        "background_color": "#faf7f2",
        "icons": [
            {
                "src": "/static/icons/icon.svg",
                "sizes": "any",
                "type": "image/svg+xml",
                "purpose": "any"
            }
        ]
    });

    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        manifest.to_string(),
    )
        .into_response()
}

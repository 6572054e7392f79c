//! Service worker route handler.
//!
//! The worker script is rendered from `templates/sw.js` so cache names and the
//! precache list are defined here, next to the routes they refer to.

use askama::Template;
use axum::{
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Cache for API responses and anything not matched below.
pub const GENERIC_CACHE: &str = "furniture-store-v1";
/// Cache for pages fetched by navigation.
pub const STATIC_CACHE: &str = "static-v1";
/// Cache for images.
pub const IMAGE_CACHE: &str = "images-v1";

/// Pages cached when the worker installs.
pub const PRECACHE_URLS: [&str; 7] = [
    "/",
    "/products",
    "/about",
    "/contact",
    "/materials",
    "/info-order",
    "/manifest.json",
];

/// Service worker script template.
#[derive(Template)]
#[template(path = "sw.js", escape = "none")]
pub struct ServiceWorkerTemplate {
    pub generic_cache: &'static str,
    pub static_cache: &'static str,
    pub image_cache: &'static str,
    /// JSON array literal.
    pub precache_json: String,
}

impl ServiceWorkerTemplate {
    /// Worker with the current cache names and precache list.
    #[must_use]
    pub fn current() -> Self {
        Self {
            generic_cache: GENERIC_CACHE,
            static_cache: STATIC_CACHE,
            image_cache: IMAGE_CACHE,
            precache_json: serde_json::to_string(&PRECACHE_URLS).unwrap_or_else(|_| "[]".into()),
        }
    }
}

/// Serve `/sw.js`.
///
/// `Cache-Control: no-cache` makes browsers revalidate on every load so a new
/// worker is picked up promptly.
pub async fn service_worker() -> Response {
    match ServiceWorkerTemplate::current().render() {
        Ok(script) => (
            [
                (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache"),
                (HeaderName::from_static("service-worker-allowed"), "/"),
            ],
            script,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render service worker");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_script_contains_caches_and_precache_list() {
        let script = ServiceWorkerTemplate::current().render().unwrap();
        assert!(script.contains("'furniture-store-v1'"));
        assert!(script.contains("'static-v1'"));
        assert!(script.contains("'images-v1'"));
        assert!(script.contains(r#""/info-order""#));
        assert!(script.contains(r#""/manifest.json""#));
    }

    #[test]
    fn test_precache_entries_added_individually() {
        let script = ServiceWorkerTemplate::current().render().unwrap();
        assert!(script.contains("Promise.allSettled"));
        assert!(script.contains("cache.add(url)"));
        assert!(!script.contains("addAll"));
    }

    #[tokio::test]
    async fn test_headers() {
        let response = service_worker().await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers["service-worker-allowed"], "/");
    }
}

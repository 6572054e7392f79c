//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero + featured products)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//!
//! # Pages (markdown)
//! GET  /about | /materials | /contact | /info-order
//!
//! # PWA
//! GET  /manifest.json          - Web app manifest
//! GET  /sw.js                  - Service worker
//!
//! # Admin (session)
//! GET  /admin                  - Login form
//! POST /admin/login            - Login action
//! POST /admin/logout           - Logout action
//! GET  /admin/dashboard        - Dashboard
//! GET  /admin/products         - Product management
//!
//! # JSON API
//! GET    /api/products         - List products
//! POST   /api/products         - Create product (admin)
//! GET    /api/products/{id}    - Get product
//! PUT    /api/products/{id}    - Replace product (admin)
//! DELETE /api/products/{id}    - Delete product (admin)
//! POST   /api/upload           - Upload an image (admin)
//!
//! # Files
//! GET  /static/*               - CSS, JS, icons
//! GET  /uploads/*              - Uploaded images (local backend only)
//! ```

pub mod admin;
pub mod api;
pub mod home;
pub mod manifest;
pub mod pages;
pub mod products;
pub mod service_worker;

use axum::{
    Router,
    extract::{OriginalUri, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .merge(pages::router())
        .route("/manifest.json", get(manifest::manifest))
        .route("/sw.js", get(service_worker::service_worker))
        .nest("/admin", admin::router())
        .nest("/api", api::router())
}

/// Build the full application with middleware.
///
/// Sentry layers are added by the binary; everything else is here so tests
/// exercise the same stack.
pub fn app<S: SessionStore + Clone>(state: AppState, session_store: S) -> Router {
    let session_layer = create_session_layer(session_store, state.config());

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR));

    if let Some(dir) = state.catalog().storage().local_dir() {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .fallback(fallback)
        .layer(session_layer)
        .layer(from_fn_with_state(state.clone(), security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Unknown paths: JSON for the API, the 404 page otherwise.
async fn fallback(OriginalUri(uri): OriginalUri) -> axum::response::Response {
    use axum::response::IntoResponse;

    if uri.path().starts_with("/api/") {
        crate::error::AppError::NotFound("Not found".to_string()).into_response()
    } else {
        products::not_found("Halaman tidak ditemukan.")
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::{AdminConfig, LogFormat, StorageConfig, StorefrontConfig};
    use crate::content::ContentStore;
    use crate::services::auth::hash_password;

    const PASSWORD: &str = "kayu-jati-jepara";
    const BOUNDARY: &str = "atiga-router-boundary";

    /// App over a lazy pool; requests that reach the database fail, so these
    /// tests only cover paths that answer before any query runs.
    fn test_app() -> Router {
        let upload_dir = std::env::temp_dir().join("atiga-router-tests");
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/atiga_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin: AdminConfig {
                username: "admin".to_string(),
                password_hash: SecretString::from(hash_password(PASSWORD).unwrap()),
            },
            storage: StorageConfig::Local { upload_dir },
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/atiga_test")
            .unwrap();
        let state = AppState::new(config, pool, ContentStore::default()).unwrap();
        app(state, MemoryStore::default())
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Log in and return the session cookie.
    async fn login(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(
                Request::post("/admin/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("x-forwarded-for", "198.51.100.7")
                    .body(Body::from(format!("username=admin&password={PASSWORD}")))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/dashboard");

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    fn product_body(name: &str, image: Option<(&str, &str, Vec<u8>)>) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, value) in [
            ("name", name),
            ("price", "1500000"),
            ("category", "Meja"),
            ("featured", "false"),
        ] {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn create_request(cookie: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::post("/api/products").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_create_without_session_is_unauthorized() {
        let response = test_app()
            .oneshot(create_request(None, product_body("Meja Makan", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let response = test_app()
            .oneshot(Request::get("/api/products/meja").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid product ID");
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_404() {
        let response = test_app()
            .oneshot(Request::get("/api/nothing-here").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn test_unknown_page_is_404() {
        let response = test_app()
            .oneshot(Request::get("/lemari-ajaib").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_content_page_is_404() {
        let response = test_app()
            .oneshot(Request::get("/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_service_worker_route() {
        let response = test_app()
            .oneshot(Request::get("/sw.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(response.headers()["service-worker-allowed"], "/");
    }

    #[tokio::test]
    async fn test_manifest_route() {
        let response = test_app()
            .oneshot(Request::get("/manifest.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "Atiga Meubel");
    }

    #[tokio::test]
    async fn test_dashboard_redirects_to_login() {
        let response = test_app()
            .oneshot(Request::get("/admin/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/admin");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let response = test_app()
            .oneshot(
                Request::post("/admin/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("x-forwarded-for", "198.51.100.8")
                    .body(Body::from("username=admin&password=salah-sekali"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let app = test_app();
        let cookie = login(&app).await;

        let response = app
            .oneshot(create_request(Some(&cookie), product_body("  ", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Nama produk wajib diisi");
    }

    #[tokio::test]
    async fn test_create_rejects_non_image_file() {
        let app = test_app();
        let cookie = login(&app).await;

        let body = product_body(
            "Meja Makan",
            Some(("catatan.txt", "text/plain", b"bukan gambar".to_vec())),
        );
        let response = app
            .oneshot(create_request(Some(&cookie), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Only image files are allowed"
        );
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_image() {
        let app = test_app();
        let cookie = login(&app).await;

        let body = product_body(
            "Meja Makan",
            Some(("besar.jpg", "image/jpeg", vec![0u8; 6 * 1024 * 1024])),
        );
        let response = app
            .oneshot(create_request(Some(&cookie), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "File size must be less than 5MB"
        );
    }
}

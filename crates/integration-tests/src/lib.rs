//! Integration tests for the Atiga Meubel storefront.
//!
//! Tests talk to a running server over HTTP and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the storefront with the local storage backend
//! cargo run -p atiga-cli -- migrate
//! STORAGE_BACKEND=local cargo run -p atiga-storefront
//!
//! # Run integration tests
//! TEST_ADMIN_USERNAME=admin TEST_ADMIN_PASSWORD=... \
//!     cargo test -p atiga-integration-tests -- --ignored --test-threads=1
//! ```
//!
//! # Environment Variables
//!
//! - `TEST_BASE_URL` - Storefront URL (default `http://localhost:3000`)
//! - `TEST_ADMIN_USERNAME` / `TEST_ADMIN_PASSWORD` - Admin credentials

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::header::{COOKIE, HeaderMap, HeaderValue, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, redirect};
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Name of the storefront session cookie.
const SESSION_COOKIE: &str = "atiga_session=";

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Build a URL for `path` on the server under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url().trim_end_matches('/'))
}

/// Client with a cookie jar that does not follow redirects.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn admin_credentials() -> (String, String) {
    let username = std::env::var("TEST_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password =
        std::env::var("TEST_ADMIN_PASSWORD").expect("TEST_ADMIN_PASSWORD must be set");
    (username, password)
}

/// Log in on `client` and return the login response.
async fn login(client: &Client) -> reqwest::Response {
    let (username, password) = admin_credentials();
    let resp = client
        .post(url("/admin/login"))
        .form(&[("username", username.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to log in");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login should redirect");
    resp
}

/// Session cookie shared by every test in one binary.
///
/// The login route is rate limited, so tests reuse one session instead of
/// logging in each time. Only the cookie string is cached because each
/// `#[tokio::test]` runs on its own runtime.
static ADMIN_COOKIE: OnceCell<String> = OnceCell::const_new();

async fn admin_cookie() -> &'static str {
    ADMIN_COOKIE
        .get_or_init(|| async {
            let resp = login(&client()).await;
            resp.headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find(|v| v.starts_with(SESSION_COOKIE))
                .and_then(|v| v.split(';').next())
                .expect("login should set the session cookie")
                .to_string()
        })
        .await
}

/// Client carrying the shared admin session.
pub async fn admin_client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(admin_cookie().await).expect("valid cookie"),
    );

    Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Client with its own freshly logged-in session, for tests that end it.
pub async fn fresh_admin_client() -> Client {
    let client = client();
    login(&client).await;
    client
}

/// Product as returned by the JSON API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub category: String,
    pub featured: bool,
}

/// A unique product name so parallel runs do not collide.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4().simple())
}

/// A tiny PNG (1x1, transparent).
#[must_use]
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// Multipart product form; attaches a PNG named `image_name` when given.
#[must_use]
pub fn product_form(name: &str, price: &str, featured: bool, image_name: Option<&str>) -> Form {
    let form = Form::new()
        .text("name", name.to_string())
        .text("description", "Dibuat untuk pengujian")
        .text("price", price.to_string())
        .text("category", "Meja")
        .text("featured", if featured { "true" } else { "false" });

    match image_name {
        Some(file_name) => form.part(
            "image",
            Part::bytes(png_bytes())
                .file_name(file_name.to_string())
                .mime_str("image/png")
                .expect("valid mime"),
        ),
        None => form,
    }
}

/// Create a product through the API.
pub async fn create_product(client: &Client, form: Form) -> ApiProduct {
    let resp = client
        .post(url("/api/products"))
        .multipart(form)
        .send()
        .await
        .expect("Failed to create product");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse product")
}

/// Delete a product, ignoring the outcome.
pub async fn delete_product(client: &Client, id: i32) {
    let _ = client
        .delete(url(&format!("/api/products/{id}")))
        .send()
        .await;
}

/// Resolve an image URL from the API against the server for local uploads.
#[must_use]
pub fn image_url(image: &str) -> String {
    if image.starts_with('/') {
        url(image)
    } else {
        image.to_string()
    }
}

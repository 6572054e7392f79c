//! Informational page route handlers.
//!
//! Serves the markdown pages loaded into the content store at startup.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use crate::filters;
use crate::routes::products::not_found;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub title: String,
    pub description: String,
    pub content_html: String,
}

fn serve_content_page(state: &AppState, slug: &str) -> Response {
    match state.content().get_page(slug) {
        Some(page) => ContentPageTemplate {
            title: page.meta.title.clone(),
            description: page.meta.description.clone().unwrap_or_default(),
            content_html: page.content_html.clone(),
        }
        .into_response(),
        None => {
            tracing::warn!(slug, "Content page missing");
            not_found("Halaman tidak ditemukan.")
        }
    }
}

/// Display the About page.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "about")
}

/// Display the Materials page (wood, rattan, and upholstery fabrics).
#[instrument(skip(state))]
pub async fn materials(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "materials")
}

/// Display the Contact page.
#[instrument(skip(state))]
pub async fn contact(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "contact")
}

/// Display the ordering, payment, and shipping information page.
#[instrument(skip(state))]
pub async fn info_order(State(state): State<AppState>) -> Response {
    serve_content_page(&state, "info-order")
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/materials", get(materials))
        .route("/contact", get(contact))
        .route("/info-order", get(info_order))
}

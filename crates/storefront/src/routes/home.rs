//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::PageResult;
use crate::filters;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Home page template: hero banner plus featured products.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
}

/// Display the home page.
///
/// # Errors
///
/// Returns an error if the featured products cannot be loaded.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> PageResult<impl IntoResponse> {
    let featured = state.catalog().featured().await?;

    Ok(HomeTemplate {
        featured: featured.iter().map(ProductView::from).collect(),
    })
}

//! Admin panel route handlers.
//!
//! # Routes
//!
//! ```text
//! GET  /admin             - Login form (redirects to the dashboard when logged in)
//! POST /admin/login       - Check credentials, start the session (rate limited)
//! POST /admin/logout      - End the session
//! GET  /admin/dashboard   - Product and category counts
//! GET  /admin/products    - Product table and create/edit form (?edit={id})
//! ```
//!
//! The product form posts to the JSON API through `static/js/admin.js`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use atiga_core::{CATEGORY_OPTIONS, Product, ProductId};

use crate::error::{PageResult, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAdmin, RequireAdmin, auth_rate_limiter, clear_current_admin, set_current_admin,
};
use crate::routes::products::ProductView;
use crate::services::auth::AdminAuth;
use crate::services::catalog::{CatalogError, CatalogStats};
use crate::state::AppState;
use crate::storage::ImageStore;

/// Products listed under "recently added" on the dashboard.
const RECENT_LIMIT: usize = 5;

/// Login form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin: String,
    pub stats: CatalogStats,
    pub recent: Vec<ProductView>,
    pub backend: &'static str,
}

/// Product management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub admin: String,
    pub products: Vec<ProductView>,
    pub form: ProductFormView,
    pub categories: Vec<CategoryOption>,
    pub notice: Option<String>,
}

/// Values pre-filled in the product form.
#[derive(Debug, Clone, Default)]
pub struct ProductFormView {
    pub id: Option<i32>,
    pub name: String,
    pub description: String,
    /// Plain number, no separators.
    pub price: String,
    pub category: String,
    pub featured: bool,
    pub image: Option<String>,
}

impl ProductFormView {
    /// API endpoint the form submits to.
    #[must_use]
    pub fn action(&self) -> String {
        match self.id {
            Some(id) => format!("/api/products/{id}"),
            None => "/api/products".to_string(),
        }
    }

    /// HTTP method the script uses.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        if self.id.is_some() { "PUT" } else { "POST" }
    }
}

impl From<&Product> for ProductFormView {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id.as_i32()),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.amount().normalize().to_string(),
            category: product.category.clone(),
            featured: product.featured,
            image: product.image.clone().filter(|i| !i.is_empty()),
        }
    }
}

/// One `<option>` in the category select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: String,
    pub selected: bool,
}

/// The fixed category list, plus the current value when it is not in it.
fn category_options(current: &str) -> Vec<CategoryOption> {
    let mut options: Vec<CategoryOption> = CATEGORY_OPTIONS
        .iter()
        .map(|c| CategoryOption {
            value: (*c).to_string(),
            selected: *c == current,
        })
        .collect();

    if !current.is_empty() && !CATEGORY_OPTIONS.contains(&current) {
        options.push(CategoryOption {
            value: current.to_string(),
            selected: true,
        });
    }

    options
}

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `?edit={id}` on the products page.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub edit: Option<String>,
}

/// Show the login form.
pub async fn login_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }

    LoginTemplate {
        error: None,
        username: String::new(),
    }
    .into_response()
}

/// Check the credentials and start an admin session.
///
/// # Errors
///
/// Returns 500 if the session cannot be written.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> PageResult<Response> {
    match AdminAuth::new(&state.config().admin).login(&form.username, &form.password) {
        Ok(admin) => {
            set_current_admin(&session, &admin).await?;
            set_sentry_user(&admin.username);
            tracing::info!("Admin logged in");
            Ok(Redirect::to("/admin/dashboard").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin login failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    error: Some("Username atau password salah.".to_string()),
                    username: form.username,
                },
            )
                .into_response())
        }
    }
}

/// End the admin session.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> PageResult<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/admin"))
}

/// Dashboard with catalog counts.
///
/// # Errors
///
/// Returns 500 if the counts cannot be loaded.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> PageResult<impl IntoResponse> {
    let stats = state.catalog().stats().await?;
    let products = state.catalog().list().await?;

    Ok(DashboardTemplate {
        admin: admin.username,
        stats,
        recent: products
            .iter()
            .take(RECENT_LIMIT)
            .map(ProductView::from)
            .collect(),
        backend: state.catalog().storage().backend_name(),
    })
}

/// Product table with the create/edit form.
///
/// # Errors
///
/// Returns 500 if the products cannot be loaded.
#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> PageResult<impl IntoResponse> {
    let products = state.catalog().list().await?;

    let mut notice = None;
    let form = match query.edit.as_deref().map(str::parse::<ProductId>) {
        None => ProductFormView::default(),
        Some(Ok(id)) => match state.catalog().get(id).await {
            Ok(product) => ProductFormView::from(&product),
            Err(CatalogError::NotFound) => {
                notice = Some(format!("Produk #{id} tidak ditemukan."));
                ProductFormView::default()
            }
            Err(e) => return Err(e.into()),
        },
        Some(Err(_)) => {
            notice = Some("ID produk tidak valid.".to_string());
            ProductFormView::default()
        }
    };

    Ok(AdminProductsTemplate {
        admin: admin.username,
        products: products.iter().map(ProductView::from).collect(),
        categories: category_options(&form.category),
        form,
        notice,
    })
}

/// Create the admin router, mounted at `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/login", post(login).route_layer(auth_rate_limiter()))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/products", get(products))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_options_marks_selection() {
        let options = category_options("Kursi");
        assert_eq!(options.len(), CATEGORY_OPTIONS.len());
        assert!(options.iter().any(|o| o.value == "Kursi" && o.selected));
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
    }

    #[test]
    fn test_category_options_keeps_unlisted_value() {
        let options = category_options("Outdoor");
        let last = options.last().map(|o| (o.value.as_str(), o.selected));
        assert_eq!(last, Some(("Outdoor", true)));
    }

    #[test]
    fn test_form_view_action_and_method() {
        let create = ProductFormView::default();
        assert_eq!(create.action(), "/api/products");
        assert_eq!(create.method(), "POST");

        let edit = ProductFormView {
            id: Some(4),
            ..ProductFormView::default()
        };
        assert_eq!(edit.action(), "/api/products/4");
        assert_eq!(edit.method(), "PUT");
    }
}

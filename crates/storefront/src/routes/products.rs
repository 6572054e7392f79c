//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use atiga_core::image::{ImageTransform, optimize_url, placeholder_url, responsive_srcset};
use atiga_core::text::{needs_truncation, truncate_text, truncate_words};
use atiga_core::{Product, ProductId};

use crate::error::PageResult;
use crate::filters;
use crate::services::catalog::CatalogError;
use crate::state::AppState;

/// Characters of description shown on a product card.
const EXCERPT_CHARS: usize = 120;

/// Words of description used for the meta description.
const META_WORDS: usize = 30;

/// Order line for the WhatsApp button.
const WHATSAPP_URL: &str = "https://wa.me/6285291413603";

/// Width requested for the main product image.
const DISPLAY_WIDTH: u32 = 800;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub excerpt: String,
    pub meta_description: String,
    pub price: String,
    pub category: String,
    pub featured: bool,
    pub image: Option<ImageView>,
    pub whatsapp_url: String,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub src: String,
    /// Empty when the URL has no transform support.
    pub srcset: String,
    pub placeholder: String,
    pub alt: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let description = product.description.clone().unwrap_or_default();
        let image = product
            .image
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| ImageView {
                src: optimize_url(url, &ImageTransform::width(DISPLAY_WIDTH)),
                srcset: responsive_srcset(url),
                placeholder: placeholder_url(url),
                alt: product.name.clone(),
            });

        let excerpt = if needs_truncation(&description, EXCERPT_CHARS) {
            truncate_text(&description, EXCERPT_CHARS, "...")
        } else {
            description.clone()
        };
        let price = product.price.display_idr();

        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            excerpt,
            meta_description: truncate_words(&description, META_WORDS, "..."),
            whatsapp_url: whatsapp_order_url(&product.name, &price),
            description,
            price,
            category: product.category.clone(),
            featured: product.featured,
            image,
        }
    }
}

/// WhatsApp chat link with an order enquiry for one product.
fn whatsapp_order_url(name: &str, price: &str) -> String {
    let text = format!("Halo, saya tertarik dengan {name} - {price}. Bisa minta info lebih detail?");
    // wa.me shows `+` literally; a literal plus is already `%2B` here.
    let encoded = url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("{WHATSAPP_URL}?text={encoded}")
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub featured: Vec<ProductView>,
    pub others: Vec<ProductView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
}

/// 404 page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

/// Render the 404 page with a 404 status.
pub fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            message: message.to_string(),
        },
    )
        .into_response()
}

/// Display the catalog: featured products first, then everything else.
///
/// # Errors
///
/// Returns an error if the products cannot be loaded.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> PageResult<impl IntoResponse> {
    let products = state.catalog().list().await?;

    let (featured, others): (Vec<_>, Vec<_>) = products.iter().partition(|p| p.featured);

    Ok(ProductsIndexTemplate {
        featured: featured.into_iter().map(ProductView::from).collect(),
        others: others.into_iter().map(ProductView::from).collect(),
    })
}

/// Display a product detail page.
///
/// # Errors
///
/// Returns an error if the product cannot be loaded.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> PageResult<Response> {
    match state.catalog().get(id).await {
        Ok(product) => Ok(ProductShowTemplate {
            product: ProductView::from(&product),
        }
        .into_response()),
        Err(CatalogError::NotFound) => Ok(not_found("Produk tidak ditemukan.")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use atiga_core::Price;

    use super::*;

    fn product(image: Option<&str>, description: Option<&str>) -> Product {
        Product {
            id: ProductId::new(3),
            name: "Mahogany Coffee Table".to_string(),
            description: description.map(str::to_owned),
            price: Price::new(Decimal::new(1_800_000, 0)),
            image: image.map(str::to_owned),
            category: "Living Room".to_string(),
            featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_formats_price_and_excerpt() {
        let long = "Meja kopi dari kayu mahoni pilihan. ".repeat(10);
        let view = ProductView::from(&product(None, Some(&long)));
        assert_eq!(view.price, "Rp 1.800.000");
        assert!(view.excerpt.ends_with("..."));
        assert!(view.excerpt.chars().count() <= EXCERPT_CHARS + 3);
        assert!(view.image.is_none());
    }

    #[test]
    fn test_view_local_image_untransformed() {
        let view = ProductView::from(&product(Some("/uploads/1-meja.jpg"), None));
        let image = view.image.unwrap();
        assert_eq!(image.src, "/uploads/1-meja.jpg");
        assert!(image.srcset.is_empty());
        assert_eq!(image.alt, "Mahogany Coffee Table");
    }

    #[test]
    fn test_view_cloudinary_image_transformed() {
        let url = "https://res.cloudinary.com/atiga/image/upload/v1/furniture-store/1-meja.jpg";
        let image = ProductView::from(&product(Some(url), None)).image.unwrap();
        assert!(image.src.contains("w_800"));
        assert!(image.srcset.contains("1600w"));
    }

    #[test]
    fn test_whatsapp_link_names_product_and_price() {
        let view = ProductView::from(&product(None, None));
        assert_eq!(
            view.whatsapp_url,
            "https://wa.me/6285291413603?text=Halo%2C%20saya%20tertarik%20dengan%20Mahogany%20Coffee%20Table%20-%20Rp%201.800.000.%20Bisa%20minta%20info%20lebih%20detail%3F"
        );
        assert_eq!(
            whatsapp_order_url("Kursi A+B & C", "Rp 1"),
            "https://wa.me/6285291413603?text=Halo%2C%20saya%20tertarik%20dengan%20Kursi%20A%2BB%20%26%20C%20-%20Rp%201.%20Bisa%20minta%20info%20lebih%20detail%3F"
        );
    }

    #[test]
    fn test_meta_description_is_word_limited() {
        let long = "kayu ".repeat(40);
        let view = ProductView::from(&product(None, Some(long.trim())));
        assert_eq!(view.meta_description.split_whitespace().count(), META_WORDS);
        assert!(view.meta_description.ends_with("..."));

        let short = ProductView::from(&product(None, Some("Meja kopi mahoni")));
        assert_eq!(short.meta_description, "Meja kopi mahoni");
        assert_eq!(short.excerpt, "Meja kopi mahoni");
    }

    #[test]
    fn test_empty_image_is_none() {
        assert!(ProductView::from(&product(Some(""), None)).image.is_none());
    }
}

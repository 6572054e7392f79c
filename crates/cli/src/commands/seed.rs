//! Seed the catalog with sample products.
//!
//! Sample products carry no image; upload one from the admin panel.

use atiga_core::{ProductDraft, ProductFieldError};
use atiga_storefront::db::{ProductRepository, RepositoryError};
use thiserror::Error;
use tracing::info;

use super::{CommandError, connect};

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid sample product: {0}")]
    InvalidSample(#[from] ProductFieldError),
}

/// One sample product: name, description, price, category, featured.
type Sample = (&'static str, &'static str, &'static str, &'static str, bool);

const SAMPLES: [Sample; 5] = [
    (
        "Luxury Teak Dining Table",
        "Handcrafted solid teak dining table with elegant design",
        "2500000",
        "Dining Room",
        true,
    ),
    (
        "Outdoor Rattan Sofa Set",
        "Weather-resistant rattan sofa set perfect for outdoor spaces",
        "3200000",
        "Outdoor",
        true,
    ),
    (
        "Mahogany Coffee Table",
        "Elegant mahogany coffee table with intricate carvings",
        "1800000",
        "Living Room",
        false,
    ),
    (
        "Bamboo Bookshelf",
        "Eco-friendly bamboo bookshelf with modern design",
        "1200000",
        "Study Room",
        false,
    ),
    (
        "Teak Garden Bench",
        "Durable teak garden bench for outdoor relaxation",
        "950000",
        "Outdoor",
        true,
    ),
];

/// Validated drafts for every sample product.
fn sample_drafts() -> Result<Vec<ProductDraft>, ProductFieldError> {
    SAMPLES
        .iter()
        .map(|(name, description, price, category, featured)| {
            ProductDraft::from_form(
                name,
                description,
                price,
                category,
                if *featured { "true" } else { "false" },
            )
        })
        .collect()
}

/// Insert the sample catalog.
///
/// # Arguments
///
/// * `clear_existing` - If true, delete every product first
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run(clear_existing: bool) -> Result<(), SeedError> {
    let drafts = sample_drafts()?;
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    if clear_existing {
        let removed = repo.delete_all().await?;
        info!(removed, "Cleared existing products");
    }

    for draft in &drafts {
        let product = repo.create(draft, None).await?;
        info!(id = %product.id, name = %product.name, "Inserted product");
    }

    info!("Database seeded successfully! {} products inserted", drafts.len());
    Ok(())
}

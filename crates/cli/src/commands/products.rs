//! Product catalog inspection.

use atiga_storefront::db::{ProductRepository, RepositoryError};
use thiserror::Error;
use tracing::info;

use super::{CommandError, connect};

/// Errors from product commands.
#[derive(Debug, Error)]
pub enum ProductsError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Log the newest `limit` products with a total count.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the query fails.
pub async fn list(limit: i64) -> Result<(), ProductsError> {
    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let total = repo.count().await?;
    let products = repo.list_recent(limit.max(0)).await?;

    info!("Products ({} of {total})", products.len());
    info!("========================");
    for product in products {
        let marker = if product.featured { "*" } else { " " };
        let image = if product.image.as_deref().is_some_and(|i| !i.is_empty()) {
            "image"
        } else {
            "no image"
        };
        info!(
            "{marker} #{:<5} {:<32} {:<14} {:>16}  {image}",
            product.id.as_i32(),
            product.name,
            product.category,
            product.price.display_idr(),
        );
    }

    Ok(())
}

//! Product repository.
//!
//! Queries are runtime-checked (`query_as` + `FromRow`) so the crate builds
//! without a live database or an offline query cache.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use atiga_core::{Price, Product, ProductDraft, ProductId};

use super::RepositoryError;

/// What an update does to the product image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image as is.
    Keep,
    /// Point at a newly uploaded image.
    Replace(String),
    /// Clear the image.
    Remove,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Decimal,
    image: Option<String>,
    category: String,
    featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UpdatedRow {
    #[sqlx(flatten)]
    product: ProductRow,
    previous_image: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() && !row.price.is_zero() {
            return Err(RepositoryError::DataCorruption(format!(
                "product {} has negative price {}",
                row.id, row.price
            )));
        }

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Price::new(row.price),
            image: row.image,
            category: row.category,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image, category, featured,
                   created_at, updated_at
            FROM storefront.product
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// The `limit` most recently created products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image, category, featured,
                   created_at, updated_at
            FROM storefront.product
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image, category, featured,
                   created_at, updated_at
            FROM storefront.product
            WHERE featured
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, image, category, featured,
                   created_at, updated_at
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        draft: &ProductDraft,
        image: Option<&str>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (name, description, price, image, category, featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, image, category, featured,
                      created_at, updated_at
            ",
        )
        .bind(&draft.name)
        .bind(draft.description.as_deref())
        .bind(draft.price.amount())
        .bind(image)
        .bind(&draft.category)
        .bind(draft.featured)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace a product's fields.
    ///
    /// Returns the updated product together with the image URL it had before
    /// the update, or `None` if no product has this ID. The previous image is
    /// read in the same statement, so a concurrent update cannot slip between
    /// the read and the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
        image: &ImageChange,
    ) -> Result<Option<(Product, Option<String>)>, RepositoryError> {
        let (set_image, new_image) = match image {
            ImageChange::Keep => (false, None),
            ImageChange::Replace(url) => (true, Some(url.as_str())),
            ImageChange::Remove => (true, None),
        };

        let row = sqlx::query_as::<_, UpdatedRow>(
            r"
            WITH previous AS (
                SELECT id, image FROM storefront.product WHERE id = $1 FOR UPDATE
            )
            UPDATE storefront.product AS p
            SET name = $2,
                description = $3,
                price = $4,
                category = $5,
                featured = $6,
                image = CASE WHEN $7 THEN $8 ELSE p.image END,
                updated_at = now()
            FROM previous
            WHERE p.id = previous.id
            RETURNING p.id, p.name, p.description, p.price, p.image, p.category,
                      p.featured, p.created_at, p.updated_at,
                      previous.image AS previous_image
            ",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.description.as_deref())
        .bind(draft.price.amount())
        .bind(&draft.category)
        .bind(draft.featured)
        .bind(set_image)
        .bind(new_image)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(updated) => Ok(Some((updated.product.try_into()?, updated.previous_image))),
            None => Ok(None),
        }
    }

    /// Delete a product, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            DELETE FROM storefront.product
            WHERE id = $1
            RETURNING id, name, description, price, image, category, featured,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Delete every product. Used by `atiga seed --clear`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of distinct categories in use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_categories(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT category) FROM storefront.product",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Number of products that have an image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_with_image(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.product WHERE image IS NOT NULL AND image <> ''",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

//! Product catalog service.
//!
//! Each mutation runs one database statement and at most one storage call
//! per image, in order. When the row write succeeds but cleanup of an old
//! image fails, the failure is logged and the request still succeeds. When an
//! upload succeeds but the row write fails, the fresh upload is removed.
//!
//! The public product lists are cached for 60 seconds; every mutation clears
//! the cache. A list read that overlaps a mutation is returned but not
//! cached.

mod error;
pub mod form;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::instrument;

use atiga_core::{Product, ProductId};

pub use error::CatalogError;
pub use form::{FormError, ProductForm, UploadedFile};

use crate::db::{ImageChange, ProductRepository};
use crate::storage::{ImageStore, Storage};

/// Number of featured products shown on the home page.
pub const FEATURED_LIMIT: i64 = 8;

/// How long product lists stay cached.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Cache key for product lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    AllProducts,
    Featured,
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogStats {
    pub products: i64,
    pub categories: i64,
    pub with_image: i64,
}

/// Product catalog operations backed by `PostgreSQL` and the configured
/// image store.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    storage: Storage,
    cache: Cache<CacheKey, Arc<Vec<Product>>>,
    /// Bumped on every invalidation.
    generation: AtomicU64,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(pool: PgPool, storage: Storage) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                storage,
                cache,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// The configured image store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.inner.cache.get(&CacheKey::AllProducts).await {
            tracing::debug!("Cache hit for product list");
            return Ok(products);
        }

        let generation = self.generation();
        let products = Arc::new(self.products().list().await?);
        self.cache_if_current(CacheKey::AllProducts, generation, &products)
            .await;
        Ok(products)
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn featured(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.inner.cache.get(&CacheKey::Featured).await {
            tracing::debug!("Cache hit for featured products");
            return Ok(products);
        }

        let generation = self.generation();
        let products = Arc::new(self.products().list_featured(FEATURED_LIMIT).await?);
        self.cache_if_current(CacheKey::Featured, generation, &products)
            .await;
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products().get(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Dashboard counts. Always read fresh.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if a query fails.
    pub async fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let products = self.products();
        Ok(CatalogStats {
            products: products.count().await?,
            categories: products.count_categories().await?,
            with_image: products.count_with_image().await?,
        })
    }

    /// Validate and store a standalone image, returning its public URL.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Upload` if the file is rejected and
    /// `CatalogError::Storage` if the backend fails.
    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.bytes.len()))]
    pub async fn upload(&self, file: UploadedFile) -> Result<String, CatalogError> {
        file.validate()?;
        let url = self
            .inner
            .storage
            .upload(file.bytes, &file.filename, &file.content_type)
            .await?;
        Ok(url)
    }

    /// Create a product, uploading its image first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Field` or `CatalogError::Upload` for invalid
    /// input, and `CatalogError::Storage` or `CatalogError::Repository` if a
    /// backend fails. Nothing is persisted on error.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: ProductForm) -> Result<Product, CatalogError> {
        let draft = form.draft()?;
        if let Some(file) = &form.image {
            file.validate()?;
        }

        let image = match form.image {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        match self.products().create(&draft, image.as_deref()).await {
            Ok(product) => {
                self.invalidate().await;
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                if let Some(url) = &image {
                    self.discard_image(url).await;
                }
                Err(e.into())
            }
        }
    }

    /// Replace a product's fields.
    ///
    /// A new file replaces the image and the old object is deleted. Without a
    /// file the image is kept, unless `remove_image` is set.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID, plus the
    /// errors of [`CatalogService::create`].
    #[instrument(skip(self, form), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, form: ProductForm) -> Result<Product, CatalogError> {
        let draft = form.draft()?;
        if let Some(file) = &form.image {
            file.validate()?;
        }

        // Fail before uploading if the product is gone.
        if self.products().get(id).await?.is_none() {
            return Err(CatalogError::NotFound);
        }

        let change = match form.image {
            Some(file) => ImageChange::Replace(self.upload(file).await?),
            None if form.remove_image => ImageChange::Remove,
            None => ImageChange::Keep,
        };

        let updated = match self.products().update(id, &draft, &change).await {
            Ok(updated) => updated,
            Err(e) => {
                if let ImageChange::Replace(url) = &change {
                    self.discard_image(url).await;
                }
                return Err(e.into());
            }
        };

        let Some((product, previous_image)) = updated else {
            // Deleted between the existence check and the update.
            if let ImageChange::Replace(url) = &change {
                self.discard_image(url).await;
            }
            return Err(CatalogError::NotFound);
        };

        self.invalidate().await;

        if let Some(previous) = previous_image.filter(|p| !p.is_empty())
            && product.image.as_deref() != Some(previous.as_str())
        {
            self.discard_image(&previous).await;
        }

        tracing::info!("Product updated");
        Ok(product)
    }

    /// Delete a product and then its stored image.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<Product, CatalogError> {
        let product = self
            .products()
            .delete(id)
            .await?
            .ok_or(CatalogError::NotFound)?;

        self.invalidate().await;

        if let Some(image) = product.image.as_deref().filter(|i| !i.is_empty()) {
            self.discard_image(image).await;
        }

        tracing::info!("Product deleted");
        Ok(product)
    }

    /// Best-effort image deletion. Failures are logged, never returned.
    async fn discard_image(&self, url: &str) {
        if let Err(e) = self.inner.storage.delete(url).await {
            tracing::warn!(
                error = %e,
                url = %url,
                backend = self.inner.storage.backend_name(),
                "Failed to delete stored image"
            );
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Cache a list read at `generation` unless an invalidation has happened
    /// since. An invalidation racing the insert evicts the entry again.
    async fn cache_if_current(&self, key: CacheKey, generation: u64, products: &Arc<Vec<Product>>) {
        if self.generation() != generation {
            tracing::debug!(?key, "Catalog changed during read, not caching");
            return;
        }

        self.inner.cache.insert(key, Arc::clone(products)).await;

        if self.generation() != generation {
            self.inner.cache.invalidate(&key).await;
        }
    }

    /// Drop every cached product list.
    pub async fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

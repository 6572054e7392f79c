//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::ContentStore;
use crate::services::CatalogService;
use crate::storage::{Storage, StorageError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    content: ContentStore,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `content` - Markdown pages loaded at startup
    ///
    /// # Errors
    ///
    /// Returns an error if the configured storage backend cannot be built.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        content: ContentStore,
    ) -> Result<Self, StorageError> {
        let storage = Storage::from_config(&config.storage)?;
        let catalog = CatalogService::new(pool.clone(), storage);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                content,
                catalog,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the loaded content pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }
}

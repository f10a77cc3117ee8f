//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{PaymentProcessor, ProcessorError, StripeClient};

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
    processor: Arc<dyn PaymentProcessor>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the card processor client cannot be built from
    /// the configured credentials.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, ProcessorError> {
        let processor = StripeClient::new(&config.processor)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                processor: Arc::new(processor),
            }),
        })
    }

    /// Build state with an explicit processor implementation (for tests).
    #[must_use]
    pub fn with_processor(
        config: StorefrontConfig,
        pool: PgPool,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                processor,
            }),
        }
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

    /// Get a reference to the card processor client.
    #[must_use]
    pub fn processor(&self) -> &dyn PaymentProcessor {
        self.inner.processor.as_ref()
    }
}

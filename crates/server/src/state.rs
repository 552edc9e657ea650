//! Application state shared across all request handlers.

use std::sync::Arc;

use moka::future::Cache;
use sqlx::PgPool;

use pixelfair_core::UserId;

use crate::config::ServerConfig;
use crate::db::orders::OrderSummary;
use crate::paypal::PayPalClient;
use crate::services::{EmailService, StorageService};

/// Shared application state.
///
/// Cheap to clone; all fields live behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    paypal: PayPalClient,
    email: EmailService,
    storage: StorageService,
    /// Buyer dashboard cache, invalidated when a user's orders change.
    order_cache: Cache<UserId, Arc<Vec<OrderSummary>>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        pool: PgPool,
        paypal: PayPalClient,
        email: EmailService,
        storage: StorageService,
    ) -> Self {
        let order_cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(std::time::Duration::from_secs(300))
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                paypal,
                email,
                storage,
                order_cache,
            }),
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the PayPal client.
    #[must_use]
    pub fn paypal(&self) -> &PayPalClient {
        &self.inner.paypal
    }

    /// Get the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get the storage service.
    #[must_use]
    pub fn storage(&self) -> &StorageService {
        &self.inner.storage
    }

    /// Get the buyer dashboard cache.
    #[must_use]
    pub fn order_cache(&self) -> &Cache<UserId, Arc<Vec<OrderSummary>>> {
        &self.inner.order_cache
    }
}

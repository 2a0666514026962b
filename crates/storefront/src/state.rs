//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, CartApi, CatalogApi, StoreClient};
use crate::config::StorefrontConfig;
use crate::services::{CartService, CurrencyService, HttpRateSource, RateSource};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Per-shopper state lives in the session, not
/// here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn CatalogApi>,
    carts: Arc<dyn CartApi>,
    currency: CurrencyService,
}

impl AppState {
    /// Build state backed by the real API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let client = StoreClient::new(&config.api)?;
        let rates = HttpRateSource::new(client.clone(), config.exchange_rate_url.clone());
        Ok(Self::with_backends(
            config,
            Arc::new(client.clone()),
            Arc::new(client),
            Arc::new(rates),
        ))
    }

    /// Build state over arbitrary API implementations.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        catalog: Arc<dyn CatalogApi>,
        carts: Arc<dyn CartApi>,
        rates: Arc<dyn RateSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                carts,
                currency: CurrencyService::new(rates),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Product and review endpoints of the external API.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogApi {
        self.inner.catalog.as_ref()
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.inner.catalog.as_ref(), self.inner.carts.as_ref())
    }

    #[must_use]
    pub fn currency(&self) -> &CurrencyService {
        &self.inner.currency
    }
}

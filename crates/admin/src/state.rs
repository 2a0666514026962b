//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, CatalogApi, SegishopClient, ShippingApi};
use crate::config::AdminConfig;
use crate::services::ImageStaging;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Handlers reach the external API through the
/// trait accessors so tests can swap in a fake backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    shipping: Arc<dyn ShippingApi>,
    catalog: Arc<dyn CatalogApi>,
    staging: ImageStaging,
}

impl AppState {
    /// Build state backed by the real API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API client cannot be built from the config.
    pub fn new(config: AdminConfig) -> Result<Self, ApiError> {
        let client = SegishopClient::new(&config.api)?;
        Ok(Self::with_backends(
            config,
            Arc::new(client.clone()),
            Arc::new(client),
        ))
    }

    /// Build state over arbitrary API implementations.
    #[must_use]
    pub fn with_backends(
        config: AdminConfig,
        shipping: Arc<dyn ShippingApi>,
        catalog: Arc<dyn CatalogApi>,
    ) -> Self {
        let staging = ImageStaging::new(config.upload);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shipping,
                catalog,
                staging,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Shipping endpoints of the external API.
    #[must_use]
    pub fn shipping(&self) -> &dyn ShippingApi {
        self.inner.shipping.as_ref()
    }

    /// Catalog endpoints of the external API.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogApi {
        self.inner.catalog.as_ref()
    }

    #[must_use]
    pub fn staging(&self) -> &ImageStaging {
        &self.inner.staging
    }
}

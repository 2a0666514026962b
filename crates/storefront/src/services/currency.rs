//! Display currency and exchange rates.
//!
//! Catalog prices are in USD. The rate table is fetched from the configured
//! exchange-rate URL and cached for 24 hours; when the fetch fails the
//! built-in table is served instead and the next request tries again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use segishop_core::types::{CurrencyCode, ExchangeRates, Price};

use crate::api::{ApiError, StoreClient};

const RATES_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where rate tables come from.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<ExchangeRates, ApiError>;
}

/// `{"base": "USD", "rates": {"EUR": 0.91, ...}}`
#[derive(Debug, Deserialize)]
struct RatesPayload {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Rate table served over HTTP.
pub struct HttpRateSource {
    client: StoreClient,
    url: Url,
}

impl HttpRateSource {
    #[must_use]
    pub const fn new(client: StoreClient, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> Result<ExchangeRates, ApiError> {
        let payload: RatesPayload = self.client.get_absolute(self.url.clone()).await?;
        if payload.rates.is_empty() {
            return Err(ApiError::Parse("rate table is empty".to_string()));
        }
        Ok(ExchangeRates::from_raw(&payload.rates))
    }
}

/// Cached exchange rates shared by all requests.
#[derive(Clone)]
pub struct CurrencyService {
    source: Arc<dyn RateSource>,
    cache: Cache<(), ExchangeRates>,
}

impl CurrencyService {
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(RATES_TTL)
            .build();
        Self { source, cache }
    }

    /// Current rate table. Never fails: a failed fetch yields the defaults,
    /// which are not cached.
    pub async fn rates(&self) -> ExchangeRates {
        if let Some(rates) = self.cache.get(&()).await {
            debug!("Cache hit for exchange rates");
            return rates;
        }

        match self.source.fetch_rates().await {
            Ok(rates) => {
                self.cache.insert((), rates.clone()).await;
                rates
            }
            Err(e) => {
                warn!(error = %e, "Exchange rate fetch failed, using built-in rates");
                ExchangeRates::defaults()
            }
        }
    }

    /// Build the per-request context for `selected`.
    pub async fn context(&self, selected: CurrencyCode) -> CurrencyContext {
        CurrencyContext {
            selected,
            rates: self.rates().await,
        }
    }
}

/// The shopper's display currency together with the rates to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyContext {
    pub selected: CurrencyCode,
    rates: ExchangeRates,
}

impl CurrencyContext {
    #[must_use]
    pub const fn new(selected: CurrencyCode, rates: ExchangeRates) -> Self {
        Self { selected, rates }
    }

    /// Convert a base-currency amount into the selected currency.
    #[must_use]
    pub fn price(&self, amount: Decimal) -> Price {
        Price::base(amount).convert(self.selected, &self.rates)
    }

    /// Convert and format a base-currency amount.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        self.price(amount).to_string()
    }

    /// Options for the currency selector.
    #[must_use]
    pub fn choices(&self) -> &'static [CurrencyCode] {
        &CurrencyCode::ALL
    }

    #[must_use]
    pub fn is_selected(&self, code: &CurrencyCode) -> bool {
        self.selected == *code
    }
}

impl Default for CurrencyContext {
    fn default() -> Self {
        Self::new(CurrencyCode::BASE, ExchangeRates::defaults())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn fetch_rates(&self) -> Result<ExchangeRates, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Parse("offline".to_string()));
            }
            let raw = HashMap::from([("EUR".to_string(), 0.5)]);
            Ok(ExchangeRates::from_raw(&raw))
        }
    }

    fn service(fail: bool) -> (CurrencyService, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail,
        });
        (CurrencyService::new(source.clone()), source)
    }

    // =========================================================================
    // Rate cache
    // =========================================================================

    #[tokio::test]
    async fn test_rates_are_cached() {
        let (service, source) = service(false);
        let first = service.rates().await;
        let second = service.rates().await;
        assert_eq!(first, second);
        assert_eq!(first.rate(CurrencyCode::EUR), Some(Decimal::new(5, 1)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_and_retries() {
        let (service, source) = service(true);
        let rates = service.rates().await;
        assert_eq!(rates, ExchangeRates::defaults());
        let _ = service.rates().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    // =========================================================================
    // Context
    // =========================================================================

    #[tokio::test]
    async fn test_context_converts_and_formats() {
        let (service, _) = service(false);
        let context = service.context(CurrencyCode::EUR).await;
        assert_eq!(context.price(Decimal::new(10, 0)).amount, Decimal::new(5, 0));
        assert_eq!(context.format(Decimal::new(2000, 0)), "1,000.00€");
    }

    #[test]
    fn test_default_context_is_usd() {
        let context = CurrencyContext::default();
        assert!(context.is_selected(&CurrencyCode::USD));
        assert_eq!(context.format(Decimal::new(123_456, 2)), "$1,234.56");
    }

    #[test]
    fn test_payload_parses_rate_api_shape() {
        let payload: RatesPayload = serde_json::from_str(
            r#"{"base": "USD", "date": "2026-10-01", "rates": {"USD": 1, "EUR": 0.91, "XYZ": 3.2}}"#,
        )
        .unwrap();
        let rates = ExchangeRates::from_raw(&payload.rates);
        assert_eq!(rates.rate(CurrencyCode::USD), Some(Decimal::ONE));
        assert!(rates.rate(CurrencyCode::EUR).is_some());
    }
}

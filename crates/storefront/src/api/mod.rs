//! Segishop REST API client for the public storefront endpoints.
//!
//! Products, reviews and customer carts all come from the external API.
//! Most responses are wrapped in a `success`/`message` envelope; reviews come
//! back bare. [`StoreClient`] accepts both.

mod cart;
mod catalog;
mod types;

pub use cart::CartApi;
pub use catalog::CatalogApi;
pub use types::*;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the Segishop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API wants a signed-in customer.
    #[error("Unauthorized")]
    Unauthorized,

    /// The API refused the request for a business reason.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Message suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) | Self::NotFound(message) => message.clone(),
            Self::Unauthorized => "Please sign in again to continue.".to_string(),
            Self::Http(_) | Self::Parse(_) => {
                "We could not reach the shop right now. Please try again.".to_string()
            }
        }
    }
}

/// Segishop API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl StoreClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Build an endpoint URL from a relative path and query pairs.
    ///
    /// Pairs with an empty value are left out.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Parse(format!("Invalid endpoint {path}: {e}")))?;

        let pairs: Vec<_> = query.iter().filter(|(_, v)| !v.is_empty()).collect();
        if !pairs.is_empty() {
            let mut serializer = url.query_pairs_mut();
            for (key, value) in pairs {
                serializer.append_pair(key, value);
            }
        }

        Ok(url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &[])?;
        let response = self
            .inner
            .client
            .request(method, url)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path, &[])?;
        let response = self.inner.client.delete(url).send().await?;
        Self::handle_response(response).await
    }

    /// Fetch an arbitrary JSON document, e.g. the exchange-rate table.
    pub(crate) async fn get_absolute<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }
}

/// Turn a status code and raw body into a payload or an [`ApiError`].
pub(crate) fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    let value: serde_json::Value = if body.trim().is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(ApiError::Parse(format!("Failed to parse response: {e}")));
            }
            Err(_) => serde_json::Value::Null,
        }
    };

    let message = value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(
            message.unwrap_or_else(|| "Resource not found".to_string()),
        ));
    }

    if !status.is_success() {
        return Err(ApiError::Rejected(
            message.unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
        ));
    }

    if value.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
        return Err(ApiError::Rejected(
            message.unwrap_or_else(|| "Request failed".to_string()),
        ));
    }

    let value = if value.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        value
    };

    serde_json::from_value(value).map_err(|e| ApiError::Parse(format!("Unexpected response shape: {e}")))
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

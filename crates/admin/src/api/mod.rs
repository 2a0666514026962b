//! Segishop REST API client.
//!
//! Every screen in the admin console is a thin view over this client. The API
//! wraps most payloads in an envelope carrying `success` and an optional
//! `message`; [`SegishopClient`] unwraps it and turns failures into
//! [`ApiError`] so handlers only ever see typed data or a typed error.
//!
//! # API Reference
//!
//! - Base URL: `SEGISHOP_API_URL` (e.g. `https://api.segishop.com/api/`)
//! - Authentication: `Authorization: Bearer <SEGISHOP_ADMIN_TOKEN>`
//! - Shipping endpoints live under `admin/shipping/`, catalog endpoints under
//!   `admin/products`, `admin/categories` and `admin/image/upload`

mod catalog;
mod shipping;
mod types;

pub use catalog::CatalogApi;
pub use shipping::ShippingApi;
pub use types::*;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
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

    /// Token missing or rejected.
    #[error("Unauthorized: the API rejected the admin token")]
    Unauthorized,

    /// The API refused the request for a business reason.
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Message suitable for showing to an operator.
    ///
    /// Business rejections carry the server's own wording; transport and
    /// parse failures get a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) | Self::NotFound(message) => message.clone(),
            Self::Unauthorized => "The admin token was rejected by the API.".to_string(),
            Self::Http(_) | Self::Parse(_) => {
                "Could not reach the Segishop API. Please try again.".to_string()
            }
        }
    }
}

/// Segishop API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SegishopClient {
    inner: Arc<SegishopClientInner>,
}

struct SegishopClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl SegishopClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.admin_token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::Parse(format!("Invalid admin token format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SegishopClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// API root every path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
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

    /// Execute a GET request.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a request with a JSON body.
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

    /// Execute a DELETE request without a body.
    pub(crate) async fn delete(&self, path: &str) -> Result<Ack, ApiError> {
        let url = self.endpoint(path, &[])?;
        let response = self.inner.client.delete(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a multipart POST.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, &[])?;
        let response = self.inner.client.post(url).multipart(form).send().await?;
        Self::handle_response(response).await
    }

    /// Check status, unwrap the envelope and parse the payload.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        decode_body(status, &body)
    }
}

/// Turn a status code and raw body into a payload or an [`ApiError`].
///
/// A `204 No Content` or empty body decodes as JSON `null`, so `Ack` and
/// other all-default payloads still parse.
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

impl std::fmt::Debug for SegishopClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegishopClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Product listing
//! GET  /health                    - Health check
//!
//! # Products
//! GET  /products                  - Product listing (search, category, page)
//! GET  /products/{id}             - Product detail with reviews
//! POST /products/{id}/reviews     - Submit a review for moderation
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart
//! POST /cart/update               - Set a line's quantity (below 1 removes)
//! POST /cart/remove               - Remove a line
//!
//! # Currency
//! POST /currency                  - Choose the display currency
//! ```

pub mod cart;
pub mod currency;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{ShopperSession, cart_rate_limiter, review_rate_limiter};
use crate::services::CurrencyContext;
use crate::state::AppState;

/// What the shared page header needs: currency selector and cart badge.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub currency: CurrencyContext,
    pub cart_count: u32,
    /// Path (and query) of the page being rendered, for "return to" forms.
    pub current_path: String,
}

impl Chrome {
    /// Build the header context for the current shopper.
    pub async fn load(state: &AppState, shopper: &ShopperSession, current_path: String) -> Self {
        let currency = state.currency().context(shopper.currency().await).await;
        let cart_count = state
            .cart()
            .count(shopper, shopper.cart_mode().await)
            .await;
        Self {
            currency,
            cart_count,
            current_path,
        }
    }

    /// Convert and format a base-currency amount.
    #[must_use]
    pub fn money(&self, amount: rust_decimal::Decimal) -> String {
        self.currency.format(amount)
    }
}

/// Only same-site paths are accepted as redirect targets.
#[must_use]
pub fn safe_return_to(candidate: Option<&str>, fallback: &str) -> String {
    match candidate.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            post(products::submit_review).route_layer(review_rate_limiter()),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route_layer(cart_rate_limiter());

    Router::new().route("/", get(cart::show)).merge(mutations)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route(
            "/currency",
            post(currency::select).route_layer(cart_rate_limiter()),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to(Some("/products/4?page=2"), "/"), "/products/4?page=2");
        assert_eq!(safe_return_to(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_return_to(Some("//evil.example"), "/cart"), "/cart");
        assert_eq!(safe_return_to(Some("/\\evil.example"), "/"), "/");
        assert_eq!(safe_return_to(None, "/products"), "/products");
    }
}

//! Shopper sessions.
//!
//! Sessions live in memory via tower-sessions. They carry the signed-in
//! customer id (written by the sign-in flow, which is outside this site), the
//! guest cart and the chosen display currency.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use segishop_core::cart::{CartMode, GuestCart};
use segishop_core::types::{CurrencyCode, UserId};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "segishop_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session keys.
pub mod keys {
    /// Id of the signed-in customer.
    pub const CUSTOMER_ID: &str = "customer_id";

    /// Guest cart lines.
    pub const GUEST_CART: &str = "guest_cart";

    /// Selected display currency.
    pub const CURRENCY: &str = "currency";
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Typed access to the shopper's session.
#[derive(Debug, Clone)]
pub struct ShopperSession {
    session: Session,
}

impl ShopperSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    pub async fn customer(&self) -> Option<UserId> {
        self.session
            .get::<UserId>(keys::CUSTOMER_ID)
            .await
            .ok()
            .flatten()
            .filter(UserId::is_set)
    }

    /// Which cart this shopper sees.
    pub async fn cart_mode(&self) -> CartMode {
        CartMode::from_customer(self.customer().await)
    }

    /// Record a signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns the store error if the session cannot be written.
    pub async fn set_customer(&self, customer: UserId) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CUSTOMER_ID, customer).await
    }

    /// Forget the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns the store error if the session cannot be written.
    pub async fn clear_customer(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<UserId>(keys::CUSTOMER_ID).await.map(|_| ())
    }

    /// The guest cart; empty when none was saved or it no longer parses.
    pub async fn guest_cart(&self) -> GuestCart {
        match self.session.get::<GuestCart>(keys::GUEST_CART).await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable guest cart");
                GuestCart::default()
            }
        }
    }

    /// Persist the guest cart. An empty cart removes the key.
    ///
    /// # Errors
    ///
    /// Returns the store error if the session cannot be written.
    pub async fn save_guest_cart(&self, cart: &GuestCart) -> Result<(), tower_sessions::session::Error> {
        if cart.is_empty() {
            self.session.remove::<GuestCart>(keys::GUEST_CART).await.map(|_| ())
        } else {
            self.session.insert(keys::GUEST_CART, cart).await
        }
    }

    /// Selected display currency, USD when unset.
    pub async fn currency(&self) -> CurrencyCode {
        self.session
            .get::<CurrencyCode>(keys::CURRENCY)
            .await
            .ok()
            .flatten()
            .unwrap_or(CurrencyCode::BASE)
    }

    /// # Errors
    ///
    /// Returns the store error if the session cannot be written.
    pub async fn set_currency(&self, code: CurrencyCode) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::CURRENCY, code).await
    }
}

impl<S> FromRequestParts<S> for ShopperSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use segishop_core::cart::{AddToCart, ProductSnapshot};
    use segishop_core::types::ProductId;

    use super::*;

    fn shopper() -> ShopperSession {
        ShopperSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[tokio::test]
    async fn test_fresh_session_is_guest_in_usd() {
        let shopper = shopper();
        assert!(shopper.cart_mode().await.is_guest());
        assert_eq!(shopper.currency().await, CurrencyCode::USD);
        assert!(shopper.guest_cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_customer_switches_cart_mode() {
        let shopper = shopper();
        shopper.set_customer(UserId::new(12)).await.unwrap();
        assert_eq!(shopper.cart_mode().await, CartMode::Customer(UserId::new(12)));

        shopper.clear_customer().await.unwrap();
        assert!(shopper.cart_mode().await.is_guest());
    }

    #[tokio::test]
    async fn test_guest_cart_round_trips_through_session() {
        let shopper = shopper();
        let mut cart = GuestCart::default();
        cart.add(
            ProductSnapshot {
                product_id: ProductId::new(3),
                name: "Tea pot".to_string(),
                image_url: None,
                price: Decimal::new(2500, 2),
            },
            &AddToCart {
                product_id: ProductId::new(3),
                quantity: 2,
                product_attributes: None,
                calculated_price: None,
            },
            Utc::now(),
        );
        shopper.save_guest_cart(&cart).await.unwrap();
        assert_eq!(shopper.guest_cart().await, cart);

        shopper.save_guest_cart(&GuestCart::default()).await.unwrap();
        assert!(shopper.guest_cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_currency_is_remembered() {
        let shopper = shopper();
        shopper.set_currency(CurrencyCode::JPY).await.unwrap();
        assert_eq!(shopper.currency().await, CurrencyCode::JPY);
    }
}

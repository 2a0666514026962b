//! Cart operations over the guest (session) and customer (API) carts.
//!
//! Handlers never branch on where a cart lives: they resolve a [`CartMode`]
//! once per request and hand it to [`CartService`]. Resolving the mode for a
//! signed-in shopper also moves any guest lines into the customer's cart.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use segishop_core::cart::{AddToCart, CartLine, CartMode, ProductSnapshot, QuantityChange, UpdateCartItem};
use segishop_core::types::UserId;

use crate::api::{CartApi, CatalogApi};
use crate::error::AppError;
use crate::middleware::ShopperSession;

/// A cart ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_items: u32,
    pub subtotal: Decimal,
    pub is_guest: bool,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart service borrowing the API backends for one request.
pub struct CartService<'a> {
    catalog: &'a dyn CatalogApi,
    carts: &'a dyn CartApi,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogApi, carts: &'a dyn CartApi) -> Self {
        Self { catalog, carts }
    }

    /// Which cart this request works on. A signed-in shopper's guest lines
    /// are merged first.
    ///
    /// # Errors
    ///
    /// Returns error if the merged cart cannot be saved to the session.
    pub async fn resolve(&self, shopper: &ShopperSession) -> Result<CartMode, AppError> {
        let mode = shopper.cart_mode().await;
        if let CartMode::Customer(user) = mode {
            self.merge_guest(shopper, user).await?;
        }
        Ok(mode)
    }

    /// Re-add every guest line to `user`'s cart, then clear the guest cart.
    /// Lines the API refuses are logged and dropped so they are not retried
    /// on every request. Returns how many moved.
    ///
    /// # Errors
    ///
    /// Returns error if the guest cart cannot be saved to the session.
    #[instrument(skip(self, shopper))]
    pub async fn merge_guest(&self, shopper: &ShopperSession, user: UserId) -> Result<usize, AppError> {
        let mut guest = shopper.guest_cart().await;
        if guest.is_empty() {
            return Ok(0);
        }

        let pending: Vec<_> = guest
            .items()
            .iter()
            .map(|item| item.id.clone())
            .zip(guest.merge_requests())
            .collect();

        let mut moved = 0;
        for (line_id, request) in pending {
            match self.carts.add_item(user, &request).await {
                Ok(_) => moved += 1,
                Err(e) => {
                    warn!(
                        line_id = %line_id,
                        product_id = %request.product_id,
                        quantity = request.quantity,
                        error = %e,
                        "Guest cart line dropped, customer cart refused it"
                    );
                }
            }
        }

        let dropped = guest.items().len() - moved;
        guest.clear();
        shopper.save_guest_cart(&guest).await?;
        info!(user_id = %user, moved, dropped, "Guest cart merged into customer cart");
        Ok(moved)
    }

    /// Load the cart for `mode`.
    ///
    /// # Errors
    ///
    /// Returns error if the customer cart cannot be fetched.
    pub async fn view(&self, shopper: &ShopperSession, mode: CartMode) -> Result<CartView, AppError> {
        let (lines, total_items, subtotal): (Vec<CartLine>, _, _) = match mode {
            CartMode::Guest => {
                let summary = shopper.guest_cart().await.summary();
                (
                    summary.items.iter().map(CartLine::from).collect(),
                    summary.total_items,
                    summary.subtotal,
                )
            }
            CartMode::Customer(user) => {
                let summary = self.carts.get_cart(user).await?;
                (
                    summary.items.iter().map(CartLine::from).collect(),
                    summary.total_items,
                    summary.subtotal,
                )
            }
        };

        for line in lines.iter().filter(|l| l.attributes.is_malformed()) {
            warn!(line_id = %line.id, "Cart line has malformed product attributes");
        }

        Ok(CartView {
            lines,
            total_items,
            subtotal,
            is_guest: mode.is_guest(),
        })
    }

    /// Number of items, for the header badge. Failures count as zero.
    pub async fn count(&self, shopper: &ShopperSession, mode: CartMode) -> u32 {
        match mode {
            CartMode::Guest => shopper.guest_cart().await.summary().total_items,
            CartMode::Customer(user) => match self.carts.get_cart(user).await {
                Ok(summary) => summary.total_items,
                Err(e) => {
                    warn!(error = %e, "Cart count unavailable");
                    0
                }
            },
        }
    }

    /// Add a product. Guest lines copy the product's current name, image
    /// and price.
    ///
    /// # Errors
    ///
    /// Returns error if the product is unknown, the API refuses the line or
    /// the session cannot be written.
    #[instrument(skip(self, shopper, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add(
        &self,
        shopper: &ShopperSession,
        mode: CartMode,
        request: &AddToCart,
    ) -> Result<(), AppError> {
        if request.quantity == 0 {
            return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
        }

        match mode {
            CartMode::Guest => {
                let product = self.catalog.get_product(request.product_id).await?;
                let snapshot = ProductSnapshot {
                    product_id: product.id,
                    price: product.current_price(),
                    image_url: product.image_url,
                    name: product.name,
                };
                let mut cart = shopper.guest_cart().await;
                let line_id = cart.add(snapshot, request, Utc::now());
                shopper.save_guest_cart(&cart).await?;
                info!(line_id = %line_id, "Added to guest cart");
            }
            CartMode::Customer(user) => {
                let item = self.carts.add_item(user, request).await?;
                info!(user_id = %user, line_id = item.id, "Added to customer cart");
            }
        }
        Ok(())
    }

    /// Apply a quantity from the stepper. Anything below 1 removes the line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown line, `BadRequest` for a line id
    /// that cannot belong to `mode`, or the API error.
    #[instrument(skip(self, shopper))]
    pub async fn set_quantity(
        &self,
        shopper: &ShopperSession,
        mode: CartMode,
        line_id: &str,
        requested: i64,
    ) -> Result<(), AppError> {
        let change = QuantityChange::from_requested(requested);
        match mode {
            CartMode::Guest => {
                let mut cart = shopper.guest_cart().await;
                if !cart.apply(line_id, change) {
                    return Err(AppError::NotFound(format!("Cart line {line_id}")));
                }
                shopper.save_guest_cart(&cart).await?;
            }
            CartMode::Customer(user) => {
                let item_id = customer_line_id(line_id)?;
                match change {
                    QuantityChange::Remove => self.carts.remove_item(user, item_id).await?,
                    QuantityChange::Update(quantity) => {
                        self.carts
                            .update_item(user, item_id, UpdateCartItem { quantity })
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_quantity`].
    pub async fn remove(
        &self,
        shopper: &ShopperSession,
        mode: CartMode,
        line_id: &str,
    ) -> Result<(), AppError> {
        self.set_quantity(shopper, mode, line_id, 0).await
    }
}

/// Customer cart lines are keyed by the API's integer id.
fn customer_line_id(line_id: &str) -> Result<i32, AppError> {
    line_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown cart line {line_id}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use segishop_core::cart::{CartItem, CartSummary};
    use segishop_core::catalog::{Product, ProductQuery};
    use segishop_core::review::{NewReview, ProductReview, ReviewPage};
    use segishop_core::types::{Page, ProductId};
    use tower_sessions::{MemoryStore, Session};

    use super::*;
    use crate::api::ApiError;

    /// In-memory stand-in for the product and cart endpoints.
    #[derive(Default)]
    struct FakeApi {
        lines: Mutex<Vec<CartItem>>,
        refuse_product: Option<ProductId>,
    }

    fn product(id: i32) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": format!("Product {id}"), "price": 20.0, "salePrice": 15.0,
            "stock": 8, "imageUrl": "https://cdn.segishop.com/p.jpg"
        }))
        .unwrap()
    }

    #[async_trait]
    impl CatalogApi for FakeApi {
        async fn list_products(&self, _query: &ProductQuery) -> Result<Page<Product>, ApiError> {
            unreachable!("not used by the cart")
        }

        async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
            if id.as_i32() == 404 {
                return Err(ApiError::NotFound(format!("Product {id}")));
            }
            Ok(product(id.as_i32()))
        }

        async fn list_reviews(&self, _product: ProductId, page: u32) -> Result<ReviewPage, ApiError> {
            Ok(ReviewPage::empty(page))
        }

        async fn submit_review(
            &self,
            _product: ProductId,
            _review: &NewReview,
        ) -> Result<ProductReview, ApiError> {
            unreachable!("not used by the cart")
        }
    }

    #[async_trait]
    impl CartApi for FakeApi {
        async fn get_cart(&self, _user: UserId) -> Result<CartSummary<CartItem>, ApiError> {
            let items = self.lines.lock().unwrap().clone();
            Ok(CartSummary {
                total_items: items.iter().map(|i| i.quantity).sum(),
                subtotal: items.iter().map(|i| i.total_price).sum(),
                unique_items_count: u32::try_from(items.len()).unwrap(),
                items,
            })
        }

        async fn add_item(&self, _user: UserId, item: &AddToCart) -> Result<CartItem, ApiError> {
            if self.refuse_product == Some(item.product_id) {
                return Err(ApiError::Rejected("Out of stock".to_string()));
            }
            let mut lines = self.lines.lock().unwrap();
            let line: CartItem = serde_json::from_value(serde_json::json!({
                "id": lines.len() + 1,
                "productId": item.product_id,
                "productName": "Line",
                "productPrice": 10.0,
                "quantity": item.quantity,
                "totalPrice": 10.0 * f64::from(item.quantity),
            }))
            .unwrap();
            lines.push(line.clone());
            Ok(line)
        }

        async fn update_item(
            &self,
            _user: UserId,
            item_id: i32,
            update: UpdateCartItem,
        ) -> Result<CartItem, ApiError> {
            let mut lines = self.lines.lock().unwrap();
            let line = lines
                .iter_mut()
                .find(|l| l.id == item_id)
                .ok_or_else(|| ApiError::NotFound("Cart item".to_string()))?;
            line.quantity = update.quantity;
            Ok(line.clone())
        }

        async fn remove_item(&self, _user: UserId, item_id: i32) -> Result<(), ApiError> {
            self.lines.lock().unwrap().retain(|l| l.id != item_id);
            Ok(())
        }
    }

    fn shopper() -> ShopperSession {
        ShopperSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn add(product_id: i32, quantity: u32) -> AddToCart {
        AddToCart {
            product_id: ProductId::new(product_id),
            quantity,
            product_attributes: None,
            calculated_price: None,
        }
    }

    // =========================================================================
    // Guest cart
    // =========================================================================

    #[tokio::test]
    async fn test_guest_add_uses_sale_price() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let shopper = shopper();

        service.add(&shopper, CartMode::Guest, &add(3, 2)).await.unwrap();
        let view = service.view(&shopper, CartMode::Guest).await.unwrap();

        assert!(view.is_guest);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.total_items, 2);
        assert_eq!(view.subtotal, Decimal::new(30, 0));
        assert_eq!(view.lines[0].each, Decimal::new(15, 0));
    }

    #[tokio::test]
    async fn test_guest_quantity_zero_removes_line() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let shopper = shopper();

        service.add(&shopper, CartMode::Guest, &add(3, 1)).await.unwrap();
        let line_id = shopper.guest_cart().await.items()[0].id.clone();

        service
            .set_quantity(&shopper, CartMode::Guest, &line_id, 0)
            .await
            .unwrap();
        assert!(service.view(&shopper, CartMode::Guest).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guest_unknown_line_is_not_found() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let err = service
            .set_quantity(&shopper(), CartMode::Guest, "guest_1_1", 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_rejects_zero_quantity_and_unknown_product() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let shopper = shopper();

        assert!(matches!(
            service.add(&shopper, CartMode::Guest, &add(3, 0)).await.unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            service.add(&shopper, CartMode::Guest, &add(404, 1)).await.unwrap_err(),
            AppError::Api(ApiError::NotFound(_))
        ));
    }

    // =========================================================================
    // Customer cart
    // =========================================================================

    #[tokio::test]
    async fn test_customer_update_and_remove() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let shopper = shopper();
        let mode = CartMode::Customer(UserId::new(5));

        service.add(&shopper, mode, &add(3, 1)).await.unwrap();
        service.set_quantity(&shopper, mode, "1", 4).await.unwrap();
        assert_eq!(api.lines.lock().unwrap()[0].quantity, 4);

        service.set_quantity(&shopper, mode, "1", -2).await.unwrap();
        assert!(api.lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customer_rejects_guest_line_id() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let err = service
            .remove(&shopper(), CartMode::Customer(UserId::new(5)), "guest_1_3")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    // =========================================================================
    // Merge
    // =========================================================================

    #[tokio::test]
    async fn test_sign_in_merges_guest_cart() {
        let api = FakeApi::default();
        let service = CartService::new(&api, &api);
        let shopper = shopper();

        service.add(&shopper, CartMode::Guest, &add(3, 2)).await.unwrap();
        service.add(&shopper, CartMode::Guest, &add(4, 1)).await.unwrap();
        shopper.set_customer(UserId::new(5)).await.unwrap();

        let mode = service.resolve(&shopper).await.unwrap();
        assert_eq!(mode, CartMode::Customer(UserId::new(5)));
        assert!(shopper.guest_cart().await.is_empty());

        let view = service.view(&shopper, mode).await.unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.total_items, 3);
    }

    #[tokio::test]
    async fn test_refused_lines_are_dropped_after_merge() {
        let api = FakeApi {
            refuse_product: Some(ProductId::new(4)),
            ..FakeApi::default()
        };
        let service = CartService::new(&api, &api);
        let shopper = shopper();

        service.add(&shopper, CartMode::Guest, &add(3, 1)).await.unwrap();
        service.add(&shopper, CartMode::Guest, &add(4, 1)).await.unwrap();

        let moved = service.merge_guest(&shopper, UserId::new(5)).await.unwrap();
        assert_eq!(moved, 1);
        assert!(shopper.guest_cart().await.is_empty());

        // Nothing left to retry on the next request
        let again = service.merge_guest(&shopper, UserId::new(5)).await.unwrap();
        assert_eq!(again, 0);
    }
}

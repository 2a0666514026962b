//! Customer cart endpoints. Guest carts never reach the API.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use segishop_core::cart::{AddToCart, CartItem, CartSummary, UpdateCartItem};
use segishop_core::types::UserId;

use super::types::{CartItemPayload, CartPayload};
use super::{ApiError, StoreClient};

/// Server-side cart of a signed-in customer.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn get_cart(&self, user: UserId) -> Result<CartSummary<CartItem>, ApiError>;
    async fn add_item(&self, user: UserId, item: &AddToCart) -> Result<CartItem, ApiError>;
    async fn update_item(
        &self,
        user: UserId,
        item_id: i32,
        update: UpdateCartItem,
    ) -> Result<CartItem, ApiError>;
    async fn remove_item(&self, user: UserId, item_id: i32) -> Result<(), ApiError>;
}

#[async_trait]
impl CartApi for StoreClient {
    #[instrument(skip(self))]
    async fn get_cart(&self, user: UserId) -> Result<CartSummary<CartItem>, ApiError> {
        let payload: CartPayload = self.get(&format!("cart/{user}"), &[]).await?;
        Ok(payload.cart.unwrap_or_else(CartSummary::empty))
    }

    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    async fn add_item(&self, user: UserId, item: &AddToCart) -> Result<CartItem, ApiError> {
        let payload: CartItemPayload = self
            .send_json(Method::POST, &format!("cart/{user}/items"), item)
            .await?;
        payload
            .cart_item
            .ok_or_else(|| ApiError::Parse("response carried no cart item".to_string()))
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        user: UserId,
        item_id: i32,
        update: UpdateCartItem,
    ) -> Result<CartItem, ApiError> {
        let payload: CartItemPayload = self
            .send_json(Method::PUT, &format!("cart/{user}/items/{item_id}"), &update)
            .await?;
        payload
            .cart_item
            .ok_or_else(|| ApiError::Parse("response carried no cart item".to_string()))
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, user: UserId, item_id: i32) -> Result<(), ApiError> {
        let _: CartPayload = self.delete(&format!("cart/{user}/items/{item_id}")).await?;
        Ok(())
    }
}

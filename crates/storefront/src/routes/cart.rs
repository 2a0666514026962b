//! Cart route handlers.
//!
//! Every handler resolves the shopper's cart mode first, which also merges a
//! guest cart into the customer's cart once the session has a customer.
//! Mutations are plain form posts that redirect back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use segishop_core::cart::{AddToCart, CartLine};
use segishop_core::types::ProductId;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::ShopperSession;
use crate::routes::{Chrome, safe_return_to};
use crate::services::CartView;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<String>,
    pub product_attributes: Option<String>,
    /// Page to return to; the cart page when absent.
    pub return_to: Option<String>,
}

impl AddToCartForm {
    fn to_request(&self) -> Result<AddToCart, AppError> {
        let quantity = match self.quantity.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| AppError::BadRequest(format!("Invalid quantity: {raw}")))?,
        };
        Ok(AddToCart {
            product_id: self.product_id,
            quantity,
            product_attributes: self
                .product_attributes
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_owned),
            calculated_price: None,
        })
    }
}

/// Quantity stepper form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: String,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub chrome: Chrome,
    pub cart: CartView,
    pub load_error: Option<String>,
}

impl CartTemplate {
    fn attributes_label(&self, line: &CartLine) -> String {
        line.attributes.display_label().unwrap_or_default()
    }

    fn decrement(&self, line: &CartLine) -> i64 {
        i64::from(line.quantity) - 1
    }

    fn increment(&self, line: &CartLine) -> i64 {
        i64::from(line.quantity) + 1
    }
}

/// Display cart page.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    shopper: ShopperSession,
) -> Result<CartTemplate, AppError> {
    let service = state.cart();
    let mode = service.resolve(&shopper).await?;
    let (cart, load_error) = match service.view(&shopper, mode).await {
        Ok(cart) => (cart, None),
        Err(AppError::Api(e)) => {
            tracing::error!("Failed to fetch cart: {e}");
            let empty = CartView {
                lines: Vec::new(),
                total_items: 0,
                subtotal: rust_decimal::Decimal::ZERO,
                is_guest: mode.is_guest(),
            };
            (empty, Some(e.user_message()))
        }
        Err(e) => return Err(e),
    };

    let chrome = Chrome {
        currency: state.currency().context(shopper.currency().await).await,
        cart_count: cart.total_items,
        current_path: "/cart".to_string(),
    };

    Ok(CartTemplate {
        chrome,
        cart,
        load_error,
    })
}

/// Add item to cart.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let request = form.to_request()?;
    let service = state.cart();
    let mode = service.resolve(&shopper).await?;
    service.add(&shopper, mode, &request).await?;

    let product_id = request.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    let target = safe_return_to(form.return_to.as_deref(), "/cart");
    Ok(Redirect::to(&target).into_response())
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip(state, shopper))]
pub async fn update(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    let requested = form
        .quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid quantity: {}", form.quantity)))?;

    let service = state.cart();
    let mode = service.resolve(&shopper).await?;
    service
        .set_quantity(&shopper, mode, &form.line_id, requested)
        .await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(state, shopper))]
pub async fn remove(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    let service = state.cart();
    let mode = service.resolve(&shopper).await?;
    service.remove(&shopper, mode, &form.line_id).await?;
    add_breadcrumb("cart", "Removed from cart", Some(&[("line_id", form.line_id.as_str())]));
    Ok(Redirect::to("/cart"))
}

//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Guest and customer carts behind one interface
//! - `currency` - Exchange rates and the shopper's display currency

pub mod cart;
pub mod currency;

pub use cart::{CartService, CartView};
pub use currency::{CurrencyContext, CurrencyService, HttpRateSource, RateSource};

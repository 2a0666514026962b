//! Shopping cart shapes and the rules the cart page applies to them.
//!
//! There are two carts. A signed-in customer's cart lives on the API; a
//! guest's cart lives in the session. [`CartMode`] decides which one a
//! request reads and writes.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, UserId, timestamp};

/// "6 pack", "12-Pack", "3pack". The number is the pack size.
static PACK_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*pack").expect("Invalid regex"));

// =============================================================================
// Mode
// =============================================================================

/// Which cart the current request works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// Cart kept in the session.
    Guest,
    /// Cart kept by the API for this customer.
    Customer(UserId),
}

impl CartMode {
    #[must_use]
    pub const fn from_customer(customer: Option<UserId>) -> Self {
        match customer {
            Some(id) => Self::Customer(id),
            None => Self::Guest,
        }
    }

    #[must_use]
    pub const fn is_guest(self) -> bool {
        matches!(self, Self::Guest)
    }
}

/// What a quantity stepper click turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Update(u32),
    Remove,
}

impl QuantityChange {
    /// Anything below 1 removes the line.
    #[must_use]
    pub fn from_requested(quantity: i64) -> Self {
        if quantity < 1 {
            Self::Remove
        } else {
            Self::Update(u32::try_from(quantity).unwrap_or(u32::MAX))
        }
    }
}

// =============================================================================
// Line attributes
// =============================================================================

/// Parsed `productAttributes` of a cart line.
///
/// The API stores attributes as an opaque string: usually a JSON object
/// carrying a `displayName`, sometimes plain text, sometimes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAttributes {
    None,
    /// A multi-unit pack; `label` is the configuration's display name.
    Pack { size: u32, label: Option<String> },
    /// Any other configuration, reduced to its display text.
    Text(String),
    /// Looked like JSON but did not parse. `pack_size` is still read from
    /// the raw text so pack pricing applies.
    Malformed { raw: String, pack_size: Option<u32> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeConfig {
    #[serde(default)]
    display_name: Option<String>,
}

impl LineAttributes {
    /// Parse the raw attribute string once, at the API boundary.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Self::None;
        };

        let looks_like_json = raw.starts_with('{') || raw.starts_with('[');
        let label = if looks_like_json {
            match serde_json::from_str::<AttributeConfig>(raw) {
                Ok(config) => config.display_name.filter(|n| !n.trim().is_empty()),
                Err(_) => {
                    return Self::Malformed {
                        raw: raw.to_owned(),
                        pack_size: pack_size(raw),
                    };
                }
            }
        } else {
            Some(raw.to_owned())
        };

        match pack_size(raw) {
            Some(size) => Self::Pack { size, label },
            None => Self::Text(label.unwrap_or_else(|| "Custom configuration".to_owned())),
        }
    }

    #[must_use]
    pub const fn pack_size(&self) -> Option<u32> {
        match self {
            Self::Pack { size, .. } => Some(*size),
            Self::Malformed { pack_size, .. } => *pack_size,
            Self::None | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Text shown under the product name, `None` for plain lines.
    #[must_use]
    pub fn display_label(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Pack { size, label } => {
                Some(label.clone().unwrap_or_else(|| format!("{size} pack")))
            }
            Self::Text(text) => Some(text.clone()),
            Self::Malformed { .. } => Some("Standard".to_owned()),
        }
    }
}

fn pack_size(raw: &str) -> Option<u32> {
    PACK_SIZE
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

// =============================================================================
// Unit price
// =============================================================================

/// Price figures a cart line may carry. Which ones are present depends on
/// where the line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBasis<'a> {
    pub product_price: Option<Decimal>,
    pub effective_price: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_price: Decimal,
    pub quantity: u32,
    pub attributes: &'a LineAttributes,
}

impl PriceBasis<'_> {
    /// The "each" price shown on a cart line.
    ///
    /// An explicit product price wins. Otherwise a pack divides the
    /// effective price (or the unit price) by the pack size. Then the plain
    /// unit price, and last the line total over its quantity.
    #[must_use]
    pub fn each(&self) -> Decimal {
        if let Some(price) = self.product_price {
            return price;
        }
        if let Some(size) = self.attributes.pack_size() {
            let size = Decimal::from(size);
            if let Some(price) = self.effective_price.or(self.unit_price) {
                return price / size;
            }
        }
        if let Some(price) = self.unit_price {
            return price;
        }
        self.total_price
            .checked_div(Decimal::from(self.quantity))
            .unwrap_or(self.total_price)
    }
}

// =============================================================================
// Customer cart (API)
// =============================================================================

/// A line of a customer's cart as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i32,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub product_price: Option<Decimal>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub product_attributes: Option<String>,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    #[serde(default = "in_stock")]
    pub is_in_stock: bool,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn in_stock() -> bool {
    true
}

/// Cart contents plus totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary<T> {
    pub items: Vec<T>,
    pub total_items: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub unique_items_count: u32,
}

impl<T> CartSummary<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            subtotal: Decimal::ZERO,
            unique_items_count: 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body for `POST /cart/{userId}/items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_attributes: Option<String>,
    /// Price worked out on the product page for a configured product.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub calculated_price: Option<Decimal>,
}

/// Body for `PUT /cart/{userId}/items/{itemId}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: u32,
}

// =============================================================================
// Guest cart (session)
// =============================================================================

/// A guest cart line. Ids are `guest_{millis}_{productId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartItem {
    pub id: String,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub effective_price: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub product_attributes: Option<String>,
}

/// Product facts copied into a guest line when it is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Decimal,
}

/// A guest's cart, stored whole in the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuestCart {
    items: Vec<GuestCartItem>,
}

impl GuestCart {
    #[must_use]
    pub fn items(&self) -> &[GuestCartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of a product. A line with the same product and
    /// attributes is topped up and refreshed from `product` instead of
    /// duplicated. Returns the id of the affected line.
    pub fn add(
        &mut self,
        product: ProductSnapshot,
        request: &AddToCart,
        now: DateTime<Utc>,
    ) -> String {
        let effective_price = request.calculated_price.unwrap_or(product.price);
        let existing = self.items.iter_mut().find(|item| {
            item.product_id == product.product_id
                && item.product_attributes == request.product_attributes
        });

        if let Some(item) = existing {
            item.quantity = item.quantity.saturating_add(request.quantity);
            item.product_name = product.name;
            item.product_image = product.image_url;
            item.unit_price = product.price;
            item.effective_price = effective_price;
            item.total_price = effective_price * Decimal::from(item.quantity);
            return item.id.clone();
        }

        let id = format!(
            "guest_{}_{}",
            now.timestamp_millis(),
            product.product_id.as_i32()
        );
        self.items.push(GuestCartItem {
            id: id.clone(),
            product_id: product.product_id,
            product_name: product.name,
            product_image: product.image_url,
            quantity: request.quantity,
            unit_price: product.price,
            effective_price,
            total_price: effective_price * Decimal::from(request.quantity),
            product_attributes: request.product_attributes.clone(),
        });
        id
    }

    /// Apply a stepper change. Returns `false` when no line has `id`.
    pub fn apply(&mut self, id: &str, change: QuantityChange) -> bool {
        match change {
            QuantityChange::Remove => self.remove(id),
            QuantityChange::Update(quantity) => {
                let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
                    return false;
                };
                item.quantity = quantity;
                item.total_price = item.effective_price * Decimal::from(quantity);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Requests that re-create every guest line in a customer's cart.
    #[must_use]
    pub fn merge_requests(&self) -> Vec<AddToCart> {
        self.items
            .iter()
            .map(|item| AddToCart {
                product_id: item.product_id,
                quantity: item.quantity,
                product_attributes: item.product_attributes.clone(),
                calculated_price: None,
            })
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary<GuestCartItem> {
        CartSummary {
            items: self.items.clone(),
            total_items: self.items.iter().map(|i| i.quantity).sum(),
            subtotal: self.items.iter().map(|i| i.total_price).sum(),
            unique_items_count: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// A cart line ready for display, whichever cart it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Numeric id for customer lines, `guest_...` for guest lines.
    pub id: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub attributes: LineAttributes,
    pub quantity: u32,
    pub each: Decimal,
    pub total_price: Decimal,
}

impl From<&CartItem> for CartLine {
    fn from(item: &CartItem) -> Self {
        let attributes = LineAttributes::parse(item.product_attributes.as_deref());
        let each = PriceBasis {
            product_price: item.product_price,
            effective_price: None,
            unit_price: None,
            total_price: item.total_price,
            quantity: item.quantity,
            attributes: &attributes,
        }
        .each();
        Self {
            id: item.id.to_string(),
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            attributes,
            quantity: item.quantity,
            each,
            total_price: item.total_price,
        }
    }
}

impl From<&GuestCartItem> for CartLine {
    fn from(item: &GuestCartItem) -> Self {
        let attributes = LineAttributes::parse(item.product_attributes.as_deref());
        let each = PriceBasis {
            product_price: None,
            effective_price: Some(item.effective_price),
            unit_price: Some(item.unit_price),
            total_price: item.total_price,
            quantity: item.quantity,
            attributes: &attributes,
        }
        .each();
        Self {
            id: item.id.clone(),
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            attributes,
            quantity: item.quantity,
            each,
            total_price: item.total_price,
        }
    }
}

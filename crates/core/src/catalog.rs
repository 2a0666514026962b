//! Products and categories as the storefront and admin see them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, StatusFilter, StockStatus, timestamp};
use crate::validation::{FieldErrors, non_blank};

pub const PRODUCT_NAME_MAX: usize = 200;
pub const META_TITLE_MAX: usize = 200;
pub const META_DESCRIPTION_MAX: usize = 500;

/// A product on the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: Option<u32>,
}

impl Product {
    /// Sale price when it undercuts the list price, else the list price.
    #[must_use]
    pub fn current_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if sale > Decimal::ZERO && sale < self.price => sale,
            _ => self.price,
        }
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.current_price() < self.price
    }

    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_stock(self.stock)
    }
}

/// Image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i32,
    pub image_url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

/// A product row in the admin catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub category_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl AdminProduct {
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_stock(self.stock)
    }
}

/// Keep only products whose stock passes `filter`.
///
/// Applied to a fetched page after the API has applied search and category,
/// so the result depends on stock alone.
#[must_use]
pub fn filter_by_status(products: Vec<AdminProduct>, filter: StatusFilter) -> Vec<AdminProduct> {
    products
        .into_iter()
        .filter(|p| filter.matches(p.stock))
        .collect()
}

/// Compact product row used in class assignment lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub product_count: u32,
}

/// Product list query, shared by the admin list and the storefront listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Body for `POST /admin/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub sale_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub stock: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub is_active: bool,
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_gallery: Vec<String>,
}

impl NewProduct {
    /// Check the fields the API would reject and trim text.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank name or description, a
    /// non-positive price, a negative sale price or stock, an unset
    /// category, or oversized text.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Product name", &self.name, PRODUCT_NAME_MAX);
        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }
        if self.price <= Decimal::ZERO {
            errors.add("price", "Price must be greater than 0");
        }
        if self.sale_price.is_some_and(|p| p.is_sign_negative()) {
            errors.add("sale_price", "Sale price must be zero or more");
        }
        if self.stock < 0 {
            errors.add("stock", "Stock must be zero or more");
        }
        if !self.category_id.is_set() {
            errors.add("category_id", "Category is required");
        }
        errors.limit_text("meta_title", "Meta title", self.meta_title.as_deref(), META_TITLE_MAX);
        errors.limit_text(
            "meta_description",
            "Meta description",
            self.meta_description.as_deref(),
            META_DESCRIPTION_MAX,
        );
        errors.into_result()?;

        let slug = non_blank(self.slug.as_deref())
            .map(|s| crate::slug::generate_slug(&s))
            .filter(|s| !s.trim_matches('-').is_empty());
        Ok(Self {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            sku: non_blank(self.sku.as_deref()),
            image_url: non_blank(self.image_url.as_deref()),
            meta_title: non_blank(self.meta_title.as_deref()),
            meta_description: non_blank(self.meta_description.as_deref()),
            slug,
            ..self
        })
    }
}

/// Body for `PATCH /admin/products/bulk-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdate {
    pub product_ids: Vec<ProductId>,
    pub is_active: bool,
}

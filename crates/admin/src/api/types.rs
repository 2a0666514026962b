//! Response payloads as the Segishop API shapes them.
//!
//! The envelope fields (`success`, `message`) are handled by the client;
//! these structs only name the data each endpoint carries next to them.

use serde::{Deserialize, Serialize};

use segishop_core::catalog::{AdminProduct, Category, ProductSummary};
use segishop_core::shipping::{ClassCost, ShippingClass, ShippingMethod, ShippingZone};
use segishop_core::types::{ClassCostId, Page, PageRequest, ProductId};

/// Acknowledgement for mutations that return no data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZonesPayload {
    #[serde(default)]
    pub zones: Vec<ShippingZone>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZonePayload {
    pub zone: Option<ShippingZone>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MethodsPayload {
    #[serde(default)]
    pub methods: Vec<ShippingMethod>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MethodPayload {
    pub method: Option<ShippingMethod>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassesPayload {
    #[serde(default)]
    pub classes: Vec<ShippingClass>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassPayload {
    pub class: Option<ShippingClass>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CostsPayload {
    #[serde(default)]
    pub costs: Vec<ClassCost>,
}

/// `POST /admin/shipping/class-costs` answers with the new row's id only.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedCost {
    pub id: Option<ClassCostId>,
}

/// A page of products as the shipping and catalog endpoints return it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductsPayload<T> {
    #[serde(default = "Vec::new")]
    pub products: Vec<T>,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl<T> ProductsPayload<T> {
    /// Convert into a [`Page`], falling back to the requested paging when
    /// the API leaves it out.
    pub fn into_page(self, request: PageRequest) -> Page<T> {
        let request = PageRequest::new(
            if self.page == 0 { request.page } else { self.page },
            if self.page_size == 0 {
                request.page_size
            } else {
                self.page_size
            },
        );
        Page::new(self.products, self.total_count, request)
    }
}

pub(crate) type ClassProductsPayload = ProductsPayload<ProductSummary>;
pub(crate) type AdminProductsPayload = ProductsPayload<AdminProduct>;

#[derive(Debug, Deserialize)]
pub(crate) struct ProductPayload {
    pub product: Option<AdminProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesPayload {
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// `PATCH /admin/products/bulk-status` result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResult {
    #[serde(default)]
    pub updated_count: u32,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body for class product assignment and removal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductIds<'a> {
    pub product_ids: &'a [ProductId],
}

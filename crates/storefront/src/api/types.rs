//! Response payloads for the storefront endpoints.

use serde::Deserialize;

use segishop_core::cart::{CartItem, CartSummary};
use segishop_core::catalog::Product;
use segishop_core::types::{Page, PageRequest};

/// `GET /products` body. Older API builds leave out the totals.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductsPayload {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl ProductsPayload {
    /// Convert into a [`Page`].
    ///
    /// Without a `totalCount` a full page is taken to mean at least one more
    /// item follows, so the pager still offers "Next".
    pub fn into_page(self, request: PageRequest) -> Page<Product> {
        let request = PageRequest::new(
            if self.page == 0 { request.page } else { self.page },
            if self.page_size == 0 {
                request.page_size
            } else {
                self.page_size
            },
        );
        let seen = u32::try_from(self.products.len()).unwrap_or(u32::MAX);
        let total_count = self.total_count.unwrap_or_else(|| {
            let before = request.page.saturating_sub(1) * request.page_size;
            let more = u32::from(seen == request.page_size && seen > 0);
            before + seen + more
        });
        Page::new(self.products, total_count, request)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductPayload {
    pub product: Option<Product>,
}

/// `GET /cart/{userId}` and `DELETE /cart/{userId}/items/{itemId}` body.
#[derive(Debug, Deserialize)]
pub(crate) struct CartPayload {
    pub cart: Option<CartSummary<CartItem>>,
}

/// `POST`/`PUT` on cart items answer with the affected line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemPayload {
    pub cart_item: Option<CartItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(count: usize, total: Option<u32>) -> ProductsPayload {
        let products = (1..=count)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": i, "name": format!("Product {i}"), "price": 10.0
                }))
                .unwrap()
            })
            .collect();
        ProductsPayload {
            products,
            total_count: total,
            page: 0,
            page_size: 0,
        }
    }

    #[test]
    fn test_into_page_uses_reported_total() {
        let page = payload(12, Some(30)).into_page(PageRequest::new(1, 12));
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
    }

    #[test]
    fn test_into_page_full_page_without_total_has_next() {
        let page = payload(12, None).into_page(PageRequest::new(2, 12));
        assert_eq!(page.total_count, 25);
        assert!(page.has_next());
    }

    #[test]
    fn test_into_page_short_page_without_total_is_last() {
        let page = payload(5, None).into_page(PageRequest::new(2, 12));
        assert_eq!(page.total_count, 17);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_cart_payload_shape() {
        let payload: CartPayload = serde_json::from_str(
            r#"{"success": true, "cart": {"items": [], "totalItems": 0, "subtotal": 0, "uniqueItemsCount": 0}}"#,
        )
        .unwrap();
        assert!(payload.cart.unwrap().is_empty());
    }
}

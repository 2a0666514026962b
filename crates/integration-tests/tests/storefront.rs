//! Storefront router and cart service against the fake Segishop API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use segishop_core::cart::{AddToCart, CartMode};
use segishop_core::types::{ProductId, UserId};
use segishop_integration_tests::{FakeData, FakeSegishop, product, review};
use segishop_storefront::middleware::ShopperSession;
use segishop_storefront::state::AppState;

fn seeded() -> FakeData {
    let mut data = FakeData {
        products: vec![
            product(1, "Mango Chutney", 10.0, None),
            product(2, "Lime Pickle", 8.0, Some(6.0)),
        ],
        ..FakeData::default()
    };
    data.reviews.insert(
        ProductId::new(1),
        vec![review(11, 1, 5, "Asha"), review(12, 1, 4, "Ben")],
    );
    data.rates.insert("USD".to_string(), 1.0);
    data.rates.insert("EUR".to_string(), 0.5);
    data
}

/// Drives the router like a browser that keeps one session cookie.
struct Browser {
    app: Router,
    cookie: Option<String>,
}

impl Browser {
    fn new(fake: &FakeSegishop) -> Self {
        let state = AppState::new(fake.storefront_config()).unwrap();
        Self {
            app: segishop_storefront::app(state),
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set) = response.headers().get(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        response
    }

    async fn get(&mut self, path: &str) -> Response {
        self.send(Request::get(path).body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, path: &str, form: &str) -> Response {
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_listing_shows_products_and_sale_prices() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let response = browser.get("/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
    let html = body_text(response).await;
    assert!(html.contains("Mango Chutney"));
    assert!(html.contains("$10.00"));
    // Sale price shown with the list price struck through
    assert!(html.contains("$6.00"));
    assert!(html.contains("$8.00"));
}

#[tokio::test]
async fn test_listing_search_filters() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let html = body_text(browser.get("/products?search=lime").await).await;
    assert!(html.contains("Lime Pickle"));
    assert!(!html.contains("Mango Chutney"));
}

#[tokio::test]
async fn test_product_page_shows_reviews() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let response = browser.get("/products/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("4.5"));
    assert!(html.contains("Asha"));
    assert!(html.contains("2 reviews"));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);
    let response = browser.get("/products/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn test_invalid_review_rerenders_with_errors() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let response = browser
        .post(
            "/products/1/reviews",
            "rating=&review_text=short&reviewer_name=Asha&reviewer_email=asha%40example.com",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please select a rating"));
    // The shopper's input is kept
    assert!(html.contains("value=\"Asha\""));
    assert!(fake.data().pending_reviews.is_empty());
}

#[tokio::test]
async fn test_valid_review_goes_to_moderation() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let response = browser
        .post(
            "/products/1/reviews",
            "rating=4&title=Lovely&review_text=Tangy+and+fresh%2C+great+with+rice.\
             &reviewer_name=Asha&reviewer_email=asha%40example.com",
        )
        .await;
    assert!(response.status().is_redirection());
    let target = location(&response);
    assert_eq!(target, "/products/1?review=submitted#reviews");

    {
        let data = fake.data();
        let pending = data.pending_reviews.first().unwrap();
        assert_eq!(pending.rating, 4);
        assert!(!pending.is_approved);
    }

    let html = body_text(browser.get("/products/1?review=submitted").await).await;
    assert!(html.contains("awaiting moderation"));
}

// =============================================================================
// Currency
// =============================================================================

#[tokio::test]
async fn test_currency_choice_sticks_to_session() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let response = browser
        .post("/currency", "currency=EUR&return_to=%2Fproducts%2F1")
        .await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/products/1");

    let html = body_text(browser.get("/products/1").await).await;
    assert!(html.contains("5.00€"));
}

#[tokio::test]
async fn test_currency_rejects_unknown_code_and_open_redirects() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let bad = browser.post("/currency", "currency=XYZ").await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let offsite = browser
        .post("/currency", "currency=EUR&return_to=https%3A%2F%2Fevil.example")
        .await;
    assert_eq!(location(&offsite), "/");
}

#[tokio::test]
async fn test_rate_outage_falls_back_to_defaults() {
    let mut data = seeded();
    data.rates.clear();
    let fake = FakeSegishop::spawn(data).await;
    let mut browser = Browser::new(&fake);

    browser.post("/currency", "currency=EUR").await;
    let response = browser.get("/products/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains('€'));
}

// =============================================================================
// Guest cart
// =============================================================================

#[tokio::test]
async fn test_guest_cart_add_update_remove() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);

    let added = browser
        .post("/cart/add", "product_id=2&quantity=2&return_to=%2Fproducts%2F2")
        .await;
    assert!(added.status().is_redirection());
    assert_eq!(location(&added), "/products/2");

    let html = body_text(browser.get("/cart").await).await;
    assert!(html.contains("Lime Pickle"));
    // Sale price times two
    assert!(html.contains("$12.00"));
    assert!(html.contains("Cart (2)"));
    assert!(html.contains("Sign in to keep your cart"));

    let line_id = html
        .split("name=\"line_id\" value=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();
    assert!(line_id.starts_with("guest_"), "{line_id}");

    let updated = browser
        .post("/cart/update", &format!("line_id={line_id}&quantity=3"))
        .await;
    assert_eq!(location(&updated), "/cart");
    let html = body_text(browser.get("/cart").await).await;
    assert!(html.contains("$18.00"));

    browser
        .post("/cart/update", &format!("line_id={line_id}&quantity=0"))
        .await;
    let html = body_text(browser.get("/cart").await).await;
    assert!(html.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_guest_cart_rejects_unknown_line() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let mut browser = Browser::new(&fake);
    let response = browser.post("/cart/remove", "line_id=guest_missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Guest to customer merge
// =============================================================================

fn shopper() -> ShopperSession {
    ShopperSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
}

#[tokio::test]
async fn test_sign_in_merges_guest_cart() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let state = AppState::new(fake.storefront_config()).unwrap();
    let service = state.cart();
    let shopper = shopper();

    for (product_id, quantity) in [(1, 1), (2, 3)] {
        let request = AddToCart {
            product_id: ProductId::new(product_id),
            quantity,
            product_attributes: None,
            calculated_price: None,
        };
        service.add(&shopper, CartMode::Guest, &request).await.unwrap();
    }
    assert_eq!(shopper.guest_cart().await.items().len(), 2);

    let user = UserId::new(42);
    shopper.set_customer(user).await.unwrap();
    let mode = service.resolve(&shopper).await.unwrap();
    assert!(matches!(mode, CartMode::Customer(u) if u == user));

    assert!(shopper.guest_cart().await.is_empty());
    let view = service.view(&shopper, mode).await.unwrap();
    assert_eq!(view.total_items, 4);
    assert!(!view.is_guest);
    assert_eq!(fake.data().carts.get(&user).unwrap().len(), 2);
}

#[tokio::test]
async fn test_refused_lines_are_dropped_after_merge() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let state = AppState::new(fake.storefront_config()).unwrap();
    let service = state.cart();
    let shopper = shopper();

    for product_id in [1, 2] {
        let request = AddToCart {
            product_id: ProductId::new(product_id),
            quantity: 1,
            product_attributes: None,
            calculated_price: None,
        };
        service.add(&shopper, CartMode::Guest, &request).await.unwrap();
    }

    // Product 2 disappears before sign-in, so the API refuses its line
    fake.data().products.retain(|p| p.id != ProductId::new(2));

    let user = UserId::new(7);
    let merged = service.merge_guest(&shopper, user).await.unwrap();
    assert_eq!(merged, 1);
    assert!(shopper.guest_cart().await.is_empty());

    assert_eq!(fake.data().carts.get(&user).unwrap().len(), 1);

    // A later request does not re-send the refused line
    shopper.set_customer(user).await.unwrap();
    let mode = service.resolve(&shopper).await.unwrap();
    assert!(matches!(mode, CartMode::Customer(u) if u == user));
    assert_eq!(fake.data().carts.get(&user).unwrap().len(), 1);
}

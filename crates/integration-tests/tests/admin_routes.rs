//! Admin router handlers against the fake Segishop API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;
use url::Url;

use segishop_admin::api::SegishopClient;
use segishop_admin::state::AppState;
use segishop_core::types::MethodId;
use segishop_integration_tests::{
    ADMIN_TOKEN, FakeData, FakeSegishop, admin_config_for, admin_product, class_cost, method,
    zone,
};

fn app_for(config: segishop_admin::config::AdminConfig) -> axum::Router {
    let client = SegishopClient::new(&config.api).unwrap();
    segishop_admin::app(AppState::with_backends(
        config,
        Arc::new(client.clone()),
        Arc::new(client),
    ))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn seeded() -> FakeData {
    FakeData {
        zones: vec![zone(1, "Domestic"), zone(2, "Europe")],
        methods: vec![method(7, "Standard Post")],
        admin_products: vec![admin_product(1, "Mango Chutney"), admin_product(2, "Lime Pickle")],
        class_costs: vec![class_cost(40, 5, 3, 4)],
        ..FakeData::default()
    }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let app = app_for(fake.admin_config());

    let live = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(live.status(), StatusCode::OK);

    let ready = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_without_api() {
    let unreachable = Url::parse("http://127.0.0.1:1/api/").unwrap();
    let app = app_for(admin_config_for(unreachable, ADMIN_TOKEN));
    let ready = app
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_dashboard_shows_counters() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Shipping overview"));
    assert!(html.contains("2 without a shipping class"));
}

#[tokio::test]
async fn test_zone_list_renders_zones() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(Request::get("/shipping/zones").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Domestic"));
    assert!(html.contains("Europe"));
}

#[tokio::test]
async fn test_bulk_assign_form_redirects_on_success() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(
            Request::post("/shipping/methods/7/zones")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("intent=assign&zone_ids=1&zone_ids=2"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_redirection(), "{}", response.status());
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("/shipping/methods/7?tab=zones"), "{location}");

    let data = fake.data();
    assert!(data.zones.iter().all(|z| z.has_method(MethodId::new(7))));
}

#[tokio::test]
async fn test_bulk_assign_without_selection_rerenders() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(
            Request::post("/shipping/methods/7/zones")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("intent=assign"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Select at least one zone to assign"));
    assert!(fake.data().zones.iter().all(|z| z.methods.is_empty()));
}

#[tokio::test]
async fn test_export_downloads_csv() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(Request::get("/products/export").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let csv = body_text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("name,description,price"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn test_unknown_method_is_not_found_page() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(Request::get("/shipping/methods/99").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cost_preview_renders_charge() {
    let fake = FakeSegishop::spawn(seeded()).await;
    let response = app_for(fake.admin_config())
        .oneshot(
            Request::get("/shipping/costs/40?order_total=80&quantity=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("$4.00"), "{html}");
}

#[tokio::test]
async fn test_cost_preview_survives_huge_order_total() {
    let mut data = seeded();
    if let Some(cost) = data.class_costs.first_mut() {
        cost.cost_type = segishop_core::types::CostType::Percentage;
        cost.cost = rust_decimal::Decimal::from(50);
    }
    let fake = FakeSegishop::spawn(data).await;
    let response = app_for(fake.admin_config())
        .oneshot(
            Request::get("/shipping/costs/40?order_total=79228162514264337593543950335")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("amount too large"));
}

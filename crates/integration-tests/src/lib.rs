//! Integration test harness for Segishop.
//!
//! [`FakeSegishop`] serves the slice of the Segishop REST API the admin
//! console and storefront use, from in-memory data, on an ephemeral port.
//! Tests point the real clients at it and inspect [`FakeData`] afterwards.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p segishop-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use segishop_admin::config::{AdminConfig, ApiConfig};
use segishop_core::cart::{AddToCart, CartItem, UpdateCartItem};
use segishop_core::catalog::{AdminProduct, NewProduct, Product};
use segishop_core::review::ProductReview;
use segishop_core::shipping::{
    ClassCost, ClassCostUpdate, NewClassCost, NewZoneMethod, ShippingMethod, ShippingOverview,
    ShippingZone, ZoneMethod,
};
use segishop_core::types::{
    ClassCostId, ClassId, CostType, MethodId, ProductId, UserId, ZoneId, ZoneMethodId,
};
use segishop_core::upload::UploadPolicy;
use segishop_storefront::config::StorefrontConfig;

/// Token the fake accepts on `/admin` routes.
pub const ADMIN_TOKEN: &str = "sk_test_9fQ2x7LmR4vT8bW1nZ6kJ3hY5pD0cA";

/// Everything the fake API knows. Tests seed it before spawning and read it
/// back afterwards.
#[derive(Debug, Default)]
pub struct FakeData {
    pub zones: Vec<ShippingZone>,
    pub methods: Vec<ShippingMethod>,
    pub admin_products: Vec<AdminProduct>,
    pub class_costs: Vec<ClassCost>,
    /// Products assigned to each shipping class.
    pub class_products: HashMap<ClassId, BTreeSet<ProductId>>,
    /// Every body sent to `POST /class-costs`, in order.
    pub cost_creates: Vec<Value>,
    /// Every body sent to `PUT /class-costs/{id}`, in order.
    pub cost_updates: Vec<Value>,
    /// Storefront view of the catalog.
    pub products: Vec<Product>,
    /// Approved reviews per product.
    pub reviews: HashMap<ProductId, Vec<ProductReview>>,
    /// Reviews waiting for moderation.
    pub pending_reviews: Vec<ProductReview>,
    pub carts: HashMap<UserId, Vec<CartItem>>,
    /// Zones whose zone-method requests fail with a 500.
    pub failing_zones: Vec<ZoneId>,
    /// Product names the create endpoint rejects.
    pub rejected_product_names: Vec<String>,
    /// Rates served at `/rates`; empty serves a 503.
    pub rates: HashMap<String, f64>,
    pub next_id: i32,
}

impl FakeData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        1000 + self.next_id
    }
}

type Shared = Arc<Mutex<FakeData>>;

/// A running fake API.
#[derive(Debug, Clone)]
pub struct FakeSegishop {
    data: Shared,
    addr: SocketAddr,
}

impl FakeSegishop {
    /// Serve `data` on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn(data: FakeData) -> Self {
        let data = Arc::new(Mutex::new(data));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake API");
        let addr = listener.local_addr().expect("fake API address");
        let app = router(Arc::clone(&data));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake API server");
        });
        Self { data, addr }
    }

    /// API root, as `SEGISHOP_API_URL` would hold it.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn api_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/", self.addr)).expect("fake API URL")
    }

    /// Exchange-rate endpoint.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn rates_url(&self) -> Url {
        Url::parse(&format!("http://{}/rates", self.addr)).expect("fake rates URL")
    }

    /// Lock the fake's data for inspection or changes.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    pub fn data(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().expect("fake data lock")
    }

    /// Admin configuration aimed at this fake.
    #[must_use]
    pub fn admin_config(&self) -> AdminConfig {
        admin_config_for(self.api_url(), ADMIN_TOKEN)
    }

    /// Storefront configuration aimed at this fake, including its rates.
    ///
    /// # Panics
    ///
    /// Never in practice; the API URL is always valid.
    #[must_use]
    pub fn storefront_config(&self) -> StorefrontConfig {
        let mut config =
            StorefrontConfig::for_api(self.api_url().as_str()).expect("storefront config");
        config.exchange_rate_url = self.rates_url();
        config
    }
}

/// Admin configuration for an arbitrary API root and token.
#[must_use]
pub fn admin_config_for(base_url: Url, token: &str) -> AdminConfig {
    AdminConfig {
        api: ApiConfig {
            base_url,
            admin_token: SecretString::from(token.to_string()),
            timeout: std::time::Duration::from_secs(5),
        },
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3001,
        base_url: "http://127.0.0.1:3001".to_string(),
        upload: UploadPolicy::default(),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

// =============================================================================
// Seed data
// =============================================================================

/// A zone with no methods.
///
/// # Panics
///
/// Never; the literal is a valid zone.
#[must_use]
pub fn zone(id: i32, name: &str) -> ShippingZone {
    serde_json::from_value(json!({ "id": id, "name": name, "isEnabled": true }))
        .expect("zone fixture")
}

/// An enabled flat-rate method.
///
/// # Panics
///
/// Never; the literal is a valid method.
#[must_use]
pub fn method(id: i32, name: &str) -> ShippingMethod {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "methodType": "FlatRate",
        "isEnabled": true,
    }))
    .expect("method fixture")
}

/// A storefront product.
///
/// # Panics
///
/// Never; the literal is a valid product.
#[must_use]
pub fn product(id: i32, name: &str, price: f64, sale_price: Option<f64>) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "price": price,
        "salePrice": sale_price,
        "stock": 25,
        "categoryId": 1,
        "categoryName": "Pantry",
        "isActive": true,
    }))
    .expect("product fixture")
}

/// An admin catalog row.
///
/// # Panics
///
/// Never; the literal is a valid product.
#[must_use]
pub fn admin_product(id: i32, name: &str) -> AdminProduct {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "price": 9.5,
        "stock": 12,
        "categoryId": 1,
        "categoryName": "Pantry",
        "isActive": true,
    }))
    .expect("admin product fixture")
}

/// A class cost row for `(zone_method, class)`.
#[must_use]
pub fn class_cost(id: i32, zone_method: i32, class: i32, cost: i64) -> ClassCost {
    ClassCost {
        id: ClassCostId::new(id),
        shipping_zone_method_id: ZoneMethodId::new(zone_method),
        shipping_class_id: ClassId::new(class),
        shipping_zone_name: "Domestic".to_string(),
        shipping_method_name: "Standard Post".to_string(),
        shipping_class_name: "Bulky".to_string(),
        cost: Decimal::from(cost),
        cost_type: CostType::Fixed,
    }
}

/// An approved review.
///
/// # Panics
///
/// Never; the literal is a valid review.
#[must_use]
pub fn review(id: i32, product_id: i32, rating: u8, name: &str) -> ProductReview {
    serde_json::from_value(json!({
        "id": id,
        "productId": product_id,
        "reviewerName": name,
        "rating": rating,
        "reviewText": "Exactly as described, would buy again.",
        "isApproved": true,
    }))
    .expect("review fixture")
}

// =============================================================================
// Router
// =============================================================================

fn router(data: Shared) -> Router {
    Router::new()
        .route("/api/admin/shipping/overview", get(overview))
        .route("/api/admin/shipping/zones", get(list_zones))
        .route("/api/admin/shipping/methods", get(list_methods))
        .route("/api/admin/shipping/methods/{id}", get(get_method))
        .route("/api/admin/shipping/zones/{id}/methods", post(add_zone_method))
        .route(
            "/api/admin/shipping/zones/{zone}/methods/{method}",
            delete(remove_zone_method),
        )
        .route(
            "/api/admin/shipping/class-costs",
            get(list_class_costs).post(create_class_cost),
        )
        .route("/api/admin/shipping/class-costs/{id}", put(update_class_cost))
        .route(
            "/api/admin/shipping/classes/{id}/products",
            get(class_products).post(assign_products).delete(remove_products),
        )
        .route("/api/admin/shipping/products/unassigned", get(unassigned_products))
        .route("/api/admin/products", get(list_admin_products).post(create_product))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/products/{id}/reviews", get(list_reviews).post(submit_review))
        .route("/api/cart/{user}", get(get_cart))
        .route("/api/cart/{user}/items", post(add_cart_item))
        .route(
            "/api/cart/{user}/items/{item}",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/rates", get(rates))
        .with_state(data)
}

fn lock(data: &Shared) -> MutexGuard<'_, FakeData> {
    data.lock().expect("fake data lock")
}

fn ok(mut body: Value) -> Response {
    if let Some(map) = body.as_object_mut() {
        map.insert("success".to_string(), Value::Bool(true));
    }
    Json(body).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ADMIN_TOKEN}"))
}

fn paging(query: &HashMap<String, String>) -> (usize, usize) {
    let page = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1usize).max(1);
    let size = query
        .get("pageSize")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10usize)
        .max(1);
    (page, size)
}

fn slice<T: Clone>(items: &[T], page: usize, size: usize) -> Vec<T> {
    items.iter().skip((page - 1) * size).take(size).cloned().collect()
}

// --- admin shipping ---

async fn overview(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let data = lock(&data);
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    let overview = ShippingOverview {
        total_zones: count(data.zones.len()),
        active_zones: count(data.zones.iter().filter(|z| z.is_enabled).count()),
        total_methods: count(data.methods.len()),
        active_methods: count(data.methods.iter().filter(|m| m.is_enabled).count()),
        total_classes: 0,
        total_class_costs: 0,
        products_with_shipping_class: 0,
        products_without_shipping_class: count(data.admin_products.len()),
    };
    ok(serde_json::to_value(overview).unwrap_or_default())
}

async fn list_zones(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let zones = lock(&data).zones.clone();
    ok(json!({ "zones": zones }))
}

async fn list_methods(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let methods = lock(&data).methods.clone();
    ok(json!({ "methods": methods }))
}

async fn get_method(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<MethodId>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let found = lock(&data).methods.iter().find(|m| m.id == id).cloned();
    match found {
        Some(method) => ok(json!({ "method": method })),
        None => fail(StatusCode::NOT_FOUND, "Shipping method not found"),
    }
}

async fn add_zone_method(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(zone_id): Path<ZoneId>,
    Json(input): Json<NewZoneMethod>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut data = lock(&data);
    if data.failing_zones.contains(&zone_id) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Zone is locked");
    }
    let id = data.next_id();
    let Some(zone) = data.zones.iter_mut().find(|z| z.id == zone_id) else {
        return fail(StatusCode::NOT_FOUND, "Shipping zone not found");
    };
    if zone.has_method(input.shipping_method_id) {
        return fail(StatusCode::BAD_REQUEST, "Method already assigned to this zone");
    }
    zone.methods.push(ZoneMethod {
        id: ZoneMethodId::new(id),
        shipping_method_id: input.shipping_method_id,
        shipping_method_name: input.title.clone(),
        title: input.title,
        is_enabled: input.is_enabled,
        sort_order: input.sort_order,
        base_cost: input.base_cost,
        min_order_amount: input.min_order_amount,
        max_order_amount: None,
        estimated_days_min: input.estimated_days_min,
        estimated_days_max: input.estimated_days_max,
        class_costs: Vec::new(),
    });
    zone.method_count = u32::try_from(zone.methods.len()).unwrap_or(u32::MAX);
    ok(json!({ "message": "Zone method created" }))
}

async fn remove_zone_method(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path((zone_id, method_id)): Path<(ZoneId, MethodId)>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut data = lock(&data);
    if data.failing_zones.contains(&zone_id) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Zone is locked");
    }
    let Some(zone) = data.zones.iter_mut().find(|z| z.id == zone_id) else {
        return fail(StatusCode::NOT_FOUND, "Shipping zone not found");
    };
    zone.methods.retain(|m| m.shipping_method_id != method_id);
    zone.method_count = u32::try_from(zone.methods.len()).unwrap_or(u32::MAX);
    ok(json!({ "message": "Zone method removed" }))
}

// --- class costs ---

fn id_param<T: std::str::FromStr>(query: &HashMap<String, String>, key: &str) -> Option<T> {
    query.get(key).and_then(|v| v.parse().ok())
}

async fn list_class_costs(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let class_id: Option<ClassId> = id_param(&query, "shippingClassId");
    let costs: Vec<ClassCost> = lock(&data)
        .class_costs
        .iter()
        .filter(|c| class_id.is_none_or(|id| c.shipping_class_id == id))
        .cloned()
        .collect();
    ok(json!({ "costs": costs }))
}

async fn create_class_cost(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut data = lock(&data);
    data.cost_creates.push(body.clone());
    let input: NewClassCost = match serde_json::from_value(body) {
        Ok(input) => input,
        Err(e) => return fail(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    if data.class_costs.iter().any(|c| c.key() == input.key()) {
        return fail(
            StatusCode::BAD_REQUEST,
            "A cost already exists for this shipping class and zone method combination",
        );
    }
    let id = ClassCostId::new(data.next_id());
    data.class_costs.push(ClassCost {
        id,
        shipping_zone_method_id: input.shipping_zone_method_id,
        shipping_class_id: input.shipping_class_id,
        shipping_zone_name: String::new(),
        shipping_method_name: String::new(),
        shipping_class_name: String::new(),
        cost: input.cost,
        cost_type: input.cost_type,
    });
    ok(json!({ "id": id }))
}

async fn update_class_cost(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<ClassCostId>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut data = lock(&data);
    data.cost_updates.push(body.clone());
    let update: ClassCostUpdate = match serde_json::from_value(body) {
        Ok(update) => update,
        Err(e) => return fail(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    let Some(cost) = data.class_costs.iter_mut().find(|c| c.id == id) else {
        return fail(StatusCode::NOT_FOUND, "Shipping class cost not found");
    };
    cost.cost = update.cost;
    cost.cost_type = update.cost_type;
    ok(json!({ "message": "Shipping class cost updated" }))
}

// --- class products ---

fn product_page(products: &[AdminProduct], query: &HashMap<String, String>) -> Response {
    let (page, size) = paging(query);
    let term = query
        .get("search")
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    let matching: Vec<AdminProduct> = products
        .iter()
        .filter(|p| term.as_ref().is_none_or(|t| p.name.to_lowercase().contains(t)))
        .cloned()
        .collect();
    ok(json!({
        "products": slice(&matching, page, size),
        "totalCount": matching.len(),
        "page": page,
        "pageSize": size,
    }))
}

fn product_ids(body: &Value) -> Vec<ProductId> {
    body.get("productIds")
        .cloned()
        .and_then(|ids| serde_json::from_value(ids).ok())
        .unwrap_or_default()
}

async fn class_products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(class_id): Path<ClassId>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let data = lock(&data);
    let assigned = data.class_products.get(&class_id).cloned().unwrap_or_default();
    let products: Vec<AdminProduct> = data
        .admin_products
        .iter()
        .filter(|p| assigned.contains(&p.id))
        .cloned()
        .collect();
    product_page(&products, &query)
}

async fn unassigned_products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let data = lock(&data);
    let products: Vec<AdminProduct> = data
        .admin_products
        .iter()
        .filter(|p| !data.class_products.values().any(|ids| ids.contains(&p.id)))
        .cloned()
        .collect();
    product_page(&products, &query)
}

async fn assign_products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(class_id): Path<ClassId>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let ids = product_ids(&body);
    let mut data = lock(&data);
    // A product has one class at a time
    for assigned in data.class_products.values_mut() {
        assigned.retain(|id| !ids.contains(id));
    }
    data.class_products.entry(class_id).or_default().extend(ids);
    ok(json!({ "message": "Products assigned" }))
}

async fn remove_products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(class_id): Path<ClassId>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let ids = product_ids(&body);
    if let Some(assigned) = lock(&data).class_products.get_mut(&class_id) {
        assigned.retain(|id| !ids.contains(id));
    }
    ok(json!({ "message": "Products removed" }))
}

// --- admin catalog ---

async fn list_admin_products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let (page, size) = paging(&query);
    let data = lock(&data);
    let term = query.get("searchTerm").map(|t| t.to_lowercase());
    let matching: Vec<AdminProduct> = data
        .admin_products
        .iter()
        .filter(|p| term.as_ref().is_none_or(|t| p.name.to_lowercase().contains(t)))
        .cloned()
        .collect();
    ok(json!({
        "products": slice(&matching, page, size),
        "totalCount": matching.len(),
        "page": page,
        "pageSize": size,
    }))
}

async fn create_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<NewProduct>,
) -> Response {
    if !authorized(&headers) {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut data = lock(&data);
    if data.rejected_product_names.contains(&input.name) {
        return fail(StatusCode::BAD_REQUEST, "A product with this name already exists");
    }
    let id = data.next_id();
    let created = AdminProduct {
        id: ProductId::new(id),
        name: input.name,
        description: input.description,
        price: input.price,
        sale_price: input.sale_price,
        sku: input.sku,
        stock: input.stock,
        image_url: input.image_url,
        category_id: input.category_id,
        category_name: String::new(),
        is_active: input.is_active,
        is_featured: input.is_featured,
        created_at: None,
        updated_at: None,
        meta_title: input.meta_title,
        meta_description: input.meta_description,
        slug: input.slug,
        images: Vec::new(),
    };
    data.admin_products.push(created.clone());
    ok(json!({ "product": created }))
}

// --- storefront catalog ---

async fn list_products(
    State(data): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let (page, size) = paging(&query);
    let data = lock(&data);
    let term = query.get("searchTerm").map(|t| t.to_lowercase());
    let category = query.get("categoryId").cloned();
    let matching: Vec<Product> = data
        .products
        .iter()
        .filter(|p| term.as_ref().is_none_or(|t| p.name.to_lowercase().contains(t)))
        .filter(|p| {
            category
                .as_ref()
                .is_none_or(|c| p.category_id.is_some_and(|id| id.to_string() == *c))
        })
        .cloned()
        .collect();
    ok(json!({
        "products": slice(&matching, page, size),
        "totalCount": matching.len(),
        "page": page,
        "pageSize": size,
    }))
}

async fn get_product(State(data): State<Shared>, Path(id): Path<ProductId>) -> Response {
    let found = lock(&data).products.iter().find(|p| p.id == id).cloned();
    match found {
        Some(product) => ok(json!({ "product": product })),
        None => fail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn list_reviews(
    State(data): State<Shared>,
    Path(id): Path<ProductId>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let (page, size) = paging(&query);
    let data = lock(&data);
    let reviews = data.reviews.get(&id).cloned().unwrap_or_default();
    let total = reviews.len();
    let mut distribution: HashMap<String, usize> = HashMap::new();
    for r in &reviews {
        *distribution.entry(r.rating.to_string()).or_default() += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let average = if total == 0 {
        0.0
    } else {
        reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / total as f64
    };
    let total_pages = total.div_ceil(size);
    Json(json!({
        "reviews": slice(&reviews, page, size),
        "stats": {
            "averageRating": average,
            "totalReviews": total,
            "ratingDistribution": distribution,
        },
        "page": page,
        "pageSize": size,
        "totalPages": total_pages,
        "totalCount": total,
        "hasNextPage": page < total_pages,
        "hasPreviousPage": page > 1,
    }))
    .into_response()
}

async fn submit_review(
    State(data): State<Shared>,
    Path(id): Path<ProductId>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = lock(&data);
    let review_id = data.next_id();
    let mut review = body;
    if let Some(map) = review.as_object_mut() {
        map.insert("id".to_string(), json!(review_id));
        map.insert("productId".to_string(), json!(id));
        map.insert("isApproved".to_string(), json!(false));
    }
    match serde_json::from_value::<ProductReview>(review) {
        Ok(parsed) => {
            data.pending_reviews.push(parsed.clone());
            ok(serde_json::to_value(parsed).unwrap_or_default())
        }
        Err(e) => fail(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

// --- customer carts ---

fn cart_body(items: &[CartItem]) -> Value {
    let total_items: u32 = items.iter().map(|i| i.quantity).sum();
    let subtotal: Decimal = items.iter().map(|i| i.total_price).sum();
    json!({
        "cart": {
            "items": items,
            "totalItems": total_items,
            "subtotal": subtotal.to_f64().unwrap_or_default(),
            "uniqueItemsCount": items.len(),
        }
    })
}

async fn get_cart(State(data): State<Shared>, Path(user): Path<UserId>) -> Response {
    let items = lock(&data).carts.get(&user).cloned().unwrap_or_default();
    ok(cart_body(&items))
}

async fn add_cart_item(
    State(data): State<Shared>,
    Path(user): Path<UserId>,
    Json(input): Json<AddToCart>,
) -> Response {
    let mut data = lock(&data);
    let Some(product) = data.products.iter().find(|p| p.id == input.product_id).cloned() else {
        return fail(StatusCode::BAD_REQUEST, "Product is not available");
    };
    let each = input.calculated_price.unwrap_or_else(|| product.current_price());
    let id = data.next_id();
    let cart = data.carts.entry(user).or_default();
    let item = if let Some(existing) = cart
        .iter_mut()
        .find(|i| i.product_id == input.product_id && i.product_attributes == input.product_attributes)
    {
        existing.quantity += input.quantity;
        existing.total_price = each * Decimal::from(existing.quantity);
        existing.clone()
    } else {
        let item = CartItem {
            id,
            product_id: product.id,
            product_name: product.name.clone(),
            product_slug: String::new(),
            product_price: Some(each),
            product_image: product.image_url.clone(),
            product_attributes: input.product_attributes,
            quantity: input.quantity,
            total_price: each * Decimal::from(input.quantity),
            is_in_stock: true,
            stock_quantity: product.stock,
            created_at: None,
            updated_at: None,
        };
        cart.push(item.clone());
        item
    };
    ok(json!({ "cartItem": item }))
}

async fn update_cart_item(
    State(data): State<Shared>,
    Path((user, item_id)): Path<(UserId, i32)>,
    Json(input): Json<UpdateCartItem>,
) -> Response {
    let mut data = lock(&data);
    let Some(item) = data
        .carts
        .get_mut(&user)
        .and_then(|cart| cart.iter_mut().find(|i| i.id == item_id))
    else {
        return fail(StatusCode::NOT_FOUND, "Cart item not found");
    };
    let each = item.product_price.unwrap_or_default();
    item.quantity = input.quantity;
    item.total_price = each * Decimal::from(input.quantity);
    let item = item.clone();
    ok(json!({ "cartItem": item }))
}

async fn remove_cart_item(
    State(data): State<Shared>,
    Path((user, item_id)): Path<(UserId, i32)>,
) -> Response {
    let mut data = lock(&data);
    let cart = data.carts.entry(user).or_default();
    let before = cart.len();
    cart.retain(|i| i.id != item_id);
    if cart.len() == before {
        return fail(StatusCode::NOT_FOUND, "Cart item not found");
    }
    let items = cart.clone();
    ok(cart_body(&items))
}

// --- exchange rates ---

async fn rates(State(data): State<Shared>) -> Response {
    let rates = lock(&data).rates.clone();
    if rates.is_empty() {
        return fail(StatusCode::SERVICE_UNAVAILABLE, "Rates unavailable");
    }
    Json(json!({ "base": "USD", "rates": rates })).into_response()
}

//! Admin client and services against the fake Segishop API.

#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use segishop_admin::api::{ApiError, CatalogApi, SegishopClient, ShippingApi};
use segishop_admin::services::{
    ClassCostFormService, CostFormError, CostFormInput, ListQuery, ProductAssignmentService,
    ProductImportService, ZoneAssignmentService,
};
use segishop_core::catalog::ProductSummary;
use segishop_core::shipping::{Selection, ShippingClass, ShippingRuleError};
use segishop_core::types::{
    ClassCostId, ClassId, CostType, MethodId, Page, ProductId, ZoneId, ZoneMethodId,
};
use segishop_integration_tests::{
    FakeData, FakeSegishop, admin_config_for, admin_product, class_cost, method, zone,
};

fn client(fake: &FakeSegishop) -> SegishopClient {
    SegishopClient::new(&fake.admin_config().api).unwrap()
}

fn shipping_data() -> FakeData {
    FakeData {
        zones: vec![zone(1, "Domestic"), zone(2, "Europe"), zone(3, "Asia")],
        methods: vec![method(7, "Standard Post")],
        ..FakeData::default()
    }
}

// =============================================================================
// Client basics
// =============================================================================

#[tokio::test]
async fn test_overview_counts() {
    let fake = FakeSegishop::spawn(shipping_data()).await;
    let overview = client(&fake).overview().await.unwrap();
    assert_eq!(overview.total_zones, 3);
    assert_eq!(overview.active_methods, 1);
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let fake = FakeSegishop::spawn(shipping_data()).await;
    let config = admin_config_for(fake.api_url(), "sk_test_wrong_but_long_enough_value_123");
    let client = SegishopClient::new(&config.api).unwrap();
    assert!(matches!(
        client.list_zones().await.unwrap_err(),
        ApiError::Unauthorized
    ));
}

#[tokio::test]
async fn test_missing_method_is_not_found() {
    let fake = FakeSegishop::spawn(shipping_data()).await;
    let err = client(&fake).get_method(MethodId::new(99)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// =============================================================================
// Zone assignment
// =============================================================================

#[tokio::test]
async fn test_assign_method_to_selected_zones() {
    let fake = FakeSegishop::spawn(shipping_data()).await;
    let api = client(&fake);
    let service = ZoneAssignmentService::new(&api);
    let method = api.get_method(MethodId::new(7)).await.unwrap();

    let partition = service.partition(&method).await.unwrap();
    assert_eq!(partition.available.len(), 3);

    let selection: Selection<ZoneId> = [ZoneId::new(1), ZoneId::new(3)].into_iter().collect();
    let outcome = service.assign(&method, &partition, &selection).await;

    assert!(outcome.clears_selection());
    assert_eq!(
        outcome.success_message.as_deref(),
        Some("Successfully assigned Standard Post to 2 zone(s)")
    );
    let data = fake.data();
    let assigned: Vec<_> = data
        .zones
        .iter()
        .filter(|z| z.has_method(method.id))
        .map(|z| z.name.as_str())
        .collect();
    assert_eq!(assigned, vec!["Domestic", "Asia"]);
}

#[tokio::test]
async fn test_partial_failure_keeps_successes() {
    let mut data = shipping_data();
    data.failing_zones.push(ZoneId::new(2));
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);
    let service = ZoneAssignmentService::new(&api);
    let method = api.get_method(MethodId::new(7)).await.unwrap();
    let partition = service.partition(&method).await.unwrap();

    let all: Selection<ZoneId> = partition.available.iter().map(|z| z.id).collect();
    let outcome = service.assign(&method, &partition, &all).await;

    assert!(!outcome.clears_selection());
    assert_eq!(outcome.report.success_count(), 2);
    assert_eq!(outcome.report.failure_count(), 1);
    let error = outcome.error_message.unwrap();
    assert!(error.contains("Europe"), "{error}");
    assert!(outcome.success_message.is_none());

    // The two zones that worked stay assigned
    let assigned = fake
        .data()
        .zones
        .iter()
        .filter(|z| z.has_method(method.id))
        .count();
    assert_eq!(assigned, 2);
}

#[tokio::test]
async fn test_remove_only_touches_assigned_zones() {
    let fake = FakeSegishop::spawn(shipping_data()).await;
    let api = client(&fake);
    let service = ZoneAssignmentService::new(&api);
    let method = api.get_method(MethodId::new(7)).await.unwrap();

    let partition = service.partition(&method).await.unwrap();
    let first: Selection<ZoneId> = [ZoneId::new(1)].into_iter().collect();
    service.assign(&method, &partition, &first).await;

    let partition = service.partition(&method).await.unwrap();
    assert_eq!(partition.assigned.len(), 1);

    // Zone 2 was never assigned, so only zone 1 is removed
    let selection: Selection<ZoneId> = [ZoneId::new(1), ZoneId::new(2)].into_iter().collect();
    let outcome = service.remove(&method, &partition, &selection).await;
    assert_eq!(outcome.report.items.len(), 1);
    assert!(outcome.clears_selection());
    assert!(fake.data().zones.iter().all(|z| !z.has_method(method.id)));
}

// =============================================================================
// Catalog import and export
// =============================================================================

const IMPORT_CSV: &str = "\
name,description,price,salePrice,sku,stock,categoryId,isActive,isFeatured
Mango Chutney,Sweet and hot,6.50,,MC-1,12,1,true,false
Lime Pickle,Sharp,-2,,LP-1,3,1,true,false
Tamarind Paste,Sour,4.00,,TP-1,8,1,true,false
";

#[tokio::test]
async fn test_import_reports_rejected_and_invalid_rows() {
    let mut data = FakeData::default();
    data.rejected_product_names.push("Tamarind Paste".to_string());
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);

    let report = ProductImportService::new(&api)
        .import(Cursor::new(IMPORT_CSV))
        .await
        .unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.error_count, 2);
    let rows: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
    assert!(rows.contains(&3), "invalid price row: {rows:?}");
    assert!(rows.contains(&4), "API-rejected row: {rows:?}");

    let names: Vec<String> = fake
        .data()
        .admin_products
        .iter()
        .map(|p| p.name.clone())
        .collect();
    assert_eq!(names, vec!["Mango Chutney".to_string()]);
}

#[tokio::test]
async fn test_fetch_all_walks_every_page() {
    let data = FakeData {
        admin_products: (1..=230).map(|i| admin_product(i, &format!("Product {i}"))).collect(),
        ..FakeData::default()
    };
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);

    let products = ProductImportService::new(&api).fetch_all().await.unwrap();
    assert_eq!(products.len(), 230);
    assert_eq!(products.last().unwrap().name, "Product 230");
}

#[tokio::test]
async fn test_create_product_round_trip() {
    let fake = FakeSegishop::spawn(FakeData::default()).await;
    let api = client(&fake);
    let parsed = segishop_core::import::parse_products(Cursor::new(IMPORT_CSV)).unwrap();
    let first = &parsed.valid.first().unwrap().product;

    let created = api.create_product(first).await.unwrap();
    assert_eq!(created.name, "Mango Chutney");
    assert!(created.id.is_set());
}

// =============================================================================
// Product to class assignment
// =============================================================================

fn bulky() -> ShippingClass {
    serde_json::from_value(serde_json::json!({ "id": 3, "name": "Bulky", "slug": "bulky" }))
        .unwrap()
}

fn names(page: &Page<ProductSummary>) -> Vec<&str> {
    page.items.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn test_assign_and_remove_products_moves_between_lists() {
    let data = FakeData {
        admin_products: vec![
            admin_product(1, "Mango Chutney"),
            admin_product(2, "Lime Pickle"),
            admin_product(3, "Tamarind Paste"),
        ],
        ..FakeData::default()
    };
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);
    let service = ProductAssignmentService::new(&api);
    let class = bulky();
    let first = ListQuery::default();

    let lists = service.load(class.id, &first, &first).await.unwrap();
    assert!(lists.assigned.items.is_empty());
    assert_eq!(lists.unassigned.items.len(), 3);

    let selection: Selection<ProductId> = [ProductId::new(1), ProductId::new(3)].into_iter().collect();
    let message = service.assign(&class, &selection).await.unwrap();
    assert_eq!(message, "Successfully assigned 2 products to Bulky");

    let lists = service.load(class.id, &first, &first).await.unwrap();
    assert_eq!(names(&lists.assigned), vec!["Mango Chutney", "Tamarind Paste"]);
    assert_eq!(names(&lists.unassigned), vec!["Lime Pickle"]);

    // Assigning the same ids again changes nothing
    service.assign(&class, &selection).await.unwrap();
    let again = service.load(class.id, &first, &first).await.unwrap();
    assert_eq!(again.assigned.items.len(), 2);
    assert_eq!(again.unassigned.items.len(), 1);

    service.remove(&class, &selection).await.unwrap();
    let lists = service.load(class.id, &first, &first).await.unwrap();
    assert!(lists.assigned.items.is_empty());
    assert_eq!(lists.unassigned.items.len(), 3);
}

#[tokio::test]
async fn test_product_lists_search_independently() {
    let data = FakeData {
        admin_products: vec![admin_product(1, "Mango Chutney"), admin_product(2, "Lime Pickle")],
        ..FakeData::default()
    };
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);
    let service = ProductAssignmentService::new(&api);
    let class = bulky();

    let lime = ListQuery {
        page: 1,
        search: Some("lime".to_string()),
    };
    let lists = service.load(class.id, &ListQuery::default(), &lime).await.unwrap();
    assert_eq!(names(&lists.unassigned), vec!["Lime Pickle"]);
    assert!(lists.assigned.items.is_empty());
}

// =============================================================================
// Class costs
// =============================================================================

fn cost_input(zone_method: i32, class: i32, cost: &str) -> CostFormInput {
    CostFormInput {
        zone_id: Some(ZoneId::new(1)),
        loaded_zone_id: Some(ZoneId::new(1)),
        zone_method_id: Some(ZoneMethodId::new(zone_method)),
        class_id: Some(ClassId::new(class)),
        cost: cost.to_string(),
        cost_type: CostType::PerItem,
    }
}

#[tokio::test]
async fn test_create_cost_for_free_key() {
    let fake = FakeSegishop::spawn(FakeData::default()).await;
    let api = client(&fake);

    let id = ClassCostFormService::new(&api)
        .create(&cost_input(5, 3, "2.50"))
        .await
        .unwrap();
    assert!(id.is_some_and(|id| id.is_set()));

    let data = fake.data();
    let created = data.class_costs.first().unwrap();
    assert_eq!(created.shipping_zone_method_id, ZoneMethodId::new(5));
    assert_eq!(created.cost_type, CostType::PerItem);
}

#[tokio::test]
async fn test_duplicate_cost_key_is_rejected_before_post() {
    let data = FakeData {
        class_costs: vec![class_cost(40, 5, 3, 4)],
        ..FakeData::default()
    };
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);

    let err = ClassCostFormService::new(&api)
        .create(&cost_input(5, 3, "2.50"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, CostFormError::Rule(ShippingRuleError::DuplicateCostKey(_))),
        "{err:?}"
    );

    let data = fake.data();
    assert!(data.cost_creates.is_empty());
    assert_eq!(data.class_costs.len(), 1);
}

#[tokio::test]
async fn test_update_cost_sends_only_amount_and_type() {
    let data = FakeData {
        class_costs: vec![class_cost(40, 5, 3, 4)],
        ..FakeData::default()
    };
    let fake = FakeSegishop::spawn(data).await;
    let api = client(&fake);

    // Key fields in the input point elsewhere and must not travel
    ClassCostFormService::new(&api)
        .update(ClassCostId::new(40), &cost_input(99, 98, "7"))
        .await
        .unwrap();

    let data = fake.data();
    let body = data.cost_updates.first().unwrap().as_object().unwrap();
    let mut keys: Vec<&str> = body.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["cost", "costType"]);

    let cost = data.class_costs.first().unwrap();
    assert_eq!(cost.shipping_zone_method_id, ZoneMethodId::new(5));
    assert_eq!(cost.shipping_class_id, ClassId::new(3));
    assert_eq!(cost.cost, rust_decimal::Decimal::from(7));
    assert_eq!(cost.cost_type, CostType::PerItem);
}

//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                   - Dashboard (shipping overview)
//!
//! # Shipping zones
//! GET  /shipping/zones                     - Zone list
//! GET  /shipping/zones/new                 - New zone form
//! POST /shipping/zones                     - Create zone
//! GET  /shipping/zones/{id}?tab=           - Zone detail (overview, regions, methods)
//! GET  /shipping/zones/{id}/edit           - Edit zone form
//! POST /shipping/zones/{id}                - Update zone
//! GET  /shipping/zones/{id}/delete         - Confirm delete
//! POST /shipping/zones/{id}/delete         - Delete zone
//! POST /shipping/zones/{id}/regions        - Add region
//! GET  /shipping/zones/{id}/regions/{rid}/delete - Confirm region removal
//! POST /shipping/zones/{id}/regions/{rid}/delete - Remove region
//! POST /shipping/zones/{id}/methods        - Add zone method
//! GET  /shipping/zones/{id}/methods/{mid}/delete - Confirm zone method removal
//! POST /shipping/zones/{id}/methods/{mid}/delete - Remove zone method
//!
//! # Shipping methods
//! GET  /shipping/methods ... (same list/new/detail/edit/delete set)
//! POST /shipping/methods/{id}/zones        - Bulk assign/remove zones, select all
//!
//! # Shipping classes
//! GET  /shipping/classes ... (same list/new/detail/edit/delete set)
//! POST /shipping/classes/{id}/products     - Assign/remove selected products
//!
//! # Class costs
//! GET  /shipping/costs ... (same list/new/detail/edit/delete set)
//!
//! # Products
//! GET  /products                           - Product list with filters
//! POST /products/bulk-status               - Activate/deactivate selected
//! GET  /products/new                       - New product form
//! POST /products                           - Create product (multipart)
//! GET  /products/import                    - CSV import form
//! POST /products/import                    - Run CSV import
//! GET  /products/export                    - CSV export of every product
//! GET  /products/import/template           - CSV import template
//! ```

pub mod dashboard;
pub mod products;
pub mod shipping;

use askama::Template;
use axum::{Router, response::Html, routing::get};

use crate::state::AppState;

/// Create all routes for the admin console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/shipping", shipping::routes())
        .nest("/products", products::routes())
}

/// Render a template, logging render failures.
pub(crate) fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

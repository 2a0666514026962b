//! Shipping class cost screens.
//!
//! The create form cascades without JavaScript: picking a zone and pressing
//! "Load methods" re-renders the form through `GET /shipping/costs/new` with
//! the zone's methods filled in.

use std::str::FromStr;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, Query as ListQuery};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use segishop_core::shipping::{ClassCost, ShippingClass, ShippingZone};
use segishop_core::types::{ClassCostId, ClassId, CostType, ZoneId, ZoneMethodId};

use crate::api::ApiError;
use crate::components::{Notice, NoticeKind, NoticeQuery, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::routes::render;
use crate::services::{ClassCostFormService, CostForm, CostFormInput};
use crate::state::AppState;

use super::confirm_page;

const CURRENT_PATH: &str = "/shipping/costs";

/// Filters on the cost list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostFilter {
    pub class_id: Option<ClassId>,
    pub zone_id: Option<ZoneId>,
}

/// Sample order used to preview what a cost charges.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewQuery {
    pub order_total: Option<String>,
    pub quantity: Option<String>,
}

impl PreviewQuery {
    fn order_total(&self) -> Decimal {
        self.order_total
            .as_deref()
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .filter(|v| !v.is_sign_negative())
            .unwrap_or_else(|| Decimal::new(100, 0))
    }

    fn quantity(&self) -> u32 {
        self.quantity
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cost list template.
#[derive(Template)]
#[template(path = "shipping/costs/index.html")]
pub struct CostsIndexTemplate {
    pub current_path: String,
    pub costs: Vec<ClassCost>,
    pub zones: Vec<ShippingZone>,
    pub classes: Vec<ShippingClass>,
    pub filter: CostFilter,
    pub notices: Vec<Notice>,
    pub load_error: Option<String>,
}

impl CostsIndexTemplate {
    fn zone_filtered(&self, zone: &ShippingZone) -> bool {
        self.filter.zone_id == Some(zone.id)
    }

    fn class_filtered(&self, class: &ShippingClass) -> bool {
        self.filter.class_id == Some(class.id)
    }
}

/// Cost detail template.
#[derive(Template)]
#[template(path = "shipping/costs/show.html")]
pub struct CostShowTemplate {
    pub current_path: String,
    pub cost: ClassCost,
    pub notices: Vec<Notice>,
    pub order_total: Decimal,
    pub quantity: u32,
    /// `None` when the sample order overflows the amount range.
    pub charge: Option<Decimal>,
}

/// Cost create/edit form template.
#[derive(Template)]
#[template(path = "shipping/costs/form.html")]
pub struct CostFormTemplate {
    pub current_path: String,
    pub form: CostForm,
    pub cost_types: &'static [CostType],
}

impl CostFormTemplate {
    fn action(&self) -> String {
        self.form
            .existing
            .as_ref()
            .map_or_else(|| CURRENT_PATH.to_string(), |c| format!("{CURRENT_PATH}/{}", c.id))
    }

    fn zone_selected(&self, id: ZoneId) -> bool {
        self.form.input.zone_id == Some(id)
    }

    fn zone_method_selected(&self, id: ZoneMethodId) -> bool {
        self.form.input.zone_method_id == Some(id)
    }

    fn class_selected(&self, id: ClassId) -> bool {
        self.form.input.class_id == Some(id)
    }

    fn cost_type_selected(&self, cost_type: &CostType) -> bool {
        self.form.input.cost_type == *cost_type
    }
}

/// Keep the first failure for the page banner and fall back to an empty list.
fn loaded<T>(result: Result<Vec<T>, ApiError>, what: &str, load_error: &mut Option<String>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::error!("Failed to fetch {what}: {e}");
        load_error.get_or_insert_with(|| e.user_message());
        Vec::new()
    })
}

fn form_page(form: CostForm) -> Html<String> {
    render(&CostFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        form,
        cost_types: &CostType::ALL,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Cost list handler, optionally filtered by class and zone.
#[instrument(skip(state, notices))]
pub async fn index(
    State(state): State<AppState>,
    ListQuery(filter): ListQuery<CostFilter>,
    Query(notices): Query<NoticeQuery>,
) -> Html<String> {
    let filter = CostFilter {
        class_id: filter.class_id.filter(|id| id.is_set()),
        zone_id: filter.zone_id.filter(|id| id.is_set()),
    };
    let api = state.shipping();
    let (costs, zones, classes) = tokio::join!(
        api.list_class_costs(filter.class_id, filter.zone_id),
        api.list_zones(),
        api.list_classes(),
    );

    let mut load_error = None;
    let costs = loaded(costs, "class costs", &mut load_error);
    let zones = loaded(zones, "shipping zones", &mut load_error);
    let classes = loaded(classes, "shipping classes", &mut load_error);

    render(&CostsIndexTemplate {
        current_path: CURRENT_PATH.to_string(),
        costs,
        zones,
        classes,
        filter,
        notices: notices.notices(),
        load_error,
    })
}

/// Cost detail handler with a charge preview.
#[instrument(skip(state, notices))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ClassCostId>,
    Query(preview): Query<PreviewQuery>,
    Query(notices): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let cost = ClassCostFormService::new(state.shipping()).find(id).await?;
    let order_total = preview.order_total();
    let quantity = preview.quantity();
    let charge = cost.cost_type.apply(cost.cost, order_total, quantity);
    Ok(render(&CostShowTemplate {
        current_path: CURRENT_PATH.to_string(),
        cost,
        notices: notices.notices(),
        order_total,
        quantity,
        charge,
    }))
}

/// New cost form handler. Also serves the zone cascade re-render.
#[instrument(skip(state, input))]
pub async fn new_cost(
    State(state): State<AppState>,
    ListQuery(input): ListQuery<CostFormInput>,
) -> Result<Html<String>, AppError> {
    let form = ClassCostFormService::new(state.shipping())
        .create_form(input)
        .await?;
    Ok(form_page(form))
}

/// Create cost handler.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Form(input): Form<CostFormInput>,
) -> Result<Response, AppError> {
    let service = ClassCostFormService::new(state.shipping());
    match service.create(&input.clone().normalized()).await {
        Ok(Some(id)) => Ok(redirect_with(
            &format!("{CURRENT_PATH}/{id}"),
            NoticeKind::Success,
            "Class cost created",
        )
        .into_response()),
        Ok(None) => Ok(redirect_with(CURRENT_PATH, NoticeKind::Success, "Class cost created")
            .into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Class cost not created");
            let form = service.create_form(input).await?.with_error(&e);
            Ok(form_page(form).into_response())
        }
    }
}

/// Edit cost form handler. The key selects render locked.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<ClassCostId>,
) -> Result<Html<String>, AppError> {
    let form = ClassCostFormService::new(state.shipping())
        .edit_form(id)
        .await?;
    Ok(form_page(form))
}

/// Update cost handler. Only cost and cost type are sent; any key fields in
/// the submission are ignored.
#[instrument(skip(state, input))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ClassCostId>,
    Form(input): Form<CostFormInput>,
) -> Result<Response, AppError> {
    let service = ClassCostFormService::new(state.shipping());
    match service.update(id, &input).await {
        Ok(()) => Ok(redirect_with(
            &format!("{CURRENT_PATH}/{id}"),
            NoticeKind::Success,
            "Class cost saved",
        )
        .into_response()),
        Err(e) => {
            tracing::warn!(cost_id = %id, error = %e, "Class cost not updated");
            let mut form = service.edit_form(id).await?;
            form.input.cost = input.cost;
            form.input.cost_type = input.cost_type;
            Ok(form_page(form.with_error(&e)).into_response())
        }
    }
}

/// Delete confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<ClassCostId>,
) -> Result<Html<String>, AppError> {
    let cost = ClassCostFormService::new(state.shipping()).find(id).await?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Delete class cost".to_string(),
        format!(
            "Delete the {} cost for {} on {} / {}?",
            cost.cost_type.describe(cost.cost),
            cost.shipping_class_name,
            cost.shipping_zone_name,
            cost.shipping_method_name
        ),
        format!("{CURRENT_PATH}/{id}/delete"),
        CURRENT_PATH.to_string(),
    ))
}

/// Delete cost handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<ClassCostId>) -> Redirect {
    match state.shipping().delete_class_cost(id).await {
        Ok(ack) => {
            tracing::info!(cost_id = %id, "Shipping class cost deleted");
            let message = ack.message.unwrap_or_else(|| "Class cost deleted".to_string());
            redirect_with(CURRENT_PATH, NoticeKind::Success, &message)
        }
        Err(e) => {
            tracing::error!(cost_id = %id, error = %e, "Failed to delete class cost");
            redirect_with(CURRENT_PATH, NoticeKind::Alert, &e.user_message())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_defaults() {
        let preview = PreviewQuery::default();
        assert_eq!(preview.order_total(), Decimal::new(100, 0));
        assert_eq!(preview.quantity(), 1);
    }

    #[test]
    fn test_preview_ignores_bad_input() {
        let preview = PreviewQuery {
            order_total: Some("-5".to_string()),
            quantity: Some("lots".to_string()),
        };
        assert_eq!(preview.order_total(), Decimal::new(100, 0));
        assert_eq!(preview.quantity(), 1);

        let preview = PreviewQuery {
            order_total: Some("42.50".to_string()),
            quantity: Some("3".to_string()),
        };
        assert_eq!(preview.order_total(), Decimal::new(4250, 2));
        assert_eq!(preview.quantity(), 3);
    }
}

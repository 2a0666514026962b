//! Shipping zone screens: list, detail with regions and methods, form, delete.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::instrument;

use segishop_core::FieldErrors;
use segishop_core::shipping::{
    NewZoneMethod, RegionInput, ShippingMethod, ShippingZone, ZoneInput, ensure_method_not_assigned,
    ensure_region_unique,
};
use segishop_core::types::{MethodId, RegionId, RegionType, ZoneId};
use segishop_core::validation::non_blank;

use crate::components::{Notice, NoticeKind, NoticeQuery, TabSet, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::routes::render;
use crate::state::AppState;

use super::{
    confirm_page, merge_errors, number_or, optional_decimal, optional_number, required_decimal,
};

const CURRENT_PATH: &str = "/shipping/zones";

const ZONE_TABS: [(&str, &str); 3] = [
    ("overview", "Overview"),
    ("regions", "Regions"),
    ("methods", "Methods"),
];

// =============================================================================
// Form inputs
// =============================================================================

/// Raw zone form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_enabled: Option<String>,
    #[serde(default)]
    pub sort_order: String,
}

impl ZoneFormInput {
    fn blank() -> Self {
        Self {
            is_enabled: Some("on".to_string()),
            sort_order: "0".to_string(),
            ..Self::default()
        }
    }

    fn from_zone(zone: &ShippingZone) -> Self {
        let input = ZoneInput::from(zone);
        Self {
            name: input.name,
            description: input.description.unwrap_or_default(),
            is_enabled: input.is_enabled.then(|| "on".to_string()),
            sort_order: input.sort_order.to_string(),
        }
    }

    fn parse(&self) -> Result<ZoneInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let sort_order = number_or(&mut errors, "sort_order", "Sort order", &self.sort_order, 0);
        let input = ZoneInput {
            name: self.name.clone(),
            description: non_blank(Some(&self.description)),
            is_enabled: self.is_enabled.is_some(),
            sort_order,
        };
        match input.validated() {
            Ok(input) if errors.is_empty() => Ok(input),
            Ok(_) => Err(errors),
            Err(invalid) => Err(merge_errors(errors, invalid)),
        }
    }
}

/// Raw add-region fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionFormInput {
    #[serde(default)]
    pub region_type: String,
    #[serde(default)]
    pub region_code: String,
    #[serde(default)]
    pub region_name: String,
    pub is_included: Option<String>,
    #[serde(default)]
    pub priority: String,
}

impl RegionFormInput {
    fn blank() -> Self {
        Self {
            region_type: RegionType::Country.as_str().to_string(),
            is_included: Some("on".to_string()),
            priority: "0".to_string(),
            ..Self::default()
        }
    }

    fn parse(&self, zone: &ShippingZone) -> Result<RegionInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let region_type = self.region_type.parse::<RegionType>().unwrap_or_else(|_| {
            errors.add("region_type", "Select a region type");
            RegionType::default()
        });
        let priority = number_or(&mut errors, "priority", "Priority", &self.priority, 0);
        let input = RegionInput {
            region_type,
            region_code: self.region_code.clone(),
            region_name: self.region_name.clone(),
            is_included: self.is_included.is_some(),
            priority,
        };
        let input = match input.validated() {
            Ok(input) => input,
            Err(invalid) => return Err(merge_errors(errors, invalid)),
        };
        if let Err(e) = ensure_region_unique(&zone.regions, &input) {
            errors.add("region_code", e.to_string());
        }
        errors.into_result()?;
        Ok(input)
    }
}

/// Raw add-zone-method fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneMethodFormInput {
    pub shipping_method_id: Option<MethodId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub base_cost: String,
    #[serde(default)]
    pub min_order_amount: String,
    #[serde(default)]
    pub estimated_days_min: String,
    #[serde(default)]
    pub estimated_days_max: String,
    pub is_enabled: Option<String>,
    #[serde(default)]
    pub sort_order: String,
}

impl ZoneMethodFormInput {
    fn blank() -> Self {
        Self {
            base_cost: "0.00".to_string(),
            is_enabled: Some("on".to_string()),
            sort_order: "0".to_string(),
            ..Self::default()
        }
    }

    fn is_selected(&self, method: &ShippingMethod) -> bool {
        self.shipping_method_id == Some(method.id)
    }

    fn parse(&self, zone: &ShippingZone, methods: &[ShippingMethod]) -> Result<NewZoneMethod, FieldErrors> {
        let mut errors = FieldErrors::new();
        let method = self
            .shipping_method_id
            .filter(|id| id.is_set())
            .and_then(|id| methods.iter().find(|m| m.id == id));
        let base_cost = required_decimal(&mut errors, "base_cost", "Base cost", &self.base_cost);
        let min_order_amount = optional_decimal(
            &mut errors,
            "min_order_amount",
            "Minimum order amount",
            &self.min_order_amount,
        );
        let estimated_days_min = optional_number(
            &mut errors,
            "estimated_days_min",
            "Minimum delivery days",
            &self.estimated_days_min,
        );
        let estimated_days_max = optional_number(
            &mut errors,
            "estimated_days_max",
            "Maximum delivery days",
            &self.estimated_days_max,
        );
        let sort_order = number_or(&mut errors, "sort_order", "Sort order", &self.sort_order, 0);

        let Some(method) = method else {
            errors.add("shipping_method_id", "Select a shipping method");
            return Err(errors);
        };
        if let Err(e) = ensure_method_not_assigned(zone, method.id) {
            errors.add("shipping_method_id", e.to_string());
        }

        let title = if self.title.trim().is_empty() {
            method.name.clone()
        } else {
            self.title.clone()
        };
        let body = NewZoneMethod {
            title,
            is_enabled: self.is_enabled.is_some(),
            sort_order,
            base_cost,
            min_order_amount,
            estimated_days_min,
            estimated_days_max,
            ..NewZoneMethod::default_for(zone.id, method)
        };
        match body.validated() {
            Ok(body) if errors.is_empty() => Ok(body),
            Ok(_) => Err(errors),
            Err(invalid) => Err(merge_errors(errors, invalid)),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Zone list template.
#[derive(Template)]
#[template(path = "shipping/zones/index.html")]
pub struct ZonesIndexTemplate {
    pub current_path: String,
    pub zones: Vec<ShippingZone>,
    pub notices: Vec<Notice>,
    pub load_error: Option<String>,
}

/// Zone detail template.
#[derive(Template)]
#[template(path = "shipping/zones/show.html")]
pub struct ZoneShowTemplate {
    pub current_path: String,
    pub zone: ShippingZone,
    pub tabs: TabSet,
    pub notices: Vec<Notice>,
    pub region_types: &'static [RegionType],
    pub region_form: RegionFormInput,
    pub region_errors: FieldErrors,
    /// Methods not yet bound to this zone.
    pub available_methods: Vec<ShippingMethod>,
    pub method_form: ZoneMethodFormInput,
    pub method_errors: FieldErrors,
}

/// Zone create/edit form template.
#[derive(Template)]
#[template(path = "shipping/zones/form.html")]
pub struct ZoneFormTemplate {
    pub current_path: String,
    pub zone_id: Option<ZoneId>,
    pub form: ZoneFormInput,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl ZoneFormTemplate {
    fn action(&self) -> String {
        self.zone_id
            .map_or_else(|| CURRENT_PATH.to_string(), |id| format!("{CURRENT_PATH}/{id}"))
    }
}

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

struct DetailForms {
    tab: &'static str,
    region_form: RegionFormInput,
    region_errors: FieldErrors,
    method_form: ZoneMethodFormInput,
    method_errors: FieldErrors,
}

impl DetailForms {
    fn blank(tab: Option<&str>) -> Self {
        let tabs = TabSet::new("", &ZONE_TABS, tab);
        Self {
            tab: tabs.current,
            region_form: RegionFormInput::blank(),
            region_errors: FieldErrors::new(),
            method_form: ZoneMethodFormInput::blank(),
            method_errors: FieldErrors::new(),
        }
    }
}

async fn render_detail(
    state: &AppState,
    zone: ShippingZone,
    notices: Vec<Notice>,
    forms: DetailForms,
) -> Result<Html<String>, AppError> {
    let available_methods = if forms.tab == "methods" {
        state
            .shipping()
            .list_methods()
            .await?
            .into_iter()
            .filter(|m| !zone.has_method(m.id))
            .collect()
    } else {
        Vec::new()
    };
    let base = format!("{CURRENT_PATH}/{}", zone.id);
    Ok(render(&ZoneShowTemplate {
        current_path: CURRENT_PATH.to_string(),
        tabs: TabSet::new(&base, &ZONE_TABS, Some(forms.tab)),
        zone,
        notices,
        region_types: &RegionType::ALL,
        region_form: forms.region_form,
        region_errors: forms.region_errors,
        available_methods,
        method_form: forms.method_form,
        method_errors: forms.method_errors,
    }))
}

// =============================================================================
// Handlers
// =============================================================================

/// Zone list handler.
#[instrument(skip(state, notices))]
pub async fn index(State(state): State<AppState>, Query(notices): Query<NoticeQuery>) -> Html<String> {
    let (zones, load_error) = match state.shipping().list_zones().await {
        Ok(zones) => (zones, None),
        Err(e) => {
            tracing::error!("Failed to fetch shipping zones: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };
    render(&ZonesIndexTemplate {
        current_path: CURRENT_PATH.to_string(),
        zones,
        notices: notices.notices(),
        load_error,
    })
}

/// Zone detail handler.
#[instrument(skip(state, notices))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ZoneId>,
    Query(tab): Query<TabQuery>,
    Query(notices): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    render_detail(&state, zone, notices.notices(), DetailForms::blank(tab.tab.as_deref())).await
}

/// New zone form handler.
#[instrument]
pub async fn new_zone() -> Html<String> {
    render(&ZoneFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        zone_id: None,
        form: ZoneFormInput::blank(),
        errors: FieldErrors::new(),
        error: None,
    })
}

/// Create zone handler.
#[instrument(skip(state, form))]
pub async fn create(State(state): State<AppState>, Form(form): Form<ZoneFormInput>) -> Response {
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(None, form, errors, None).into_response(),
    };
    match state.shipping().create_zone(&input).await {
        Ok(zone) => {
            tracing::info!(zone_id = %zone.id, name = %zone.name, "Shipping zone created");
            Redirect::to(&format!("{CURRENT_PATH}/{}", zone.id)).into_response()
        }
        Err(e) => {
            tracing::error!(name = %input.name, error = %e, "Failed to create shipping zone");
            form_page(None, form, FieldErrors::new(), Some(e.user_message())).into_response()
        }
    }
}

/// Edit zone form handler.
#[instrument(skip(state))]
pub async fn edit(State(state): State<AppState>, Path(id): Path<ZoneId>) -> Result<Html<String>, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    Ok(form_page(Some(id), ZoneFormInput::from_zone(&zone), FieldErrors::new(), None))
}

/// Update zone handler.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ZoneId>,
    Form(form): Form<ZoneFormInput>,
) -> Response {
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(Some(id), form, errors, None).into_response(),
    };
    match state.shipping().update_zone(id, &input).await {
        Ok(_) => {
            tracing::info!(zone_id = %id, "Shipping zone updated");
            redirect_with(&format!("{CURRENT_PATH}/{id}"), NoticeKind::Success, "Zone saved")
                .into_response()
        }
        Err(e) => {
            tracing::error!(zone_id = %id, error = %e, "Failed to update shipping zone");
            form_page(Some(id), form, FieldErrors::new(), Some(e.user_message())).into_response()
        }
    }
}

fn form_page(
    zone_id: Option<ZoneId>,
    form: ZoneFormInput,
    errors: FieldErrors,
    error: Option<String>,
) -> Html<String> {
    render(&ZoneFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        zone_id,
        form,
        errors,
        error,
    })
}

/// Delete confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<ZoneId>,
) -> Result<Html<String>, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Delete shipping zone".to_string(),
        format!(
            "Delete \"{}\"? Its {} region(s) and {} method assignment(s) go with it.",
            zone.name, zone.region_count, zone.method_count
        ),
        format!("{CURRENT_PATH}/{id}/delete"),
        CURRENT_PATH.to_string(),
    ))
}

/// Delete zone handler. Failures come back as a blocking alert on the list.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<ZoneId>) -> Redirect {
    match state.shipping().delete_zone(id).await {
        Ok(ack) => {
            tracing::info!(zone_id = %id, "Shipping zone deleted");
            let message = ack.message.unwrap_or_else(|| "Shipping zone deleted".to_string());
            redirect_with(CURRENT_PATH, NoticeKind::Success, &message)
        }
        Err(e) => {
            tracing::error!(zone_id = %id, error = %e, "Failed to delete shipping zone");
            redirect_with(CURRENT_PATH, NoticeKind::Alert, &e.user_message())
        }
    }
}

/// Add region handler.
#[instrument(skip(state, form))]
pub async fn add_region(
    State(state): State<AppState>,
    Path(id): Path<ZoneId>,
    Form(form): Form<RegionFormInput>,
) -> Result<Response, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    let back = format!("{CURRENT_PATH}/{id}?tab=regions");

    let invalid = match form.parse(&zone) {
        Ok(input) => match state.shipping().add_region(id, &input).await {
            Ok(_) => {
                tracing::info!(zone_id = %id, code = %input.region_code, "Region added to zone");
                return Ok(redirect_with(&back, NoticeKind::Success, "Region added").into_response());
            }
            Err(e) => {
                tracing::error!(zone_id = %id, error = %e, "Failed to add region");
                let mut errors = FieldErrors::new();
                errors.add("general", e.user_message());
                errors
            }
        },
        Err(errors) => errors,
    };

    let forms = DetailForms {
        region_form: form,
        region_errors: invalid,
        ..DetailForms::blank(Some("regions"))
    };
    Ok(render_detail(&state, zone, Vec::new(), forms).await?.into_response())
}

/// Region removal confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_remove_region(
    State(state): State<AppState>,
    Path((id, region_id)): Path<(ZoneId, RegionId)>,
) -> Result<Html<String>, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    let region = zone
        .regions
        .iter()
        .find(|r| r.id == region_id)
        .ok_or_else(|| AppError::NotFound("Region".to_string()))?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Remove region".to_string(),
        format!(
            "Remove {} ({}) from \"{}\"?",
            region.region_name, region.region_code, zone.name
        ),
        format!("{CURRENT_PATH}/{id}/regions/{region_id}/delete"),
        format!("{CURRENT_PATH}/{id}?tab=regions"),
    ))
}

/// Remove region handler.
#[instrument(skip(state))]
pub async fn remove_region(
    State(state): State<AppState>,
    Path((id, region_id)): Path<(ZoneId, RegionId)>,
) -> Redirect {
    let back = format!("{CURRENT_PATH}/{id}?tab=regions");
    match state.shipping().remove_region(id, region_id).await {
        Ok(_) => {
            tracing::info!(zone_id = %id, region_id = %region_id, "Region removed from zone");
            redirect_with(&back, NoticeKind::Success, "Region removed")
        }
        Err(e) => {
            tracing::error!(zone_id = %id, region_id = %region_id, error = %e, "Failed to remove region");
            redirect_with(&back, NoticeKind::Alert, &e.user_message())
        }
    }
}

/// Add zone method handler.
#[instrument(skip(state, form))]
pub async fn add_method(
    State(state): State<AppState>,
    Path(id): Path<ZoneId>,
    Form(form): Form<ZoneMethodFormInput>,
) -> Result<Response, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    let methods = state.shipping().list_methods().await?;
    let back = format!("{CURRENT_PATH}/{id}?tab=methods");

    let invalid = match form.parse(&zone, &methods) {
        Ok(body) => match state.shipping().create_zone_method(&body).await {
            Ok(_) => {
                tracing::info!(zone_id = %id, method_id = %body.shipping_method_id, "Method added to zone");
                return Ok(
                    redirect_with(&back, NoticeKind::Success, "Shipping method added").into_response(),
                );
            }
            Err(e) => {
                tracing::error!(zone_id = %id, error = %e, "Failed to add method to zone");
                let mut errors = FieldErrors::new();
                errors.add("general", e.user_message());
                errors
            }
        },
        Err(errors) => errors,
    };

    let forms = DetailForms {
        method_form: form,
        method_errors: invalid,
        ..DetailForms::blank(Some("methods"))
    };
    Ok(render_detail(&state, zone, Vec::new(), forms).await?.into_response())
}

/// Zone method removal confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_remove_method(
    State(state): State<AppState>,
    Path((id, method_id)): Path<(ZoneId, MethodId)>,
) -> Result<Html<String>, AppError> {
    let zone = state.shipping().get_zone(id).await?;
    let zone_method = zone
        .zone_method_for(method_id)
        .ok_or_else(|| AppError::NotFound("Zone method".to_string()))?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Remove shipping method".to_string(),
        format!(
            "Remove \"{}\" from \"{}\"? Class costs configured for it are removed too.",
            zone_method.title, zone.name
        ),
        format!("{CURRENT_PATH}/{id}/methods/{method_id}/delete"),
        format!("{CURRENT_PATH}/{id}?tab=methods"),
    ))
}

/// Remove zone method handler.
#[instrument(skip(state))]
pub async fn remove_method(
    State(state): State<AppState>,
    Path((id, method_id)): Path<(ZoneId, MethodId)>,
) -> Redirect {
    let back = format!("{CURRENT_PATH}/{id}?tab=methods");
    match state.shipping().remove_zone_method(id, method_id).await {
        Ok(_) => {
            tracing::info!(zone_id = %id, method_id = %method_id, "Method removed from zone");
            redirect_with(&back, NoticeKind::Success, "Shipping method removed")
        }
        Err(e) => {
            tracing::error!(zone_id = %id, method_id = %method_id, error = %e, "Failed to remove method from zone");
            redirect_with(&back, NoticeKind::Alert, &e.user_message())
        }
    }
}

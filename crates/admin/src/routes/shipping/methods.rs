//! Shipping method screens, including bulk zone assignment.

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
    BatchReport, MethodInput, Selection, ShippingMethod, ShippingZone, ZonePartition,
};
use segishop_core::types::{MethodId, MethodType, ZoneId};
use segishop_core::validation::non_blank;

use crate::components::{Notice, NoticeKind, NoticeQuery, TabSet, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::routes::render;
use crate::services::{AssignmentAction, ZoneAssignmentService};
use crate::state::AppState;

use super::confirm_page;

const CURRENT_PATH: &str = "/shipping/methods";

const METHOD_TABS: [(&str, &str); 2] = [("overview", "Overview"), ("zones", "Zones")];

// =============================================================================
// Form inputs
// =============================================================================

/// Raw method form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method_type: String,
    #[serde(default)]
    pub description: String,
    pub is_enabled: Option<String>,
    pub is_taxable: Option<String>,
}

impl MethodFormInput {
    fn blank() -> Self {
        Self {
            method_type: MethodType::default().as_str().to_string(),
            is_enabled: Some("on".to_string()),
            ..Self::default()
        }
    }

    fn from_method(method: &ShippingMethod) -> Self {
        let input = MethodInput::from(method);
        Self {
            name: input.name,
            method_type: input.method_type.as_str().to_string(),
            description: input.description.unwrap_or_default(),
            is_enabled: input.is_enabled.then(|| "on".to_string()),
            is_taxable: input.is_taxable.then(|| "on".to_string()),
        }
    }

    fn parse(&self) -> Result<MethodInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let method_type = self.method_type.parse::<MethodType>().unwrap_or_else(|_| {
            errors.add("method_type", "Select a method type");
            MethodType::default()
        });
        let input = MethodInput {
            name: self.name.clone(),
            method_type,
            description: non_blank(Some(&self.description)),
            is_enabled: self.is_enabled.is_some(),
            is_taxable: self.is_taxable.is_some(),
        };
        match input.validated() {
            Ok(input) if errors.is_empty() => Ok(input),
            Ok(_) => Err(errors),
            Err(invalid) => Err(super::merge_errors(errors, invalid)),
        }
    }
}

/// Zones tab submission. `intent` names the button that was pressed.
#[derive(Debug, Default, Deserialize)]
pub struct ZoneActionForm {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub zone_ids: Vec<ZoneId>,
}

// =============================================================================
// Templates
// =============================================================================

/// Method list template.
#[derive(Template)]
#[template(path = "shipping/methods/index.html")]
pub struct MethodsIndexTemplate {
    pub current_path: String,
    pub methods: Vec<ShippingMethod>,
    pub notices: Vec<Notice>,
    pub load_error: Option<String>,
}

/// Method detail template.
#[derive(Template)]
#[template(path = "shipping/methods/show.html")]
pub struct MethodShowTemplate {
    pub current_path: String,
    pub method: ShippingMethod,
    pub tabs: TabSet,
    pub notices: Vec<Notice>,
    pub partition: ZonePartition,
    pub selection: Selection<ZoneId>,
    /// Per-zone outcomes of the last batch, when it partly failed.
    pub report: Option<BatchReport<ZoneId>>,
}

impl MethodShowTemplate {
    fn is_selected(&self, zone: &ShippingZone) -> bool {
        self.selection.contains(zone.id)
    }

    fn selected_in(&self, zones: &[ShippingZone]) -> usize {
        zones.iter().filter(|z| self.selection.contains(z.id)).count()
    }

    fn selected_available(&self) -> usize {
        self.selected_in(&self.partition.available)
    }

    fn selected_assigned(&self) -> usize {
        self.selected_in(&self.partition.assigned)
    }

    /// Whether the "select all" toggle for a list would clear it.
    fn all_selected(&self, assigned: bool) -> bool {
        let zones = if assigned {
            &self.partition.assigned
        } else {
            &self.partition.available
        };
        !zones.is_empty() && self.selected_in(zones) == zones.len()
    }
}

/// Method create/edit form template.
#[derive(Template)]
#[template(path = "shipping/methods/form.html")]
pub struct MethodFormTemplate {
    pub current_path: String,
    pub method_id: Option<MethodId>,
    pub method_types: &'static [MethodType],
    pub form: MethodFormInput,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl MethodFormTemplate {
    fn action(&self) -> String {
        self.method_id
            .map_or_else(|| CURRENT_PATH.to_string(), |id| format!("{CURRENT_PATH}/{id}"))
    }
}

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

struct ZonesTab {
    partition: ZonePartition,
    selection: Selection<ZoneId>,
    report: Option<BatchReport<ZoneId>>,
}

fn detail_page(
    method: ShippingMethod,
    tab: Option<&str>,
    notices: Vec<Notice>,
    zones: ZonesTab,
) -> Html<String> {
    let base = format!("{CURRENT_PATH}/{}", method.id);
    render(&MethodShowTemplate {
        current_path: CURRENT_PATH.to_string(),
        tabs: TabSet::new(&base, &METHOD_TABS, tab),
        method,
        notices,
        partition: zones.partition,
        selection: zones.selection,
        report: zones.report,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Method list handler.
#[instrument(skip(state, notices))]
pub async fn index(State(state): State<AppState>, Query(notices): Query<NoticeQuery>) -> Html<String> {
    let (methods, load_error) = match state.shipping().list_methods().await {
        Ok(methods) => (methods, None),
        Err(e) => {
            tracing::error!("Failed to fetch shipping methods: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };
    render(&MethodsIndexTemplate {
        current_path: CURRENT_PATH.to_string(),
        methods,
        notices: notices.notices(),
        load_error,
    })
}

/// Method detail handler.
#[instrument(skip(state, notices))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<MethodId>,
    Query(tab): Query<TabQuery>,
    Query(notices): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let method = state.shipping().get_method(id).await?;
    let tabs = TabSet::new("", &METHOD_TABS, tab.tab.as_deref());
    let partition = if tabs.is("zones") {
        ZoneAssignmentService::new(state.shipping())
            .partition(&method)
            .await?
    } else {
        ZonePartition::default()
    };
    Ok(detail_page(
        method,
        Some(tabs.current),
        notices.notices(),
        ZonesTab {
            partition,
            selection: Selection::new(),
            report: None,
        },
    ))
}

/// Bulk zone assignment handler.
///
/// `assign` binds the method to every selected available zone and `remove`
/// unbinds it from every selected assigned zone. `toggle_available` and
/// `toggle_assigned` are the "select all" boxes of the two lists. A fully
/// successful batch redirects with a success message and clears the
/// selection; otherwise the page is re-rendered with the selection kept and
/// the failed zones listed.
#[instrument(skip(state, form), fields(intent = %form.intent, selected = form.zone_ids.len()))]
pub async fn zones_action(
    State(state): State<AppState>,
    Path(id): Path<MethodId>,
    Form(form): Form<ZoneActionForm>,
) -> Result<Response, AppError> {
    let method = state.shipping().get_method(id).await?;
    let service = ZoneAssignmentService::new(state.shipping());
    let partition = service.partition(&method).await?;

    let mut selection: Selection<ZoneId> = form.zone_ids.iter().copied().collect();
    selection.retain_visible(all_zone_ids(&partition));

    let action = match form.intent.as_str() {
        "assign" => AssignmentAction::Assign,
        "remove" => AssignmentAction::Remove,
        toggle => {
            match toggle {
                "toggle_available" => selection.toggle_all(partition.available.iter().map(|z| z.id)),
                "toggle_assigned" => selection.toggle_all(partition.assigned.iter().map(|z| z.id)),
                other => return Err(AppError::BadRequest(format!("Unknown action: {other}"))),
            }
            let zones = ZonesTab {
                partition,
                selection,
                report: None,
            };
            return Ok(detail_page(method, Some("zones"), Vec::new(), zones).into_response());
        }
    };

    let targets = match action {
        AssignmentAction::Assign => &partition.available,
        AssignmentAction::Remove => &partition.assigned,
    };
    if !targets.iter().any(|z| selection.contains(z.id)) {
        let message = format!("Select at least one zone to {}", action.verb());
        let zones = ZonesTab {
            partition,
            selection,
            report: None,
        };
        return Ok(detail_page(method, Some("zones"), vec![Notice::error(message)], zones).into_response());
    }

    let outcome = match action {
        AssignmentAction::Assign => service.assign(&method, &partition, &selection).await,
        AssignmentAction::Remove => service.remove(&method, &partition, &selection).await,
    };

    if let Some(message) = &outcome.success_message {
        let back = format!("{CURRENT_PATH}/{id}?tab=zones");
        return Ok(redirect_with(&back, NoticeKind::Success, message).into_response());
    }

    // Partial failure: reload so the lists show what did succeed.
    let partition = service.partition(&method).await?;
    selection.retain_visible(all_zone_ids(&partition));
    let notices = outcome
        .error_message
        .clone()
        .map(Notice::alert)
        .into_iter()
        .collect();
    let zones = ZonesTab {
        partition,
        selection,
        report: Some(outcome.report),
    };
    Ok(detail_page(method, Some("zones"), notices, zones).into_response())
}

fn all_zone_ids(partition: &ZonePartition) -> Vec<ZoneId> {
    partition
        .assigned
        .iter()
        .chain(&partition.available)
        .map(|z| z.id)
        .collect()
}

/// New method form handler.
#[instrument]
pub async fn new_method() -> Html<String> {
    form_page(None, MethodFormInput::blank(), FieldErrors::new(), None)
}

/// Create method handler.
#[instrument(skip(state, form))]
pub async fn create(State(state): State<AppState>, Form(form): Form<MethodFormInput>) -> Response {
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(None, form, errors, None).into_response(),
    };
    match state.shipping().create_method(&input).await {
        Ok(method) => {
            tracing::info!(method_id = %method.id, name = %method.name, "Shipping method created");
            Redirect::to(&format!("{CURRENT_PATH}/{}", method.id)).into_response()
        }
        Err(e) => {
            tracing::error!(name = %input.name, error = %e, "Failed to create shipping method");
            form_page(None, form, FieldErrors::new(), Some(e.user_message())).into_response()
        }
    }
}

/// Edit method form handler.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<MethodId>,
) -> Result<Html<String>, AppError> {
    let method = state.shipping().get_method(id).await?;
    Ok(form_page(
        Some(id),
        MethodFormInput::from_method(&method),
        FieldErrors::new(),
        None,
    ))
}

/// Update method handler.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<MethodId>,
    Form(form): Form<MethodFormInput>,
) -> Response {
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(Some(id), form, errors, None).into_response(),
    };
    match state.shipping().update_method(id, &input).await {
        Ok(_) => {
            tracing::info!(method_id = %id, "Shipping method updated");
            redirect_with(&format!("{CURRENT_PATH}/{id}"), NoticeKind::Success, "Method saved")
                .into_response()
        }
        Err(e) => {
            tracing::error!(method_id = %id, error = %e, "Failed to update shipping method");
            form_page(Some(id), form, FieldErrors::new(), Some(e.user_message())).into_response()
        }
    }
}

fn form_page(
    method_id: Option<MethodId>,
    form: MethodFormInput,
    errors: FieldErrors,
    error: Option<String>,
) -> Html<String> {
    render(&MethodFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        method_id,
        method_types: &MethodType::ALL,
        form,
        errors,
        error,
    })
}

/// Delete confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<MethodId>,
) -> Result<Html<String>, AppError> {
    let method = state.shipping().get_method(id).await?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Delete shipping method".to_string(),
        format!(
            "Delete \"{}\"? It is assigned to {} zone(s).",
            method.name, method.zone_count
        ),
        format!("{CURRENT_PATH}/{id}/delete"),
        CURRENT_PATH.to_string(),
    ))
}

/// Delete method handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<MethodId>) -> Redirect {
    match state.shipping().delete_method(id).await {
        Ok(ack) => {
            tracing::info!(method_id = %id, "Shipping method deleted");
            let message = ack.message.unwrap_or_else(|| "Shipping method deleted".to_string());
            redirect_with(CURRENT_PATH, NoticeKind::Success, &message)
        }
        Err(e) => {
            tracing::error!(method_id = %id, error = %e, "Failed to delete shipping method");
            redirect_with(CURRENT_PATH, NoticeKind::Alert, &e.user_message())
        }
    }
}

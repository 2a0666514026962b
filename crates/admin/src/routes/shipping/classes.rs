//! Shipping class screens, including product assignment.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use tracing::instrument;

use segishop_core::FieldErrors;
use segishop_core::catalog::ProductSummary;
use segishop_core::shipping::{ClassCost, ClassInput, Selection, ShippingClass};
use segishop_core::slug::{SlugField, generate_slug};
use segishop_core::types::{ClassId, Page, ProductId};
use segishop_core::validation::non_blank;

use crate::components::{Notice, NoticeKind, NoticeQuery, Pager, TabSet, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::routes::render;
use crate::services::{ListQuery, ProductAssignmentService};
use crate::state::AppState;

use super::confirm_page;

const CURRENT_PATH: &str = "/shipping/classes";

const CLASS_TABS: [(&str, &str); 3] = [
    ("overview", "Overview"),
    ("costs", "Costs"),
    ("products", "Products"),
];

// =============================================================================
// Form inputs
// =============================================================================

/// Raw class form fields.
///
/// The slug follows the name until edited by hand. `slug_source` is the name
/// the current slug was generated from, so a hand edit can be told apart
/// from a stale automatic value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub slug_manual: Option<String>,
    #[serde(default)]
    pub slug_source: String,
    #[serde(default)]
    pub description: String,
    /// `save`, `refresh_slug` or `auto_slug`.
    #[serde(default)]
    pub intent: String,
}

impl ClassFormInput {
    fn from_class(class: &ShippingClass) -> Self {
        let input = ClassInput::from(class);
        let field = SlugField::existing(&input.slug);
        Self {
            slug_manual: field.is_manual().then(|| "1".to_string()),
            slug: field.into_value(),
            slug_source: input.name.clone(),
            name: input.name,
            description: input.description.unwrap_or_default(),
            intent: String::new(),
        }
    }

    /// Replay this submission onto a slug field.
    fn slug_field(&self) -> SlugField {
        let mut field = if self.slug_manual.is_some() {
            SlugField::existing(&self.slug)
        } else {
            SlugField::new()
        };
        if self.intent == "auto_slug" {
            field.reset_auto(&self.name);
            return field;
        }
        if !field.is_manual() {
            let typed = generate_slug(&self.slug);
            if !typed.is_empty() && typed != generate_slug(&self.slug_source) {
                field.edited(&self.slug);
            } else {
                field.name_changed(&self.name);
            }
        }
        field
    }

    /// The form as it should be shown again after this submission.
    fn rerendered(&self) -> Self {
        let field = self.slug_field();
        Self {
            slug_manual: field.is_manual().then(|| "1".to_string()),
            slug: field.into_value(),
            slug_source: self.name.clone(),
            intent: String::new(),
            ..self.clone()
        }
    }

    const fn is_slug_manual(&self) -> bool {
        self.slug_manual.is_some()
    }

    fn wants_save(&self) -> bool {
        self.intent.is_empty() || self.intent == "save"
    }

    fn parse(&self) -> Result<ClassInput, FieldErrors> {
        ClassInput {
            name: self.name.clone(),
            slug: self.slug_field().into_value(),
            description: non_blank(Some(&self.description)),
        }
        .validated()
    }
}

/// Page and search state of both product lists on the products tab.
///
/// `*_previous` is only sent by a search form and holds the term the list
/// was showing; a different new term starts that list over at page 1.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListsQuery {
    pub tab: Option<String>,
    #[serde(default)]
    pub assigned_page: u32,
    pub assigned_search: Option<String>,
    pub assigned_previous: Option<String>,
    #[serde(default)]
    pub unassigned_page: u32,
    pub unassigned_search: Option<String>,
    pub unassigned_previous: Option<String>,
}

impl ProductListsQuery {
    fn assigned(&self) -> ListQuery {
        resolve_list(
            self.assigned_page,
            self.assigned_search.as_deref(),
            self.assigned_previous.as_deref(),
        )
    }

    fn unassigned(&self) -> ListQuery {
        resolve_list(
            self.unassigned_page,
            self.unassigned_search.as_deref(),
            self.unassigned_previous.as_deref(),
        )
    }
}

fn resolve_list(page: u32, search: Option<&str>, previous: Option<&str>) -> ListQuery {
    match previous {
        Some(previous) => ListQuery {
            page,
            search: Some(previous.to_string()),
        }
        .with_search(search.map(str::to_string)),
        None => ListQuery {
            page,
            search: non_blank(search),
        },
    }
}

/// Assign/remove submission from one of the two product lists.
#[derive(Debug, Default, Deserialize)]
pub struct ProductActionForm {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub assigned_page: u32,
    pub assigned_search: Option<String>,
    #[serde(default)]
    pub unassigned_page: u32,
    pub unassigned_search: Option<String>,
}

/// URL of the products tab showing both lists at the given state.
fn products_href(class_id: ClassId, assigned: &ListQuery, unassigned: &ListQuery) -> String {
    let mut href = format!(
        "{CURRENT_PATH}/{class_id}?tab=products&assigned_page={}&unassigned_page={}",
        assigned.page_request().page,
        unassigned.page_request().page
    );
    if let Some(term) = assigned.search_term() {
        href.push_str(&format!("&assigned_search={}", urlencoding::encode(&term)));
    }
    if let Some(term) = unassigned.search_term() {
        href.push_str(&format!("&unassigned_search={}", urlencoding::encode(&term)));
    }
    href
}

// =============================================================================
// Templates
// =============================================================================

/// Class list template.
#[derive(Template)]
#[template(path = "shipping/classes/index.html")]
pub struct ClassesIndexTemplate {
    pub current_path: String,
    pub classes: Vec<ShippingClass>,
    pub notices: Vec<Notice>,
    pub load_error: Option<String>,
}

/// One product list on the products tab.
pub struct ProductListView {
    pub products: Vec<ProductSummary>,
    pub query: ListQuery,
    pub pager: Pager,
}

/// Class detail template.
#[derive(Template)]
#[template(path = "shipping/classes/show.html")]
pub struct ClassShowTemplate {
    pub current_path: String,
    pub class: ShippingClass,
    pub tabs: TabSet,
    pub notices: Vec<Notice>,
    pub costs: Vec<ClassCost>,
    pub assigned: Option<ProductListView>,
    pub unassigned: Option<ProductListView>,
}

impl ProductListView {
    fn search_value(&self) -> String {
        self.query.search_term().unwrap_or_default()
    }

    fn page(&self) -> u32 {
        self.query.page_request().page
    }
}

/// Class create/edit form template.
#[derive(Template)]
#[template(path = "shipping/classes/form.html")]
pub struct ClassFormTemplate {
    pub current_path: String,
    pub class_id: Option<ClassId>,
    pub form: ClassFormInput,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl ClassFormTemplate {
    fn action(&self) -> String {
        self.class_id
            .map_or_else(|| CURRENT_PATH.to_string(), |id| format!("{CURRENT_PATH}/{id}"))
    }
}

fn list_view(
    page: Page<ProductSummary>,
    query: ListQuery,
    link: impl Fn(ListQuery) -> String,
) -> ProductListView {
    let pager = Pager::new(&page, |n| {
        link(ListQuery {
            page: n,
            search: query.search.clone(),
        })
    });
    ProductListView {
        products: page.items,
        query,
        pager,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Class list handler.
#[instrument(skip(state, notices))]
pub async fn index(State(state): State<AppState>, Query(notices): Query<NoticeQuery>) -> Html<String> {
    let (classes, load_error) = match state.shipping().list_classes().await {
        Ok(classes) => (classes, None),
        Err(e) => {
            tracing::error!("Failed to fetch shipping classes: {e}");
            (Vec::new(), Some(e.user_message()))
        }
    };
    render(&ClassesIndexTemplate {
        current_path: CURRENT_PATH.to_string(),
        classes,
        notices: notices.notices(),
        load_error,
    })
}

/// Class detail handler.
#[instrument(skip(state, notices))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
    Query(lists): Query<ProductListsQuery>,
    Query(notices): Query<NoticeQuery>,
) -> Result<Html<String>, AppError> {
    let class = state.shipping().get_class(id).await?;
    let base = format!("{CURRENT_PATH}/{id}");
    let tabs = TabSet::new(&base, &CLASS_TABS, lists.tab.as_deref());

    let costs = if tabs.is("costs") {
        state.shipping().list_class_costs(Some(id), None).await?
    } else {
        Vec::new()
    };

    let (assigned, unassigned) = if tabs.is("products") {
        let assigned_query = lists.assigned();
        let unassigned_query = lists.unassigned();
        let loaded = ProductAssignmentService::new(state.shipping())
            .load(id, &assigned_query, &unassigned_query)
            .await?;
        let assigned = list_view(loaded.assigned, assigned_query.clone(), |q| {
            products_href(id, &q, &unassigned_query)
        });
        let unassigned = list_view(loaded.unassigned, unassigned_query.clone(), |q| {
            products_href(id, &assigned_query, &q)
        });
        (Some(assigned), Some(unassigned))
    } else {
        (None, None)
    };

    Ok(render(&ClassShowTemplate {
        current_path: CURRENT_PATH.to_string(),
        class,
        tabs,
        notices: notices.notices(),
        costs,
        assigned,
        unassigned,
    }))
}

/// Assign or remove the selected products, then reload both lists at
/// their current page and search.
#[instrument(skip(state, form), fields(intent = %form.intent, selected = form.product_ids.len()))]
pub async fn products_action(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
    Form(form): Form<ProductActionForm>,
) -> Result<Redirect, AppError> {
    let class = state.shipping().get_class(id).await?;
    let selection: Selection<ProductId> = form.product_ids.iter().copied().collect();
    let service = ProductAssignmentService::new(state.shipping());

    let result = match form.intent.as_str() {
        "assign" => service.assign(&class, &selection).await,
        "remove" => service.remove(&class, &selection).await,
        other => return Err(AppError::BadRequest(format!("Unknown action: {other}"))),
    };

    let back = products_href(
        id,
        &ListQuery {
            page: form.assigned_page,
            search: form.assigned_search,
        },
        &ListQuery {
            page: form.unassigned_page,
            search: form.unassigned_search,
        },
    );
    Ok(match result {
        Ok(message) => redirect_with(&back, NoticeKind::Success, &message),
        Err(e) => {
            tracing::error!(class_id = %id, error = %e, "Product assignment failed");
            redirect_with(&back, NoticeKind::Alert, &e.user_message())
        }
    })
}

/// New class form handler.
#[instrument]
pub async fn new_class() -> Html<String> {
    form_page(None, ClassFormInput::default(), FieldErrors::new(), None)
}

/// Create class handler.
#[instrument(skip(state, form))]
pub async fn create(State(state): State<AppState>, Form(form): Form<ClassFormInput>) -> Response {
    if !form.wants_save() {
        return form_page(None, form.rerendered(), FieldErrors::new(), None).into_response();
    }
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(None, form.rerendered(), errors, None).into_response(),
    };
    match state.shipping().create_class(&input).await {
        Ok(class) => {
            tracing::info!(class_id = %class.id, slug = %class.slug, "Shipping class created");
            Redirect::to(&format!("{CURRENT_PATH}/{}", class.id)).into_response()
        }
        Err(e) => {
            tracing::error!(name = %input.name, error = %e, "Failed to create shipping class");
            form_page(None, form.rerendered(), FieldErrors::new(), Some(e.user_message()))
                .into_response()
        }
    }
}

/// Edit class form handler.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
) -> Result<Html<String>, AppError> {
    let class = state.shipping().get_class(id).await?;
    Ok(form_page(
        Some(id),
        ClassFormInput::from_class(&class),
        FieldErrors::new(),
        None,
    ))
}

/// Update class handler.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
    Form(form): Form<ClassFormInput>,
) -> Response {
    if !form.wants_save() {
        return form_page(Some(id), form.rerendered(), FieldErrors::new(), None).into_response();
    }
    let input = match form.parse() {
        Ok(input) => input,
        Err(errors) => return form_page(Some(id), form.rerendered(), errors, None).into_response(),
    };
    match state.shipping().update_class(id, &input).await {
        Ok(_) => {
            tracing::info!(class_id = %id, "Shipping class updated");
            redirect_with(&format!("{CURRENT_PATH}/{id}"), NoticeKind::Success, "Class saved")
                .into_response()
        }
        Err(e) => {
            tracing::error!(class_id = %id, error = %e, "Failed to update shipping class");
            form_page(Some(id), form.rerendered(), FieldErrors::new(), Some(e.user_message()))
                .into_response()
        }
    }
}

fn form_page(
    class_id: Option<ClassId>,
    form: ClassFormInput,
    errors: FieldErrors,
    error: Option<String>,
) -> Html<String> {
    render(&ClassFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        class_id,
        form,
        errors,
        error,
    })
}

/// Delete confirmation handler.
#[instrument(skip(state))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<ClassId>,
) -> Result<Html<String>, AppError> {
    let class = state.shipping().get_class(id).await?;
    Ok(confirm_page(
        CURRENT_PATH,
        "Delete shipping class".to_string(),
        format!(
            "Delete \"{}\"? {} product(s) currently use it.",
            class.name, class.product_count
        ),
        format!("{CURRENT_PATH}/{id}/delete"),
        CURRENT_PATH.to_string(),
    ))
}

/// Delete class handler.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<ClassId>) -> Redirect {
    match state.shipping().delete_class(id).await {
        Ok(ack) => {
            tracing::info!(class_id = %id, "Shipping class deleted");
            let message = ack.message.unwrap_or_else(|| "Shipping class deleted".to_string());
            redirect_with(CURRENT_PATH, NoticeKind::Success, &message)
        }
        Err(e) => {
            tracing::error!(class_id = %id, error = %e, "Failed to delete shipping class");
            redirect_with(CURRENT_PATH, NoticeKind::Alert, &e.user_message())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // =========================================================================
    // Slug handling
    // =========================================================================

    #[test]
    fn test_slug_follows_name_until_edited() {
        let form = ClassFormInput {
            name: "Heavy Items".to_string(),
            slug: "bulky".to_string(),
            slug_source: "Bulky".to_string(),
            ..ClassFormInput::default()
        };
        assert_eq!(form.parse().unwrap().slug, "heavy-items");
    }

    #[test]
    fn test_hand_edited_slug_sticks() {
        let form = ClassFormInput {
            name: "Heavy Items".to_string(),
            slug: "Big Stuff".to_string(),
            slug_source: "Heavy Items".to_string(),
            ..ClassFormInput::default()
        };
        let rerendered = form.rerendered();
        assert_eq!(rerendered.slug, "big-stuff");
        assert!(rerendered.is_slug_manual());
    }

    #[test]
    fn test_auto_button_resets_manual_slug() {
        let form = ClassFormInput {
            name: "Fragile Goods".to_string(),
            slug: "glass".to_string(),
            slug_manual: Some("1".to_string()),
            intent: "auto_slug".to_string(),
            ..ClassFormInput::default()
        };
        assert!(!form.wants_save());
        let rerendered = form.rerendered();
        assert_eq!(rerendered.slug, "fragile-goods");
        assert!(!rerendered.is_slug_manual());
    }

    #[test]
    fn test_existing_slug_is_manual() {
        let class = ShippingClass {
            id: ClassId::new(2),
            name: "Oversized".to_string(),
            slug: "oversized".to_string(),
            description: None,
            created_at: None,
            updated_at: None,
            product_count: 0,
            class_costs: Vec::new(),
        };
        let form = ClassFormInput::from_class(&class);
        assert!(form.is_slug_manual());
        let renamed = ClassFormInput {
            name: "Extra Large".to_string(),
            ..form
        };
        assert_eq!(renamed.parse().unwrap().slug, "oversized");
    }

    // =========================================================================
    // Product list state
    // =========================================================================

    #[test]
    fn test_new_unassigned_search_resets_page() {
        let query = ProductListsQuery {
            unassigned_page: 3,
            unassigned_search: Some("mug".to_string()),
            unassigned_previous: Some("cup".to_string()),
            ..ProductListsQuery::default()
        };
        let list = query.unassigned();
        assert_eq!(list.page, 1);
        assert_eq!(list.search_term().as_deref(), Some("mug"));
    }

    #[test]
    fn test_pager_link_keeps_page() {
        let query = ProductListsQuery {
            unassigned_page: 3,
            unassigned_search: Some("mug".to_string()),
            ..ProductListsQuery::default()
        };
        assert_eq!(query.unassigned().page, 3);
    }

    #[test]
    fn test_products_href_encodes_both_lists() {
        let href = products_href(
            ClassId::new(5),
            &ListQuery {
                page: 2,
                search: Some("tea pot".to_string()),
            },
            &ListQuery::default(),
        );
        assert_eq!(
            href,
            "/shipping/classes/5?tab=products&assigned_page=2&unassigned_page=1&assigned_search=tea%20pot"
        );
    }
}

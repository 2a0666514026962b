//! Product catalog route handlers.
//!
//! List with stock/category/search filters, bulk activate/deactivate, a
//! create form with deferred image upload, and CSV import/export.

use std::io::Cursor;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{Form, Query as ListQuery};
use serde::Deserialize;
use tracing::instrument;

use segishop_core::FieldErrors;
use segishop_core::catalog::{
    AdminProduct, BulkStatusUpdate, Category, NewProduct, ProductQuery, filter_by_status,
};
use segishop_core::import::{ImportReport, export_products, template};
use segishop_core::types::{CategoryId, ProductId, StatusFilter, StockStatus};
use segishop_core::upload::ImageSlot;

use crate::components::{Notice, NoticeKind, NoticeQuery, Pager, redirect_with};
use crate::error::AppError;
use crate::filters;
use crate::routes::render;
use crate::services::{ImageStaging, ProductImportService};
use crate::state::AppState;

use super::shipping::{merge_errors, number_or, optional_decimal, required_decimal};

const CURRENT_PATH: &str = "/products";
const PAGE_SIZE: u32 = 20;
/// Ten 5 MB images plus the text fields.
const MAX_UPLOAD_BODY: usize = 64 * 1024 * 1024;

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(create))
        .route("/new", get(new_product))
        .route("/bulk-status", post(bulk_status))
        .route("/import", get(import_page).post(import))
        .route("/import/template", get(download_template))
        .route("/export", get(export))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY))
}

// =============================================================================
// List
// =============================================================================

/// Product list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub status: Option<StatusFilter>,
    pub page: Option<u32>,
}

impl ProductListQuery {
    fn status(&self) -> StatusFilter {
        self.status.unwrap_or_default()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    }

    fn category(&self) -> Option<CategoryId> {
        self.category_id.filter(|id| id.is_set())
    }

    fn api_query(&self) -> ProductQuery {
        ProductQuery {
            search_term: self.search_term(),
            category_id: self.category(),
            page: self.page.unwrap_or(1).max(1),
            page_size: PAGE_SIZE,
        }
    }

    /// Link to `page` keeping the other filters.
    fn href(&self, page: u32) -> String {
        let mut href = format!("{CURRENT_PATH}?page={page}");
        if let Some(search) = self.search_term() {
            href.push_str("&search=");
            href.push_str(&urlencoding::encode(&search));
        }
        if let Some(category) = self.category() {
            href.push_str(&format!("&category_id={category}"));
        }
        if self.status() != StatusFilter::All {
            href.push_str("&status=");
            href.push_str(self.status().as_str());
        }
        href
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub products: Vec<AdminProduct>,
    pub categories: Vec<Category>,
    pub statuses: &'static [StatusFilter],
    pub query: ProductListQuery,
    pub pager: Option<Pager>,
    /// Where bulk actions send the operator back to.
    pub return_to: String,
    pub notices: Vec<Notice>,
    pub load_error: Option<String>,
}

impl ProductsIndexTemplate {
    fn search_value(&self) -> String {
        self.query.search.clone().unwrap_or_default()
    }

    fn status_selected(&self, status: &StatusFilter) -> bool {
        self.query.status() == *status
    }

    fn category_selected(&self, category: &Category) -> bool {
        self.query.category() == Some(category.id)
    }

    fn stock_class(&self, product: &AdminProduct) -> &'static str {
        match product.stock_status() {
            StockStatus::OutOfStock => "bg-red-100 text-red-700",
            StockStatus::LowStock => "bg-yellow-100 text-yellow-700",
            StockStatus::InStock => "bg-green-100 text-green-700",
        }
    }
}

/// Products list page handler.
#[instrument(skip(state, notices))]
pub async fn index(
    State(state): State<AppState>,
    ListQuery(query): ListQuery<ProductListQuery>,
    Query(notices): Query<NoticeQuery>,
) -> Html<String> {
    let api_query = query.api_query();
    let (page, categories) = tokio::join!(
        state.catalog().list_products(&api_query),
        state.catalog().list_categories(),
    );

    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch categories: {e}");
        Vec::new()
    });

    let (products, pager, load_error) = match page {
        Ok(page) => {
            let pager = Pager::new(&page, |n| query.href(n));
            (filter_by_status(page.items, query.status()), Some(pager), None)
        }
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (Vec::new(), None, Some(e.user_message()))
        }
    };

    render(&ProductsIndexTemplate {
        current_path: CURRENT_PATH.to_string(),
        products,
        categories,
        statuses: &StatusFilter::ALL,
        return_to: query.href(api_query.page),
        query,
        pager,
        notices: notices.notices(),
        load_error,
    })
}

/// Bulk activate/deactivate form.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkStatusForm {
    pub intent: String,
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub return_to: String,
}

impl BulkStatusForm {
    /// Only paths on the product list are followed back.
    fn return_path(&self) -> &str {
        if self.return_to.starts_with(CURRENT_PATH) {
            &self.return_to
        } else {
            CURRENT_PATH
        }
    }
}

/// Bulk status handler: one API call for the whole selection.
#[instrument(skip(state, form), fields(intent = %form.intent, count = form.product_ids.len()))]
pub async fn bulk_status(State(state): State<AppState>, Form(form): Form<BulkStatusForm>) -> Redirect {
    let back = form.return_path();
    let is_active = match form.intent.as_str() {
        "activate" => true,
        "deactivate" => false,
        other => {
            return redirect_with(back, NoticeKind::Error, &format!("Unknown action: {other}"));
        }
    };
    if form.product_ids.is_empty() {
        return redirect_with(back, NoticeKind::Error, "Select at least one product");
    }

    let update = BulkStatusUpdate {
        product_ids: form.product_ids.clone(),
        is_active,
    };
    match state.catalog().bulk_update_status(&update).await {
        Ok(result) => {
            tracing::info!(updated = result.updated_count, is_active, "Bulk product status updated");
            let message = result.message.unwrap_or_else(|| {
                format!(
                    "{} products {}",
                    result.updated_count,
                    if is_active { "activated" } else { "deactivated" }
                )
            });
            redirect_with(back, NoticeKind::Success, &message)
        }
        Err(e) => {
            tracing::error!(error = %e, "Bulk product status update failed");
            redirect_with(back, NoticeKind::Alert, &e.user_message())
        }
    }
}

// =============================================================================
// Create
// =============================================================================

/// Raw product form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormInput {
    pub name: String,
    pub description: String,
    pub price: String,
    pub sale_price: String,
    pub sku: String,
    pub stock: String,
    pub category_id: String,
    pub is_active: bool,
    pub is_featured: bool,
    pub image_url: String,
    pub meta_title: String,
    pub meta_description: String,
    pub slug: String,
}

impl ProductFormInput {
    fn blank() -> Self {
        Self {
            stock: "0".to_string(),
            is_active: true,
            ..Self::default()
        }
    }

    /// Take one text field from the multipart body. Unknown names are ignored.
    fn set(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "price" => self.price = value,
            "sale_price" => self.sale_price = value,
            "sku" => self.sku = value,
            "stock" => self.stock = value,
            "category_id" => self.category_id = value,
            "is_active" => self.is_active = true,
            "is_featured" => self.is_featured = true,
            "image_url" => self.image_url = value,
            "meta_title" => self.meta_title = value,
            "meta_description" => self.meta_description = value,
            "slug" => self.slug = value,
            _ => {}
        }
    }

    fn is_category(&self, category: &Category) -> bool {
        self.category_id.trim() == category.id.to_string()
    }

    /// Parse into an API body. Images are attached after upload.
    fn parse(&self) -> Result<NewProduct, FieldErrors> {
        let mut errors = FieldErrors::new();
        let price = required_decimal(&mut errors, "price", "Price", &self.price);
        let sale_price = optional_decimal(&mut errors, "sale_price", "Sale price", &self.sale_price);
        let stock = number_or(&mut errors, "stock", "Stock", &self.stock, 0);
        let category_id = number_or(
            &mut errors,
            "category_id",
            "Category",
            &self.category_id,
            CategoryId::new(0),
        );

        let product = NewProduct {
            name: self.name.clone(),
            description: self.description.clone(),
            price,
            sale_price,
            sku: Some(self.sku.clone()),
            stock,
            image_url: Some(self.image_url.clone()),
            category_id,
            is_active: self.is_active,
            is_featured: self.is_featured,
            meta_title: Some(self.meta_title.clone()),
            meta_description: Some(self.meta_description.clone()),
            slug: Some(self.slug.clone()),
            image_gallery: Vec::new(),
        };

        match product.validated() {
            Ok(product) if errors.is_empty() => Ok(product),
            Ok(_) => Err(errors),
            Err(invalid) => Err(merge_errors(errors, invalid)),
        }
    }
}

/// An image already attached to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    /// Value posted back in the hidden `image_slot` field.
    pub form_value: String,
    pub label: String,
    pub is_staged: bool,
}

impl ImageView {
    async fn for_slots(staging: &ImageStaging, slots: &[ImageSlot]) -> Vec<Self> {
        let mut views = Vec::with_capacity(slots.len());
        for slot in slots {
            let view = match slot {
                ImageSlot::Uploaded(url) => Self {
                    form_value: slot.form_value(),
                    label: url.clone(),
                    is_staged: false,
                },
                ImageSlot::Staged(id) => {
                    let Some(staged) = staging.get(id).await else {
                        continue;
                    };
                    Self {
                        form_value: slot.form_value(),
                        label: staged.file_name.clone(),
                        is_staged: true,
                    }
                }
            };
            views.push(view);
        }
        views
    }
}

/// New product form template.
#[derive(Template)]
#[template(path = "products/new.html")]
pub struct ProductFormTemplate {
    pub current_path: String,
    pub form: ProductFormInput,
    pub categories: Vec<Category>,
    pub images: Vec<ImageView>,
    pub upload_hint: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

async fn form_page(
    state: &AppState,
    form: ProductFormInput,
    slots: &[ImageSlot],
    errors: FieldErrors,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let categories = state.catalog().list_categories().await?;
    let images = ImageView::for_slots(state.staging(), slots).await;
    Ok(render(&ProductFormTemplate {
        current_path: CURRENT_PATH.to_string(),
        form,
        categories,
        images,
        upload_hint: state.staging().policy().hint(),
        errors,
        error,
    }))
}

/// New product form handler.
#[instrument(skip(state))]
pub async fn new_product(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    form_page(&state, ProductFormInput::blank(), &[], FieldErrors::new(), None).await
}

/// What a multipart product submission carried.
#[derive(Debug, Default)]
struct ProductSubmission {
    form: ProductFormInput,
    slots: Vec<ImageSlot>,
    upload_errors: Vec<String>,
}

struct PickedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl ProductSubmission {
    /// Read the body and stage newly picked files.
    async fn read(multipart: &mut Multipart, staging: &ImageStaging) -> Result<Self, AppError> {
        let mut submission = Self::default();
        let mut picked = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == "images" {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() {
                    picked.push(PickedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if name == "image_slot" {
                submission.slots.extend(ImageSlot::from_form_value(&value));
            } else {
                submission.form.set(&name, value);
            }
        }

        if let Err(e) = staging
            .policy()
            .check_count(submission.slots.len(), picked.len())
        {
            submission.upload_errors.push(e.to_string());
            return Ok(submission);
        }
        for file in picked {
            match staging
                .stage(&file.file_name, &file.content_type, file.bytes)
                .await
            {
                Ok(id) => submission.slots.push(ImageSlot::Staged(id)),
                Err(e) => submission
                    .upload_errors
                    .push(format!("{}: {e}", file.file_name)),
            }
        }
        Ok(submission)
    }
}

/// Split uploaded URLs into the main image and the gallery. A typed image
/// URL takes precedence as the main image.
fn attach_images(mut product: NewProduct, urls: Vec<String>) -> NewProduct {
    let mut urls = urls.into_iter();
    if product.image_url.is_none() {
        product.image_url = urls.next();
    }
    product.image_gallery = urls.collect();
    product
}

/// Create product handler.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = ProductSubmission::read(&mut multipart, state.staging()).await?;

    let mut errors = match submission.form.parse() {
        Ok(product) if submission.upload_errors.is_empty() => {
            let urls = state
                .staging()
                .resolve(state.catalog(), &submission.slots)
                .await;
            let uploaded: Vec<ImageSlot> = urls.iter().cloned().map(ImageSlot::Uploaded).collect();
            return match state.catalog().create_product(&attach_images(product, urls)).await {
                Ok(created) => {
                    tracing::info!(product_id = %created.id, name = %created.name, "Product created");
                    Ok(redirect_with(
                        CURRENT_PATH,
                        NoticeKind::Success,
                        &format!("Product \"{}\" created", created.name),
                    )
                    .into_response())
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create product");
                    Ok(form_page(
                        &state,
                        submission.form,
                        &uploaded,
                        FieldErrors::new(),
                        Some(e.user_message()),
                    )
                    .await?
                    .into_response())
                }
            };
        }
        Ok(_) => FieldErrors::new(),
        Err(errors) => errors,
    };

    if !submission.upload_errors.is_empty() {
        errors.add("images", submission.upload_errors.join(" "));
    }
    Ok(form_page(&state, submission.form, &submission.slots, errors, None)
        .await?
        .into_response())
}

// =============================================================================
// Import / export
// =============================================================================

/// Import page template; shows the report after an import ran.
#[derive(Template, WebTemplate)]
#[template(path = "products/import.html")]
pub struct ImportTemplate {
    pub current_path: String,
    pub error: Option<String>,
    pub report: Option<ImportReport>,
}

fn import_view(error: Option<String>, report: Option<ImportReport>) -> Html<String> {
    render(&ImportTemplate {
        current_path: format!("{CURRENT_PATH}/import"),
        error,
        report,
    })
}

/// Import form handler.
#[instrument]
pub async fn import_page() -> ImportTemplate {
    ImportTemplate {
        current_path: format!("{CURRENT_PATH}/import"),
        error: None,
        report: None,
    }
}

/// Import handler. Reads the `file` part and creates every valid row.
#[instrument(skip(state, multipart))]
pub async fn import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            file = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?,
            );
        }
    }

    let Some(bytes) = file.filter(|b| !b.is_empty()) else {
        return Ok(import_view(Some("Choose a CSV file to import.".to_string()), None));
    };

    match ProductImportService::new(state.catalog())
        .import(Cursor::new(bytes))
        .await
    {
        Ok(report) => Ok(import_view(None, Some(report))),
        Err(e) => {
            tracing::warn!(error = %e, "Product import rejected");
            Ok(import_view(Some(e.to_string()), None))
        }
    }
}

fn csv_download(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Import template download handler.
#[instrument]
pub async fn download_template() -> Result<Response, AppError> {
    let body = template().map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(csv_download("product-import-template.csv", body))
}

/// Export handler: every product, page by page, in the import format.
#[instrument(skip(state))]
pub async fn export(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = ProductImportService::new(state.catalog()).fetch_all().await?;

    let body = export_products(&products).map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(count = products.len(), "Products exported");
    let file_name = format!("products-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
    Ok(csv_download(&file_name, body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn filled_form() -> ProductFormInput {
        ProductFormInput {
            name: " Mango Chutney ".to_string(),
            description: "Sweet and hot".to_string(),
            price: "6.50".to_string(),
            stock: "12".to_string(),
            category_id: "3".to_string(),
            ..ProductFormInput::blank()
        }
    }

    // =========================================================================
    // List query
    // =========================================================================

    #[test]
    fn test_list_href_keeps_filters() {
        let query = ProductListQuery {
            search: Some("hot sauce".to_string()),
            category_id: Some(CategoryId::new(4)),
            status: Some(StatusFilter::OutOfStock),
            page: Some(1),
        };
        assert_eq!(
            query.href(2),
            "/products?page=2&search=hot%20sauce&category_id=4&status=out-of-stock"
        );
    }

    #[test]
    fn test_list_href_drops_blank_filters() {
        let query = ProductListQuery {
            search: Some("  ".to_string()),
            category_id: Some(CategoryId::new(0)),
            ..ProductListQuery::default()
        };
        assert_eq!(query.href(1), "/products?page=1");
        assert_eq!(query.api_query().search_term, None);
        assert_eq!(query.api_query().category_id, None);
        assert_eq!(query.api_query().page, 1);
    }

    #[test]
    fn test_bulk_return_path_stays_on_product_list() {
        let form = BulkStatusForm {
            intent: "activate".to_string(),
            product_ids: Vec::new(),
            return_to: "https://evil.example/".to_string(),
        };
        assert_eq!(form.return_path(), "/products");

        let form = BulkStatusForm {
            return_to: "/products?page=3".to_string(),
            ..form
        };
        assert_eq!(form.return_path(), "/products?page=3");
    }

    // =========================================================================
    // Form parsing
    // =========================================================================

    #[test]
    fn test_parse_valid_form() {
        let product = filled_form().parse().unwrap();
        assert_eq!(product.name, "Mango Chutney");
        assert_eq!(product.price, Decimal::new(650, 2));
        assert_eq!(product.stock, 12);
        assert_eq!(product.category_id, CategoryId::new(3));
        assert!(product.is_active);
        assert_eq!(product.sku, None);
        assert_eq!(product.image_url, None);
    }

    #[test]
    fn test_parse_collects_every_problem() {
        let form = ProductFormInput {
            price: "free".to_string(),
            category_id: String::new(),
            ..ProductFormInput::blank()
        };
        let errors = form.parse().unwrap_err();
        assert_eq!(errors.get("price"), Some("Price must be a number"));
        assert!(errors.has("name"));
        assert!(errors.has("description"));
        assert!(errors.has("category_id"));
    }

    #[test]
    fn test_checkbox_fields_are_presence_based() {
        let mut form = ProductFormInput::default();
        assert!(!form.is_active);
        form.set("is_featured", "on".to_string());
        form.set("unknown", "x".to_string());
        assert!(form.is_featured);
        assert!(!form.is_active);
    }

    #[test]
    fn test_attach_images_splits_main_and_gallery() {
        let product = filled_form().parse().unwrap();
        let urls = vec!["a.png".to_string(), "b.png".to_string(), "c.png".to_string()];
        let product = attach_images(product, urls.clone());
        assert_eq!(product.image_url.as_deref(), Some("a.png"));
        assert_eq!(product.image_gallery, vec!["b.png", "c.png"]);

        let mut form = filled_form();
        form.image_url = "main.png".to_string();
        let product = attach_images(form.parse().unwrap(), urls);
        assert_eq!(product.image_url.as_deref(), Some("main.png"));
        assert_eq!(product.image_gallery.len(), 3);
    }
}

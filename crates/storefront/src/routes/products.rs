//! Product route handlers: listing, detail and review submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use segishop_core::catalog::{Product, ProductQuery};
use segishop_core::review::{MODERATION_NOTICE, RatingBar, ReviewDraft, ReviewPage};
use segishop_core::types::{CategoryId, Page, PageRequest, ProductId};
use segishop_core::validation::FieldErrors;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::ShopperSession;
use crate::routes::Chrome;
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PAGE_SIZE: u32 = 12;

/// Listing filters as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub page: Option<String>,
}

impl ListingQuery {
    fn search(&self) -> String {
        self.search.as_deref().map(str::trim).unwrap_or_default().to_string()
    }

    fn category(&self) -> Option<CategoryId> {
        self.category_id
            .as_deref()
            .and_then(|v| v.parse::<CategoryId>().ok())
            .filter(CategoryId::is_set)
    }

    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1)
            .max(1)
    }

    fn to_product_query(&self) -> ProductQuery {
        ProductQuery {
            search_term: Some(self.search()).filter(|s| !s.is_empty()),
            category_id: self.category(),
            page: self.page(),
            page_size: PRODUCTS_PAGE_SIZE,
        }
    }
}

/// Detail page options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailQuery {
    pub reviews_page: Option<String>,
    /// Set to `submitted` after a successful review.
    pub review: Option<String>,
}

impl DetailQuery {
    fn reviews_page(&self) -> u32 {
        self.reviews_page
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// Review form fields. The rating arrives as text so an empty or garbled
/// value becomes a field error instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: String,
}

impl From<ReviewForm> for ReviewDraft {
    fn from(form: ReviewForm) -> Self {
        Self {
            rating: form.rating.as_deref().and_then(|r| r.trim().parse().ok()),
            title: form.title,
            review_text: form.review_text,
            reviewer_name: form.reviewer_name,
            reviewer_email: form.reviewer_email,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub products: Page<Product>,
    pub search: String,
    pub category_id: Option<CategoryId>,
    pub load_error: Option<String>,
}

impl ProductsIndexTemplate {
    /// Listing URL for `page` keeping the current filters.
    fn page_link(&self, page: u32) -> String {
        let mut link = format!("/products?page={page}");
        if !self.search.is_empty() {
            link.push_str("&search=");
            link.push_str(&urlencoding::encode(&self.search));
        }
        if let Some(category) = self.category_id {
            link.push_str(&format!("&category_id={category}"));
        }
        link
    }

    fn previous_link(&self) -> String {
        self.page_link(self.products.page.saturating_sub(1).max(1))
    }

    fn next_link(&self) -> String {
        self.page_link(self.products.page + 1)
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: Chrome,
    pub product: Product,
    pub reviews: ReviewPage,
    pub bars: Vec<RatingBar>,
    pub draft: ReviewForm,
    pub errors: FieldErrors,
    pub notice: Option<&'static str>,
    pub submit_error: Option<String>,
}

impl ProductShowTemplate {
    fn reviews_link(&self, page: u32) -> String {
        format!("/products/{}?reviews_page={page}#reviews", self.product.id)
    }

    fn previous_reviews_link(&self) -> String {
        self.reviews_link(self.reviews.page.saturating_sub(1).max(1))
    }

    fn next_reviews_link(&self) -> String {
        self.reviews_link(self.reviews.page + 1)
    }

    const fn rating_options(&self) -> [u8; 5] {
        [5, 4, 3, 2, 1]
    }

    fn rating_checked(&self, stars: &u8) -> bool {
        self.draft.rating.as_deref().map(str::trim) == Some(stars.to_string().as_str())
    }

    /// Bar width, whole percent.
    fn bar_width(&self, bar: &RatingBar) -> u32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = bar.percentage.round().clamp(0.0, 100.0) as u32;
        width
    }
}

/// Load reviews for the detail page. A failure shows an empty list.
async fn load_reviews(state: &AppState, product: ProductId, page: u32) -> ReviewPage {
    match state.catalog().list_reviews(product, page).await {
        Ok(reviews) => reviews,
        Err(e) => {
            tracing::warn!(product_id = %product, error = %e, "Reviews unavailable");
            ReviewPage::empty(page)
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product listing handler.
#[instrument(skip(state, shopper))]
pub async fn index(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let request = query.to_product_query();
    let (products, load_error) = match state.catalog().list_products(&request).await {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::error!("Failed to fetch products: {e}");
            (
                Page::empty(PageRequest::new(request.page, request.page_size)),
                Some(e.user_message()),
            )
        }
    };

    ProductsIndexTemplate {
        chrome: Chrome::load(&state, &shopper, request_path("/products", &query)).await,
        products,
        search: query.search(),
        category_id: query.category(),
        load_error,
    }
}

/// Product detail handler.
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Path(id): Path<ProductId>,
    Query(query): Query<DetailQuery>,
) -> Result<ProductShowTemplate, AppError> {
    let product = state.catalog().get_product(id).await?;
    let reviews = load_reviews(&state, id, query.reviews_page()).await;
    let notice = (query.review.as_deref() == Some("submitted")).then_some(MODERATION_NOTICE);

    Ok(ProductShowTemplate {
        chrome: Chrome::load(&state, &shopper, format!("/products/{id}")).await,
        bars: reviews.stats.bars(),
        product,
        reviews,
        draft: ReviewForm::default(),
        errors: FieldErrors::new(),
        notice,
        submit_error: None,
    })
}

/// Review submission handler.
///
/// Invalid drafts re-render the page with field errors. Accepted reviews go
/// to moderation, so the shopper is sent back to a notice rather than to
/// their review.
#[instrument(skip(state, shopper, form))]
pub async fn submit_review(
    State(state): State<AppState>,
    shopper: ShopperSession,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let draft = ReviewDraft::from(form.clone());
    let (errors, submit_error) = match draft.validate() {
        Ok(review) => match state.catalog().submit_review(id, &review).await {
            Ok(_) => {
                tracing::info!(product_id = %id, rating = review.rating, "Review submitted");
                let product_id = id.to_string();
                add_breadcrumb("reviews", "Submitted review", Some(&[("product_id", product_id.as_str())]));
                return Ok(Redirect::to(&format!("/products/{id}?review=submitted#reviews")).into_response());
            }
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "Review not accepted");
                (FieldErrors::new(), Some(e.user_message()))
            }
        },
        Err(errors) => (errors, None),
    };

    let product = state.catalog().get_product(id).await?;
    let reviews = load_reviews(&state, id, 1).await;
    Ok(ProductShowTemplate {
        chrome: Chrome::load(&state, &shopper, format!("/products/{id}")).await,
        bars: reviews.stats.bars(),
        product,
        reviews,
        draft: form,
        errors,
        notice: None,
        submit_error,
    }
    .into_response())
}

/// Listing path including its query, for the currency form's return link.
fn request_path(base: &str, query: &ListingQuery) -> String {
    let mut pairs = Vec::new();
    let search = query.search();
    if !search.is_empty() {
        pairs.push(format!("search={}", urlencoding::encode(&search)));
    }
    if let Some(category) = query.category() {
        pairs.push(format!("category_id={category}"));
    }
    if query.page() > 1 {
        pairs.push(format!("page={}", query.page()));
    }
    if pairs.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", pairs.join("&"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_query_cleans_input() {
        let query = ListingQuery {
            search: Some("  tea pot ".to_string()),
            category_id: Some("0".to_string()),
            page: Some("zero".to_string()),
        };
        let request = query.to_product_query();
        assert_eq!(request.search_term.as_deref(), Some("tea pot"));
        assert_eq!(request.category_id, None);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, PRODUCTS_PAGE_SIZE);
    }

    #[test]
    fn test_request_path_keeps_filters() {
        let query = ListingQuery {
            search: Some("tea pot".to_string()),
            category_id: Some("3".to_string()),
            page: Some("2".to_string()),
        };
        assert_eq!(
            request_path("/products", &query),
            "/products?search=tea%20pot&category_id=3&page=2"
        );
        assert_eq!(request_path("/products", &ListingQuery::default()), "/products");
    }

    #[test]
    fn test_review_form_tolerates_bad_rating() {
        let draft = ReviewDraft::from(ReviewForm {
            rating: Some(String::new()),
            ..ReviewForm::default()
        });
        assert_eq!(draft.rating, None);

        let draft = ReviewDraft::from(ReviewForm {
            rating: Some("4".to_string()),
            ..ReviewForm::default()
        });
        assert_eq!(draft.rating, Some(4));
    }

    #[test]
    fn test_detail_query_reviews_page() {
        assert_eq!(DetailQuery::default().reviews_page(), 1);
        let query = DetailQuery {
            reviews_page: Some("3".to_string()),
            review: None,
        };
        assert_eq!(query.reviews_page(), 3);
    }
}

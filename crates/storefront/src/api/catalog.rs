//! Product and review endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use segishop_core::catalog::{Product, ProductQuery};
use segishop_core::review::{NewReview, ProductReview, REVIEWS_PAGE_SIZE, ReviewPage};
use segishop_core::types::{Page, PageRequest, ProductId};

use super::types::{ProductPayload, ProductsPayload};
use super::{ApiError, StoreClient};

/// Catalog reads and review submission.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError>;
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError>;

    /// One page of approved reviews plus the product's rating stats.
    async fn list_reviews(&self, product: ProductId, page: u32) -> Result<ReviewPage, ApiError>;

    /// Submit a review for moderation. It is not visible until approved.
    async fn submit_review(
        &self,
        product: ProductId,
        review: &NewReview,
    ) -> Result<ProductReview, ApiError>;
}

#[async_trait]
impl CatalogApi for StoreClient {
    #[instrument(skip(self))]
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let page = PageRequest::new(query.page, query.page_size);
        let pairs = [
            (
                "categoryId",
                query.category_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
            (
                "searchTerm",
                query.search_term.as_deref().map(str::trim).unwrap_or_default().to_string(),
            ),
            ("page", page.page.to_string()),
            ("pageSize", page.page_size.to_string()),
        ];
        let payload: ProductsPayload = self.get("products", &pairs).await?;
        Ok(payload.into_page(page))
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let payload: ProductPayload = self.get(&format!("products/{id}"), &[]).await?;
        payload
            .product
            .ok_or_else(|| ApiError::NotFound(format!("Product {id}")))
    }

    #[instrument(skip(self))]
    async fn list_reviews(&self, product: ProductId, page: u32) -> Result<ReviewPage, ApiError> {
        let pairs = [
            ("page", page.max(1).to_string()),
            ("pageSize", REVIEWS_PAGE_SIZE.to_string()),
        ];
        self.get(&format!("products/{product}/reviews"), &pairs).await
    }

    #[instrument(skip(self, review), fields(rating = review.rating))]
    async fn submit_review(
        &self,
        product: ProductId,
        review: &NewReview,
    ) -> Result<ProductReview, ApiError> {
        self.send_json(Method::POST, &format!("products/{product}/reviews"), review)
            .await
    }
}

//! Catalog endpoints: products, categories and image upload.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use segishop_core::catalog::{AdminProduct, BulkStatusUpdate, Category, NewProduct, ProductQuery};
use segishop_core::types::{Page, PageRequest};
use segishop_core::upload::UploadedImage;

use super::types::{AdminProductsPayload, BulkStatusResult, CategoriesPayload, ProductPayload};
use super::{ApiError, SegishopClient};

/// Product catalog operations used by the admin console and the CLI.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<AdminProduct>, ApiError>;
    async fn create_product(&self, product: &NewProduct) -> Result<AdminProduct, ApiError>;
    async fn bulk_update_status(
        &self,
        update: &BulkStatusUpdate,
    ) -> Result<BulkStatusResult, ApiError>;
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Upload one image and return the URL the API stored it under.
    async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError>;
}

#[async_trait]
impl CatalogApi for SegishopClient {
    #[instrument(skip(self))]
    async fn list_products(&self, query: &ProductQuery) -> Result<Page<AdminProduct>, ApiError> {
        let page = PageRequest::new(query.page, query.page_size);
        let pairs = [
            (
                "searchTerm",
                query.search_term.as_deref().map(str::trim).unwrap_or_default().to_string(),
            ),
            (
                "categoryId",
                query.category_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
            ("page", page.page.to_string()),
            ("pageSize", page.page_size.to_string()),
        ];
        let payload: AdminProductsPayload = self.get("admin/products", &pairs).await?;
        Ok(payload.into_page(page))
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: &NewProduct) -> Result<AdminProduct, ApiError> {
        let payload: ProductPayload = self
            .send_json(Method::POST, "admin/products", product)
            .await?;
        payload
            .product
            .ok_or_else(|| ApiError::Parse("response carried no product".to_string()))
    }

    #[instrument(skip(self, update), fields(count = update.product_ids.len(), is_active = update.is_active))]
    async fn bulk_update_status(
        &self,
        update: &BulkStatusUpdate,
    ) -> Result<BulkStatusResult, ApiError> {
        self.send_json(Method::PATCH, "admin/products/bulk-status", update)
            .await
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let payload: CategoriesPayload = self.get("admin/categories", &[]).await?;
        Ok(payload.categories)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let uploaded: UploadedImage = self.post_multipart("admin/image/upload", form).await?;
        uploaded.image_url.ok_or_else(|| {
            ApiError::Rejected(
                uploaded
                    .message
                    .unwrap_or_else(|| format!("Upload of {file_name} returned no URL")),
            )
        })
    }
}

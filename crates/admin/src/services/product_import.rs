//! Product CSV import and export against the catalog API.

use std::io::Read;

use tracing::{info, instrument, warn};

use segishop_core::catalog::{AdminProduct, ProductQuery};
use segishop_core::import::{ImportError, ImportReport, parse_products};
use segishop_core::types::PageRequest;

use crate::api::{ApiError, CatalogApi};

/// Page size used when walking the whole catalog for an export.
pub const EXPORT_PAGE_SIZE: u32 = 100;

/// Creates the valid rows of an import file one at a time.
pub struct ProductImportService<'a> {
    api: &'a dyn CatalogApi,
}

impl<'a> ProductImportService<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn CatalogApi) -> Self {
        Self { api }
    }

    /// Validate the file, then create every valid product.
    ///
    /// Rows the API rejects are recorded in the report; products created
    /// before a failure stay created.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] when the file itself is unreadable, empty or
    /// missing required columns. No product is created in that case.
    #[instrument(skip(self, reader))]
    pub async fn import(&self, reader: impl Read + Send) -> Result<ImportReport, ImportError> {
        let parsed = parse_products(reader)?;
        let mut report = ImportReport::from_parsed(&parsed);

        for row in &parsed.valid {
            match self.api.create_product(&row.product).await {
                Ok(created) => {
                    info!(row = row.row, product_id = %created.id, "Imported product");
                    report.record_created();
                }
                Err(e) => {
                    warn!(row = row.row, name = %row.product.name, error = %e, "Product import row failed");
                    report.record_failure(row, &e.user_message());
                }
            }
        }

        info!(
            total = report.total_rows,
            created = report.success_count,
            failed = report.error_count,
            "Product import finished"
        );
        Ok(report)
    }

    /// Every product in the catalog, fetched page by page.
    ///
    /// # Errors
    ///
    /// Returns the first API error; nothing partial is returned.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<AdminProduct>, ApiError> {
        let mut products = Vec::new();
        let mut request = PageRequest::first(EXPORT_PAGE_SIZE);
        loop {
            let page = self
                .api
                .list_products(&ProductQuery {
                    page: request.page,
                    page_size: request.page_size,
                    ..ProductQuery::default()
                })
                .await?;
            let more = page.has_next() && !page.items.is_empty();
            products.extend(page.items);
            if !more {
                break;
            }
            request = PageRequest::new(request.page + 1, EXPORT_PAGE_SIZE);
        }
        info!(count = products.len(), "Fetched catalog for export");
        Ok(products)
    }
}

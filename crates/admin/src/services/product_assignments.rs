//! Product to shipping class assignment.
//!
//! The class detail page shows two lists side by side, each with its own
//! page and search. Assign and remove send every selected id in one request.

use serde::Deserialize;
use tracing::{info, instrument};

use segishop_core::catalog::ProductSummary;
use segishop_core::shipping::{Selection, ShippingClass};
use segishop_core::types::{ClassId, Page, PageRequest, ProductId};
use segishop_core::validation::non_blank;

use crate::api::{ApiError, ShippingApi};

/// Rows per page in both lists.
pub const PRODUCT_PAGE_SIZE: u32 = 10;

/// Page and search of one product list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub search: Option<String>,
}

impl ListQuery {
    /// Page request for this list; page 0 means the first page.
    #[must_use]
    pub const fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, PRODUCT_PAGE_SIZE)
    }

    /// Trimmed search term, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<String> {
        non_blank(self.search.as_deref())
    }

    /// Apply a new search term. A changed term starts over at page 1.
    #[must_use]
    pub fn with_search(self, search: Option<String>) -> Self {
        let search = non_blank(search.as_deref());
        if search == self.search_term() {
            Self { search, ..self }
        } else {
            Self { page: 1, search }
        }
    }
}

/// Both lists for one class.
#[derive(Debug, Clone)]
pub struct ClassProductLists {
    pub assigned: Page<ProductSummary>,
    pub unassigned: Page<ProductSummary>,
}

pub struct ProductAssignmentService<'a> {
    api: &'a dyn ShippingApi,
}

impl<'a> ProductAssignmentService<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn ShippingApi) -> Self {
        Self { api }
    }

    /// Fetch both lists concurrently at their own page and search.
    ///
    /// # Errors
    ///
    /// Returns the first API error if either list fails to load.
    pub async fn load(
        &self,
        class_id: ClassId,
        assigned: &ListQuery,
        unassigned: &ListQuery,
    ) -> Result<ClassProductLists, ApiError> {
        let assigned_search = assigned.search_term();
        let unassigned_search = unassigned.search_term();
        let (assigned, unassigned) = tokio::join!(
            self.api
                .class_products(class_id, assigned.page_request(), assigned_search.as_deref()),
            self.api
                .unassigned_products(unassigned.page_request(), unassigned_search.as_deref()),
        );
        Ok(ClassProductLists {
            assigned: assigned?,
            unassigned: unassigned?,
        })
    }

    /// Assign every selected product to `class`.
    ///
    /// # Errors
    ///
    /// Returns a rejection for an empty selection, or the API error.
    #[instrument(skip(self, class, selection), fields(class_id = %class.id, count = selection.len()))]
    pub async fn assign(
        &self,
        class: &ShippingClass,
        selection: &Selection<ProductId>,
    ) -> Result<String, ApiError> {
        let ids = require_selection(selection)?;
        self.api.assign_products(class.id, &ids).await?;
        info!(class_id = %class.id, count = ids.len(), "Products assigned to shipping class");
        Ok(format!(
            "Successfully assigned {} products to {}",
            ids.len(),
            class.name
        ))
    }

    /// Remove every selected product from `class`.
    ///
    /// # Errors
    ///
    /// Returns a rejection for an empty selection, or the API error.
    #[instrument(skip(self, class, selection), fields(class_id = %class.id, count = selection.len()))]
    pub async fn remove(
        &self,
        class: &ShippingClass,
        selection: &Selection<ProductId>,
    ) -> Result<String, ApiError> {
        let ids = require_selection(selection)?;
        self.api.remove_products(class.id, &ids).await?;
        info!(class_id = %class.id, count = ids.len(), "Products removed from shipping class");
        Ok(format!(
            "Successfully removed {} products from {}",
            ids.len(),
            class.name
        ))
    }
}

fn require_selection(selection: &Selection<ProductId>) -> Result<Vec<ProductId>, ApiError> {
    if selection.is_empty() {
        return Err(ApiError::Rejected(
            "Select at least one product first".to_string(),
        ));
    }
    Ok(selection.ids())
}

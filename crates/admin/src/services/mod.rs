//! Business logic services for admin.
//!
//! Services sit between route handlers and the API client. They borrow the
//! client as a trait object so the CLI and tests can drive them too.
//!
//! # Services
//!
//! - `zone_assignments` - Assign one shipping method to many zones
//! - `product_assignments` - Assign products to a shipping class
//! - `class_cost_form` - Create and edit shipping class costs
//! - `image_staging` - Deferred product image upload
//! - `product_import` - Product CSV import

pub mod class_cost_form;
pub mod image_staging;
pub mod product_assignments;
pub mod product_import;
pub mod zone_assignments;

pub use class_cost_form::{ClassCostFormService, CostForm, CostFormError, CostFormInput};
pub use image_staging::{ImageStaging, StagedImage};
pub use product_assignments::{
    ClassProductLists, ListQuery, PRODUCT_PAGE_SIZE, ProductAssignmentService,
};
pub use product_import::ProductImportService;
pub use zone_assignments::{AssignmentAction, AssignmentOutcome, ZoneAssignmentService};

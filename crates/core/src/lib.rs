//! Segishop Core - Shared domain library.
//!
//! This crate provides the types and rules used across all Segishop components:
//! - `admin` - Admin console for shipping configuration and the product catalog
//! - `storefront` - Shopper-facing site with cart, reviews and currency selection
//! - `cli` - Command-line tools for CSV import/export and bulk shipping changes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything that needs the external API lives in the crates above.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices and currencies, emails, enums, paging
//! - [`shipping`] - Zones, methods, classes, class costs and assignment rules
//! - [`catalog`] - Products and categories
//! - [`cart`] - Guest and customer carts, line attributes, unit prices
//! - [`review`] - Review submission checks and rating summaries
//! - [`import`] - Product CSV import and export
//! - [`upload`] - Image upload limits
//! - [`slug`] - URL slug generation
//! - [`validation`] - Field-keyed form errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod import;
pub mod review;
pub mod shipping;
pub mod slug;
pub mod types;
pub mod upload;
pub mod validation;

pub use types::*;
pub use validation::FieldErrors;

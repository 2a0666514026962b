//! Shipping zones, methods, classes and class costs.
//!
//! Zones group regions; methods are bound into zones through zone methods;
//! classes group products; a class cost prices one class for one zone
//! method. This module holds the shapes and the client-side rules, the API
//! owns persistence and cost computation.

pub mod assignment;
pub mod model;
pub mod rules;

pub use assignment::{BatchReport, ItemOutcome, ItemResult, Selection, ZonePartition};
pub use model::{
    ClassCost, ClassCostKey, ClassCostUpdate, ClassInput, MethodInput, NewClassCost,
    NewZoneMethod, RegionInput, ShippingClass, ShippingMethod, ShippingOverview, ShippingZone,
    ZoneInput, ZoneMethod, ZoneRegion,
};
pub use rules::{
    ShippingRuleError, ensure_method_not_assigned, ensure_region_unique, ensure_unique_cost_key,
    validate_regions,
};

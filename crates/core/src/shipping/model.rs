//! Shipping entities as exchanged with the API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    ClassCostId, ClassId, CostType, MethodId, MethodType, RegionId, RegionType, ZoneId,
    ZoneMethodId, timestamp,
};
use crate::validation::{FieldErrors, non_blank};

/// Longest accepted entity name.
pub const NAME_MAX: usize = 100;
/// Longest accepted entity description.
pub const DESCRIPTION_MAX: usize = 500;
/// Longest accepted zone method title.
pub const TITLE_MAX: usize = 200;
/// Longest accepted region code.
pub const REGION_CODE_MAX: usize = 10;

// =============================================================================
// Zones
// =============================================================================

/// A geographic shipping coverage area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingZone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_enabled: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub region_count: u32,
    #[serde(default)]
    pub method_count: u32,
    #[serde(default)]
    pub regions: Vec<ZoneRegion>,
    #[serde(default)]
    pub methods: Vec<ZoneMethod>,
}

impl ShippingZone {
    /// Whether any zone method in this zone references `method_id`.
    #[must_use]
    pub fn has_method(&self, method_id: MethodId) -> bool {
        self.methods
            .iter()
            .any(|m| m.shipping_method_id == method_id)
    }

    /// The zone method binding `method_id` to this zone, if assigned.
    #[must_use]
    pub fn zone_method_for(&self, method_id: MethodId) -> Option<&ZoneMethod> {
        self.methods
            .iter()
            .find(|m| m.shipping_method_id == method_id)
    }
}

/// A region included in (or excluded from) a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRegion {
    pub id: RegionId,
    pub region_type: RegionType,
    pub region_code: String,
    pub region_name: String,
    #[serde(default = "default_true")]
    pub is_included: bool,
    #[serde(default)]
    pub priority: i32,
}

/// Body for creating or updating a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_enabled: bool,
    pub sort_order: i32,
}

impl ZoneInput {
    /// Trim text fields and check lengths.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank or oversized name or an
    /// oversized description.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Zone name", &self.name, NAME_MAX);
        errors.limit_text("description", "Description", self.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()?;
        Ok(Self {
            name: self.name.trim().to_owned(),
            description: non_blank(self.description.as_deref()),
            ..self
        })
    }
}

impl From<&ShippingZone> for ZoneInput {
    fn from(zone: &ShippingZone) -> Self {
        Self {
            name: zone.name.clone(),
            description: zone.description.clone(),
            is_enabled: zone.is_enabled,
            sort_order: zone.sort_order,
        }
    }
}

/// Body for adding a region to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionInput {
    pub region_type: RegionType,
    pub region_code: String,
    pub region_name: String,
    pub is_included: bool,
    pub priority: i32,
}

impl RegionInput {
    /// Trim, upper-case the code and check lengths.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank or oversized code or name.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("region_code", "Region code", &self.region_code, REGION_CODE_MAX);
        errors.require_text("region_name", "Region name", &self.region_name, NAME_MAX);
        errors.into_result()?;
        Ok(Self {
            region_code: self.region_code.trim().to_uppercase(),
            region_name: self.region_name.trim().to_owned(),
            ..self
        })
    }
}

// =============================================================================
// Methods
// =============================================================================

/// A named delivery mechanism, independent of zones until assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: MethodId,
    pub name: String,
    pub method_type: MethodType,
    #[serde(default)]
    pub description: Option<String>,
    pub is_enabled: bool,
    #[serde(default)]
    pub is_taxable: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zone_count: u32,
}

/// Body for creating or updating a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MethodInput {
    pub name: String,
    pub method_type: MethodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_enabled: bool,
    pub is_taxable: bool,
}

impl MethodInput {
    /// Trim text fields and check lengths.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank or oversized name or an
    /// oversized description.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Method name", &self.name, NAME_MAX);
        errors.limit_text("description", "Description", self.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()?;
        Ok(Self {
            name: self.name.trim().to_owned(),
            description: non_blank(self.description.as_deref()),
            ..self
        })
    }
}

impl From<&ShippingMethod> for MethodInput {
    fn from(method: &ShippingMethod) -> Self {
        Self {
            name: method.name.clone(),
            method_type: method.method_type,
            description: method.description.clone(),
            is_enabled: method.is_enabled,
            is_taxable: method.is_taxable,
        }
    }
}

// =============================================================================
// Zone methods
// =============================================================================

/// A method's configuration inside one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMethod {
    pub id: ZoneMethodId,
    pub shipping_method_id: MethodId,
    #[serde(default)]
    pub shipping_method_name: String,
    pub title: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_cost: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub min_order_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub max_order_amount: Option<Decimal>,
    #[serde(default)]
    pub estimated_days_min: Option<u32>,
    #[serde(default)]
    pub estimated_days_max: Option<u32>,
    #[serde(default)]
    pub class_costs: Vec<ClassCost>,
}

impl ZoneMethod {
    /// "3-5 business days", "2 business days" or `None` when unknown.
    #[must_use]
    pub fn delivery_estimate(&self) -> Option<String> {
        match (self.estimated_days_min, self.estimated_days_max) {
            (Some(min), Some(max)) if min != max => Some(format!("{min}-{max} business days")),
            (Some(days), _) | (None, Some(days)) => Some(format!("{days} business days")),
            (None, None) => None,
        }
    }
}

/// Body for binding a method to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewZoneMethod {
    pub shipping_zone_id: ZoneId,
    pub shipping_method_id: MethodId,
    pub title: String,
    pub is_enabled: bool,
    pub sort_order: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_cost: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub min_order_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days_max: Option<u32>,
}

impl NewZoneMethod {
    /// The configuration a bulk assignment creates: titled after the method,
    /// free, enabled, first in sort order.
    #[must_use]
    pub fn default_for(zone_id: ZoneId, method: &ShippingMethod) -> Self {
        Self {
            shipping_zone_id: zone_id,
            shipping_method_id: method.id,
            title: method.name.clone(),
            is_enabled: true,
            sort_order: 0,
            base_cost: Decimal::ZERO,
            min_order_amount: None,
            estimated_days_min: None,
            estimated_days_max: None,
        }
    }

    /// Check the title, amounts and delivery window.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank or oversized title, negative
    /// amounts, or a minimum delivery estimate above the maximum.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", "Title", &self.title, TITLE_MAX);
        if self.base_cost.is_sign_negative() {
            errors.add("base_cost", "Base cost must be zero or more");
        }
        if self.min_order_amount.is_some_and(|a| a.is_sign_negative()) {
            errors.add("min_order_amount", "Minimum order amount must be zero or more");
        }
        if let (Some(min), Some(max)) = (self.estimated_days_min, self.estimated_days_max)
            && min > max
        {
            errors.add(
                "estimated_days_max",
                "Maximum delivery days must not be less than the minimum",
            );
        }
        errors.into_result()?;
        Ok(Self {
            title: self.title.trim().to_owned(),
            ..self
        })
    }
}

// =============================================================================
// Classes and class costs
// =============================================================================

/// A grouping of products sharing shipping characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingClass {
    pub id: ClassId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_count: u32,
    #[serde(default)]
    pub class_costs: Vec<ClassCost>,
}

/// Body for creating or updating a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassInput {
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClassInput {
    /// Trim text fields, normalise the slug and check lengths.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a blank or oversized name, a slug that
    /// normalises to nothing, or an oversized description.
    pub fn validated(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("name", "Class name", &self.name, NAME_MAX);
        let slug = crate::slug::generate_slug(&self.slug);
        if slug.trim_matches('-').is_empty() {
            errors.add("slug", "Slug is required");
        } else if slug.chars().count() > NAME_MAX {
            errors.add("slug", format!("Slug must be at most {NAME_MAX} characters"));
        }
        errors.limit_text("description", "Description", self.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()?;
        Ok(Self {
            name: self.name.trim().to_owned(),
            slug,
            description: non_blank(self.description.as_deref()),
        })
    }
}

impl From<&ShippingClass> for ClassInput {
    fn from(class: &ShippingClass) -> Self {
        Self {
            name: class.name.clone(),
            slug: class.slug.clone(),
            description: class.description.clone(),
        }
    }
}

/// Key that identifies a class cost: one zone method, one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassCostKey {
    pub zone_method_id: ZoneMethodId,
    pub class_id: ClassId,
}

/// Price rule for a (zone, method, class) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCost {
    pub id: ClassCostId,
    pub shipping_zone_method_id: ZoneMethodId,
    pub shipping_class_id: ClassId,
    #[serde(default)]
    pub shipping_zone_name: String,
    #[serde(default)]
    pub shipping_method_name: String,
    #[serde(default)]
    pub shipping_class_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub cost_type: CostType,
}

impl ClassCost {
    #[must_use]
    pub const fn key(&self) -> ClassCostKey {
        ClassCostKey {
            zone_method_id: self.shipping_zone_method_id,
            class_id: self.shipping_class_id,
        }
    }
}

/// Body for creating a class cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassCost {
    pub shipping_zone_method_id: ZoneMethodId,
    pub shipping_class_id: ClassId,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub cost_type: CostType,
}

impl NewClassCost {
    #[must_use]
    pub const fn key(&self) -> ClassCostKey {
        ClassCostKey {
            zone_method_id: self.shipping_zone_method_id,
            class_id: self.shipping_class_id,
        }
    }
}

/// Body for updating a class cost. The key is fixed after creation, so only
/// the amount and unit travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCostUpdate {
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub cost_type: CostType,
}

// =============================================================================
// Overview
// =============================================================================

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOverview {
    pub total_zones: u32,
    pub active_zones: u32,
    pub total_methods: u32,
    pub active_methods: u32,
    pub total_classes: u32,
    pub total_class_costs: u32,
    pub products_with_shipping_class: u32,
    pub products_without_shipping_class: u32,
}

impl ShippingOverview {
    /// Share of products that have a class, in whole percent.
    #[must_use]
    pub fn class_coverage_percent(&self) -> u32 {
        let total = self.products_with_shipping_class + self.products_without_shipping_class;
        if total == 0 {
            return 0;
        }
        (u64::from(self.products_with_shipping_class) * 100 / u64::from(total))
            .try_into()
            .unwrap_or(100)
    }
}

const fn default_true() -> bool {
    true
}

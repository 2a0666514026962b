//! Cross-entity consistency rules.
//!
//! The API enforces these too; checking them before a request lets forms
//! fail fast with the same wording the server would use.

use std::collections::HashSet;

use thiserror::Error;

use super::model::{ClassCost, ClassCostKey, RegionInput, ShippingZone, ZoneRegion};
use crate::types::{MethodId, RegionType};

/// A shipping rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingRuleError {
    #[error("A cost already exists for this shipping class and zone method combination")]
    DuplicateCostKey(ClassCostKey),

    #[error("Region code {code} is already listed for this zone as a {region_type}")]
    DuplicateRegion { region_type: RegionType, code: String },

    #[error("This shipping method is already assigned to this zone")]
    MethodAlreadyAssigned(MethodId),
}

/// Reject `key` when a cost for it already exists.
///
/// # Errors
///
/// Returns [`ShippingRuleError::DuplicateCostKey`] on a clash.
pub fn ensure_unique_cost_key(
    existing: &[ClassCost],
    key: ClassCostKey,
) -> Result<(), ShippingRuleError> {
    if existing.iter().any(|c| c.key() == key) {
        return Err(ShippingRuleError::DuplicateCostKey(key));
    }
    Ok(())
}

/// Reject assigning `method_id` to a zone that already has it.
///
/// # Errors
///
/// Returns [`ShippingRuleError::MethodAlreadyAssigned`] on a clash.
pub fn ensure_method_not_assigned(
    zone: &ShippingZone,
    method_id: MethodId,
) -> Result<(), ShippingRuleError> {
    if zone.has_method(method_id) {
        return Err(ShippingRuleError::MethodAlreadyAssigned(method_id));
    }
    Ok(())
}

fn region_key(region_type: RegionType, code: &str) -> (RegionType, String) {
    (region_type, code.trim().to_uppercase())
}

/// Reject adding a region whose code is already used in the zone for the
/// same region type. Codes compare case-insensitively.
///
/// # Errors
///
/// Returns [`ShippingRuleError::DuplicateRegion`] on a clash.
pub fn ensure_region_unique(
    existing: &[ZoneRegion],
    candidate: &RegionInput,
) -> Result<(), ShippingRuleError> {
    let (region_type, code) = region_key(candidate.region_type, &candidate.region_code);
    let clash = existing
        .iter()
        .any(|r| region_key(r.region_type, &r.region_code) == (region_type, code.clone()));
    if clash {
        return Err(ShippingRuleError::DuplicateRegion { region_type, code });
    }
    Ok(())
}

/// Every duplicate (type, code) pair in a zone's region list.
#[must_use]
pub fn validate_regions(regions: &[ZoneRegion]) -> Vec<ShippingRuleError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();
    for region in regions {
        let key = region_key(region.region_type, &region.region_code);
        if !seen.insert(key.clone()) && reported.insert(key.clone()) {
            errors.push(ShippingRuleError::DuplicateRegion {
                region_type: key.0,
                code: key.1,
            });
        }
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{ClassCostId, ClassId, CostType, RegionId, ZoneId, ZoneMethodId};

    fn cost(zone_method: i32, class: i32) -> ClassCost {
        ClassCost {
            id: ClassCostId::new(zone_method * 10 + class),
            shipping_zone_method_id: ZoneMethodId::new(zone_method),
            shipping_class_id: ClassId::new(class),
            shipping_zone_name: String::new(),
            shipping_method_name: String::new(),
            shipping_class_name: String::new(),
            cost: Decimal::ONE,
            cost_type: CostType::Fixed,
        }
    }

    fn region(id: i32, region_type: RegionType, code: &str) -> ZoneRegion {
        ZoneRegion {
            id: RegionId::new(id),
            region_type,
            region_code: code.to_string(),
            region_name: code.to_string(),
            is_included: true,
            priority: 0,
        }
    }

    #[test]
    fn test_duplicate_cost_key_rejected() {
        let existing = vec![cost(1, 1), cost(1, 2)];
        let key = ClassCostKey {
            zone_method_id: ZoneMethodId::new(1),
            class_id: ClassId::new(2),
        };
        let err = ensure_unique_cost_key(&existing, key).unwrap_err();
        assert_eq!(
            err.to_string(),
            "A cost already exists for this shipping class and zone method combination"
        );
    }

    #[test]
    fn test_same_class_other_zone_method_allowed() {
        let existing = vec![cost(1, 2)];
        let key = ClassCostKey {
            zone_method_id: ZoneMethodId::new(2),
            class_id: ClassId::new(2),
        };
        assert!(ensure_unique_cost_key(&existing, key).is_ok());
    }

    #[test]
    fn test_region_unique_per_type() {
        let existing = vec![region(1, RegionType::State, "CA")];
        let same = RegionInput {
            region_type: RegionType::State,
            region_code: "ca ".to_string(),
            region_name: "California".to_string(),
            is_included: true,
            priority: 0,
        };
        assert!(matches!(
            ensure_region_unique(&existing, &same),
            Err(ShippingRuleError::DuplicateRegion { .. })
        ));

        // Same code, different type: Canada the country
        let other_type = RegionInput {
            region_type: RegionType::Country,
            ..same
        };
        assert!(ensure_region_unique(&existing, &other_type).is_ok());
    }

    #[test]
    fn test_validate_regions_reports_each_pair_once() {
        let regions = vec![
            region(1, RegionType::State, "CA"),
            region(2, RegionType::State, "ca"),
            region(3, RegionType::State, "CA"),
            region(4, RegionType::Country, "CA"),
        ];
        assert_eq!(validate_regions(&regions).len(), 1);
    }

    #[test]
    fn test_method_already_assigned() {
        let zone = ShippingZone {
            id: ZoneId::new(1),
            name: "Domestic".to_string(),
            description: None,
            is_enabled: true,
            sort_order: 0,
            created_at: None,
            updated_at: None,
            region_count: 0,
            method_count: 0,
            regions: vec![],
            methods: vec![],
        };
        assert!(ensure_method_not_assigned(&zone, MethodId::new(1)).is_ok());
    }
}

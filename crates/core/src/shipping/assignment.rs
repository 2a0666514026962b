//! Zone/method partitioning, selections and batch outcomes.

use std::collections::BTreeSet;
use std::fmt;

use super::model::ShippingZone;
use crate::types::MethodId;

/// Zones split by whether a given method is assigned to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZonePartition {
    pub assigned: Vec<ShippingZone>,
    pub available: Vec<ShippingZone>,
}

impl ZonePartition {
    /// Partition `zones` for `method_id`, keeping their input order.
    ///
    /// A zone is assigned when at least one of its zone methods references
    /// the method; every zone lands in exactly one side.
    #[must_use]
    pub fn for_method(zones: Vec<ShippingZone>, method_id: MethodId) -> Self {
        let (assigned, available) = zones.into_iter().partition(|z| z.has_method(method_id));
        Self {
            assigned,
            available,
        }
    }

    #[must_use]
    pub fn is_assigned(&self, zone_id: crate::types::ZoneId) -> bool {
        self.assigned.iter().any(|z| z.id == zone_id)
    }

    #[must_use]
    pub fn is_available(&self, zone_id: crate::types::ZoneId) -> bool {
        self.available.iter().any(|z| z.id == zone_id)
    }
}

/// A set of checked rows in a bulk-action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T: Ord> {
    ids: BTreeSet<T>,
}

impl<T: Ord + Copy> Selection<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: BTreeSet::new(),
        }
    }

    /// Flip membership of `id`; returns whether it is now selected.
    pub fn toggle(&mut self, id: T) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn insert(&mut self, id: T) {
        self.ids.insert(id);
    }

    /// Select every id in `ids`, or clear when all of them are already
    /// selected (the "select all" checkbox).
    pub fn toggle_all(&mut self, ids: impl IntoIterator<Item = T>) {
        let ids: BTreeSet<T> = ids.into_iter().collect();
        if !ids.is_empty() && ids.is_subset(&self.ids) {
            self.ids.retain(|id| !ids.contains(id));
        } else {
            self.ids.extend(ids);
        }
    }

    /// Drop ids that are no longer offered, e.g. after a reload.
    pub fn retain_visible(&mut self, visible: impl IntoIterator<Item = T>) {
        let visible: BTreeSet<T> = visible.into_iter().collect();
        self.ids.retain(|id| visible.contains(id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn contains(&self, id: T) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<T> {
        self.ids.iter().copied().collect()
    }
}

impl<T: Ord + Copy> Default for Selection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Copy> FromIterator<T> for Selection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Result of one item in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,
    Failed(String),
}

/// One row of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult<T> {
    pub id: T,
    /// Display name of the item, e.g. the zone name.
    pub label: String,
    pub outcome: ItemOutcome,
}

impl<T> ItemResult<T> {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Succeeded)
    }

    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            ItemOutcome::Failed(reason) => Some(reason),
            ItemOutcome::Succeeded => None,
        }
    }
}

/// Per-item outcomes of a fan-out operation.
///
/// Items that succeeded stay applied even when others fail; the report is
/// what tells the user which ones need another try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<T> {
    pub items: Vec<ItemResult<T>>,
}

impl<T> BatchReport<T> {
    #[must_use]
    pub const fn new(items: Vec<ItemResult<T>>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.items.iter().all(ItemResult::succeeded)
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|i| i.succeeded()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult<T>> {
        self.items.iter().filter(|i| !i.succeeded())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.items.len() - self.success_count()
    }

    /// Single aggregated error line for the whole batch, `None` on success.
    #[must_use]
    pub fn aggregated_error(&self, action: &str) -> Option<String> {
        if self.is_complete_success() {
            return None;
        }
        let details = self
            .failures()
            .map(|f| match &f.outcome {
                ItemOutcome::Failed(reason) => format!("{} ({reason})", f.label),
                ItemOutcome::Succeeded => f.label.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "Failed to {action} {} of {} item(s): {details}",
            self.failure_count(),
            self.items.len()
        ))
    }
}

impl<T> fmt::Display for BatchReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed",
            self.success_count(),
            self.failure_count()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::shipping::model::ZoneMethod;
    use crate::types::{ZoneId, ZoneMethodId};

    fn zone(id: i32, name: &str, method_ids: &[i32]) -> ShippingZone {
        ShippingZone {
            id: ZoneId::new(id),
            name: name.to_string(),
            description: None,
            is_enabled: true,
            sort_order: 0,
            created_at: None,
            updated_at: None,
            region_count: 0,
            method_count: u32::try_from(method_ids.len()).unwrap(),
            regions: vec![],
            methods: method_ids
                .iter()
                .map(|m| ZoneMethod {
                    id: ZoneMethodId::new(id * 100 + m),
                    shipping_method_id: MethodId::new(*m),
                    shipping_method_name: String::new(),
                    title: String::new(),
                    is_enabled: true,
                    sort_order: 0,
                    base_cost: Decimal::ZERO,
                    min_order_amount: None,
                    max_order_amount: None,
                    estimated_days_min: None,
                    estimated_days_max: None,
                    class_costs: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let zones = vec![
            zone(1, "Domestic", &[1, 2]),
            zone(2, "Europe", &[2]),
            zone(3, "Asia", &[]),
        ];
        let partition = ZonePartition::for_method(zones, MethodId::new(1));

        assert_eq!(partition.assigned.len(), 1);
        assert_eq!(partition.available.len(), 2);
        assert!(partition.is_assigned(ZoneId::new(1)));
        assert!(!partition.is_available(ZoneId::new(1)));
        assert!(partition.is_available(ZoneId::new(2)));
        assert!(partition.is_available(ZoneId::new(3)));
    }

    #[test]
    fn test_partition_after_assignment_moves_zone() {
        let before = ZonePartition::for_method(vec![zone(5, "West Coast", &[])], MethodId::new(9));
        assert!(before.is_available(ZoneId::new(5)));

        let after = ZonePartition::for_method(vec![zone(5, "West Coast", &[9])], MethodId::new(9));
        assert!(after.is_assigned(ZoneId::new(5)));
        assert!(!after.is_available(ZoneId::new(5)));
    }

    #[test]
    fn test_selection_toggle() {
        let mut selection = Selection::new();
        assert!(selection.toggle(ZoneId::new(2)));
        assert!(selection.toggle(ZoneId::new(1)));
        assert!(!selection.toggle(ZoneId::new(2)));
        assert_eq!(selection.ids(), vec![ZoneId::new(1)]);
    }

    #[test]
    fn test_selection_toggle_all() {
        let mut selection: Selection<i32> = [1].into_iter().collect();
        selection.toggle_all([1, 2, 3]);
        assert_eq!(selection.ids(), vec![1, 2, 3]);
        selection.toggle_all([1, 2, 3]);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_selection_retain_visible() {
        let mut selection: Selection<i32> = [1, 2, 3].into_iter().collect();
        selection.retain_visible([2, 3, 4]);
        assert_eq!(selection.ids(), vec![2, 3]);
    }

    #[test]
    fn test_batch_report_aggregates_failures() {
        let report = BatchReport::new(vec![
            ItemResult {
                id: 1,
                label: "Domestic".to_string(),
                outcome: ItemOutcome::Succeeded,
            },
            ItemResult {
                id: 2,
                label: "Europe".to_string(),
                outcome: ItemOutcome::Failed("timeout".to_string()),
            },
        ]);
        assert!(!report.is_complete_success());
        assert_eq!(report.success_count(), 1);
        assert_eq!(
            report.aggregated_error("assign Flat Rate to").unwrap(),
            "Failed to assign Flat Rate to 1 of 2 item(s): Europe (timeout)"
        );
        assert_eq!(report.to_string(), "1 succeeded, 1 failed");
    }

    #[test]
    fn test_batch_report_success_has_no_error() {
        let report = BatchReport::new(vec![ItemResult {
            id: 1,
            label: "Domestic".to_string(),
            outcome: ItemOutcome::Succeeded,
        }]);
        assert!(report.aggregated_error("assign").is_none());
    }
}

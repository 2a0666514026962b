//! Assigning one shipping method to many zones.
//!
//! Each selected zone gets its own zone-method row, created concurrently.
//! There is no rollback: when some requests fail the ones that succeeded
//! stay, and the [`BatchReport`] says which zones need another try.

use futures::future::join_all;
use tracing::{info, instrument, warn};

use segishop_core::shipping::{
    BatchReport, ItemOutcome, ItemResult, NewZoneMethod, Selection, ShippingMethod, ShippingZone,
    ZonePartition, ensure_method_not_assigned,
};
use segishop_core::types::ZoneId;

use crate::api::ShippingApi;

/// Which way a batch goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentAction {
    Assign,
    Remove,
}

impl AssignmentAction {
    /// Verb used in the aggregated failure line.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Remove => "remove",
        }
    }
}

/// What the zones tab shows after a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub report: BatchReport<ZoneId>,
    /// Set only when every item succeeded.
    pub success_message: Option<String>,
    /// Set when any item failed.
    pub error_message: Option<String>,
}

impl AssignmentOutcome {
    fn from_report(
        report: BatchReport<ZoneId>,
        action: AssignmentAction,
        method_name: &str,
    ) -> Self {
        let error_message = report.aggregated_error(action.verb());
        let success_message = error_message.is_none().then(|| {
            let n = report.success_count();
            match action {
                AssignmentAction::Assign => {
                    format!("Successfully assigned {method_name} to {n} zone(s)")
                }
                AssignmentAction::Remove => {
                    format!("Successfully removed {method_name} from {n} zone(s)")
                }
            }
        });
        Self {
            report,
            success_message,
            error_message,
        }
    }

    /// Whether the selection should be cleared.
    #[must_use]
    pub fn clears_selection(&self) -> bool {
        self.report.is_complete_success()
    }
}

/// Zone fan-out for one method.
pub struct ZoneAssignmentService<'a> {
    api: &'a dyn ShippingApi,
}

impl<'a> ZoneAssignmentService<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn ShippingApi) -> Self {
        Self { api }
    }

    /// Load all zones and split them for `method`.
    ///
    /// # Errors
    ///
    /// Returns the API error if the zone list cannot be fetched.
    pub async fn partition(
        &self,
        method: &ShippingMethod,
    ) -> Result<ZonePartition, crate::api::ApiError> {
        let zones = self.api.list_zones().await?;
        Ok(ZonePartition::for_method(zones, method.id))
    }

    /// Create a default zone method for every selected available zone.
    ///
    /// Selected ids that are not in `partition.available` are ignored.
    #[instrument(skip(self, method, partition, selection), fields(method_id = %method.id, selected = selection.len()))]
    pub async fn assign(
        &self,
        method: &ShippingMethod,
        partition: &ZonePartition,
        selection: &Selection<ZoneId>,
    ) -> AssignmentOutcome {
        let targets = selected(&partition.available, selection);
        let results = join_all(targets.into_iter().map(|zone| self.assign_one(method, zone))).await;
        let outcome = AssignmentOutcome::from_report(
            BatchReport::new(results),
            AssignmentAction::Assign,
            &method.name,
        );
        log_outcome(&outcome, AssignmentAction::Assign);
        outcome
    }

    /// Delete the zone method for every selected assigned zone.
    ///
    /// Selected ids that are not in `partition.assigned` are ignored.
    #[instrument(skip(self, method, partition, selection), fields(method_id = %method.id, selected = selection.len()))]
    pub async fn remove(
        &self,
        method: &ShippingMethod,
        partition: &ZonePartition,
        selection: &Selection<ZoneId>,
    ) -> AssignmentOutcome {
        let targets = selected(&partition.assigned, selection);
        let results = join_all(targets.into_iter().map(|zone| async move {
            let outcome = match self.api.remove_zone_method(zone.id, method.id).await {
                Ok(_) => ItemOutcome::Succeeded,
                Err(e) => ItemOutcome::Failed(e.user_message()),
            };
            ItemResult {
                id: zone.id,
                label: zone.name.clone(),
                outcome,
            }
        }))
        .await;
        let outcome = AssignmentOutcome::from_report(
            BatchReport::new(results),
            AssignmentAction::Remove,
            &method.name,
        );
        log_outcome(&outcome, AssignmentAction::Remove);
        outcome
    }

    async fn assign_one(&self, method: &ShippingMethod, zone: &ShippingZone) -> ItemResult<ZoneId> {
        let outcome = match ensure_method_not_assigned(zone, method.id) {
            Err(e) => ItemOutcome::Failed(e.to_string()),
            Ok(()) => {
                let body = NewZoneMethod::default_for(zone.id, method);
                match self.api.create_zone_method(&body).await {
                    Ok(_) => ItemOutcome::Succeeded,
                    Err(e) => ItemOutcome::Failed(e.user_message()),
                }
            }
        };
        ItemResult {
            id: zone.id,
            label: zone.name.clone(),
            outcome,
        }
    }
}

fn selected<'z>(zones: &'z [ShippingZone], selection: &Selection<ZoneId>) -> Vec<&'z ShippingZone> {
    zones.iter().filter(|z| selection.contains(z.id)).collect()
}

fn log_outcome(outcome: &AssignmentOutcome, action: AssignmentAction) {
    match &outcome.error_message {
        None => info!(
            action = action.verb(),
            zones = outcome.report.success_count(),
            "Zone assignment batch completed"
        ),
        Some(message) => warn!(
            action = action.verb(),
            succeeded = outcome.report.success_count(),
            failed = outcome.report.failure_count(),
            error = %message,
            "Zone assignment batch partially failed"
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn report(outcomes: &[(i32, &str, Option<&str>)]) -> BatchReport<ZoneId> {
        BatchReport::new(
            outcomes
                .iter()
                .map(|(id, label, failure)| ItemResult {
                    id: ZoneId::new(*id),
                    label: (*label).to_string(),
                    outcome: failure.map_or(ItemOutcome::Succeeded, |f| {
                        ItemOutcome::Failed(f.to_string())
                    }),
                })
                .collect(),
        )
    }

    #[test]
    fn test_success_message_on_full_success() {
        let outcome = AssignmentOutcome::from_report(
            report(&[(1, "West Coast", None), (2, "East Coast", None)]),
            AssignmentAction::Assign,
            "Flat Rate",
        );
        assert_eq!(
            outcome.success_message.as_deref(),
            Some("Successfully assigned Flat Rate to 2 zone(s)")
        );
        assert!(outcome.error_message.is_none());
        assert!(outcome.clears_selection());
    }

    #[test]
    fn test_partial_failure_suppresses_success_message() {
        let outcome = AssignmentOutcome::from_report(
            report(&[(1, "West Coast", None), (2, "Alaska", Some("Internal server error"))]),
            AssignmentAction::Remove,
            "Express",
        );
        assert!(outcome.success_message.is_none());
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("Failed to remove 1 of 2 item(s): Alaska (Internal server error)")
        );
        assert!(!outcome.clears_selection());
    }

    #[test]
    fn test_remove_message_wording() {
        let outcome = AssignmentOutcome::from_report(
            report(&[(3, "Hawaii", None)]),
            AssignmentAction::Remove,
            "Express",
        );
        assert_eq!(
            outcome.success_message.as_deref(),
            Some("Successfully removed Express from 1 zone(s)")
        );
    }
}

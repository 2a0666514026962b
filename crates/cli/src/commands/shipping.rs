//! Shipping commands: counters and bulk zone assignment.

use tracing::{info, warn};

use segishop_admin::api::ShippingApi;
use segishop_admin::services::{AssignmentAction, AssignmentOutcome, ZoneAssignmentService};
use segishop_core::shipping::{Selection, ShippingZone};
use segishop_core::types::{MethodId, ZoneId};

use super::{CliError, client};

/// Log the configuration counters.
///
/// # Errors
///
/// Fails on configuration or API errors.
pub async fn overview() -> Result<(), CliError> {
    let api = client()?;
    let overview = api.overview().await?;
    info!(
        zones = overview.total_zones,
        active_zones = overview.active_zones,
        methods = overview.total_methods,
        active_methods = overview.active_methods,
        classes = overview.total_classes,
        class_costs = overview.total_class_costs,
        "Shipping configuration"
    );
    info!(
        with_class = overview.products_with_shipping_class,
        without_class = overview.products_without_shipping_class,
        coverage_percent = overview.class_coverage_percent(),
        "Shipping class coverage"
    );
    Ok(())
}

/// Assign `method` to the given zones, or to every zone it is missing from.
///
/// # Errors
///
/// Fails when the method or zones cannot be loaded, or when any zone failed.
pub async fn assign(method: MethodId, zones: &[ZoneId], all: bool) -> Result<(), CliError> {
    run(method, zones, all, AssignmentAction::Assign).await
}

/// Remove `method` from the given zones, or from every zone it is in.
///
/// # Errors
///
/// Fails when the method or zones cannot be loaded, or when any zone failed.
pub async fn remove(method: MethodId, zones: &[ZoneId], all: bool) -> Result<(), CliError> {
    run(method, zones, all, AssignmentAction::Remove).await
}

async fn run(
    method_id: MethodId,
    zones: &[ZoneId],
    all: bool,
    action: AssignmentAction,
) -> Result<(), CliError> {
    let api = client()?;
    let method = api.get_method(method_id).await?;
    let service = ZoneAssignmentService::new(&api);
    let partition = service.partition(&method).await?;

    let candidates = match action {
        AssignmentAction::Assign => &partition.available,
        AssignmentAction::Remove => &partition.assigned,
    };
    let selection = select(candidates, zones, all);
    if selection.is_empty() {
        warn!(method = %method.name, "No matching zones; nothing to {}", action.verb());
        return Ok(());
    }

    let outcome = match action {
        AssignmentAction::Assign => service.assign(&method, &partition, &selection).await,
        AssignmentAction::Remove => service.remove(&method, &partition, &selection).await,
    };
    finish(&outcome)
}

/// Requested ids that are valid for the action. Ids outside `candidates`
/// are logged and skipped.
fn select(candidates: &[ShippingZone], requested: &[ZoneId], all: bool) -> Selection<ZoneId> {
    if all {
        return candidates.iter().map(|z| z.id).collect();
    }
    requested
        .iter()
        .copied()
        .filter(|id| {
            let known = candidates.iter().any(|z| z.id == *id);
            if !known {
                warn!(zone_id = %id, "Zone skipped: not eligible for this action");
            }
            known
        })
        .collect()
}

fn finish(outcome: &AssignmentOutcome) -> Result<(), CliError> {
    for failure in outcome.report.failures() {
        warn!(
            zone_id = %failure.id,
            zone = %failure.label,
            reason = failure.failure_reason().unwrap_or_default(),
            "Zone failed"
        );
    }
    if let Some(message) = &outcome.success_message {
        info!("{message}");
    }
    outcome
        .error_message
        .clone()
        .map_or(Ok(()), |message| Err(CliError::Incomplete(message)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn zone(id: i32) -> ShippingZone {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Zone {id}"),
            "isEnabled": true,
        }))
        .unwrap()
    }

    #[test]
    fn test_select_all_takes_every_candidate() {
        let candidates = vec![zone(1), zone(4)];
        let selection = select(&candidates, &[], true);
        assert_eq!(selection.ids(), vec![ZoneId::new(1), ZoneId::new(4)]);
    }

    #[test]
    fn test_select_skips_ineligible_zones() {
        let candidates = vec![zone(1), zone(4)];
        let selection = select(&candidates, &[ZoneId::new(4), ZoneId::new(9)], false);
        assert_eq!(selection.ids(), vec![ZoneId::new(4)]);
    }
}

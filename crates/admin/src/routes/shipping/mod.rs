//! Shipping configuration screens.
//!
//! Zones, methods, classes and class costs each get a list, a tabbed
//! detail page, a create/edit form and a delete confirmation.

pub mod classes;
pub mod costs;
pub mod methods;
pub mod zones;

use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use rust_decimal::Decimal;

use segishop_core::FieldErrors;

use crate::filters;
use crate::state::AppState;

use super::render;

/// Create the shipping routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/zones", zone_routes())
        .nest("/methods", method_routes())
        .nest("/classes", class_routes())
        .nest("/costs", cost_routes())
}

fn zone_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(zones::index).post(zones::create))
        .route("/new", get(zones::new_zone))
        .route("/{id}", get(zones::show).post(zones::update))
        .route("/{id}/edit", get(zones::edit))
        .route(
            "/{id}/delete",
            get(zones::confirm_delete).post(zones::delete),
        )
        .route("/{id}/regions", post(zones::add_region))
        .route(
            "/{id}/regions/{region_id}/delete",
            get(zones::confirm_remove_region).post(zones::remove_region),
        )
        .route("/{id}/methods", post(zones::add_method))
        .route(
            "/{id}/methods/{method_id}/delete",
            get(zones::confirm_remove_method).post(zones::remove_method),
        )
}

fn method_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(methods::index).post(methods::create))
        .route("/new", get(methods::new_method))
        .route("/{id}", get(methods::show).post(methods::update))
        .route("/{id}/edit", get(methods::edit))
        .route(
            "/{id}/delete",
            get(methods::confirm_delete).post(methods::delete),
        )
        .route("/{id}/zones", post(methods::zones_action))
}

fn class_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(classes::index).post(classes::create))
        .route("/new", get(classes::new_class))
        .route("/{id}", get(classes::show).post(classes::update))
        .route("/{id}/edit", get(classes::edit))
        .route(
            "/{id}/delete",
            get(classes::confirm_delete).post(classes::delete),
        )
        .route("/{id}/products", post(classes::products_action))
}

fn cost_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(costs::index).post(costs::create))
        .route("/new", get(costs::new_cost))
        .route("/{id}", get(costs::show).post(costs::update))
        .route("/{id}/edit", get(costs::edit))
        .route(
            "/{id}/delete",
            get(costs::confirm_delete).post(costs::delete),
        )
}

// =============================================================================
// Confirmation page
// =============================================================================

/// "Are you sure?" page shown before every destructive request.
#[derive(Template)]
#[template(path = "shipping/confirm.html")]
pub struct ConfirmTemplate {
    pub current_path: String,
    pub title: String,
    pub message: String,
    /// POST target of the confirm button.
    pub action: String,
    pub cancel_href: String,
}

pub(crate) fn confirm_page(
    current_path: &str,
    title: String,
    message: String,
    action: String,
    cancel_href: String,
) -> Html<String> {
    render(&ConfirmTemplate {
        current_path: current_path.to_string(),
        title,
        message,
        action,
        cancel_href,
    })
}

// =============================================================================
// Form field parsing
// =============================================================================

/// Parse a required decimal input.
pub(crate) fn required_decimal(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Decimal {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, format!("{label} is required"));
        return Decimal::ZERO;
    }
    Decimal::from_str(raw).unwrap_or_else(|_| {
        errors.add(field, format!("{label} must be a number"));
        Decimal::ZERO
    })
}

/// Parse an optional decimal input; blank means `None`.
pub(crate) fn optional_decimal(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).map_or_else(
        |_| {
            errors.add(field, format!("{label} must be a number"));
            None
        },
        Some,
    )
}

/// Parse an optional whole-number input; blank means `None`.
pub(crate) fn optional_number<T: FromStr>(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().map_or_else(
        |_| {
            errors.add(field, format!("{label} must be a whole number"));
            None
        },
        Some,
    )
}

/// Parse a whole-number input that falls back to `default` when blank.
pub(crate) fn number_or<T: FromStr>(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
    default: T,
) -> T {
    optional_number(errors, field, label, raw).unwrap_or(default)
}

/// Merge two error sets; the first message per field wins.
pub(crate) fn merge_errors(mut into: FieldErrors, other: FieldErrors) -> FieldErrors {
    for (field, message) in other.iter() {
        into.add(field, message);
    }
    into
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_decimal() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_decimal(&mut errors, "cost", "Cost", " 4.50 "),
            Decimal::new(450, 2)
        );
        assert!(errors.is_empty());

        required_decimal(&mut errors, "cost", "Cost", "");
        assert_eq!(errors.get("cost"), Some("Cost is required"));
    }

    #[test]
    fn test_optional_number_rejects_garbage() {
        let mut errors = FieldErrors::new();
        let value: Option<u32> = optional_number(&mut errors, "days", "Days", "three");
        assert!(value.is_none());
        assert_eq!(errors.get("days"), Some("Days must be a whole number"));

        let blank: Option<u32> = optional_number(&mut errors, "other", "Other", "  ");
        assert!(blank.is_none());
        assert!(!errors.has("other"));
    }

    #[test]
    fn test_merge_errors_keeps_first_message() {
        let mut first = FieldErrors::new();
        first.add("title", "Title is required");
        let mut second = FieldErrors::new();
        second.add("title", "other");
        second.add("base_cost", "Base cost must be a number");

        let merged = merge_errors(first, second);
        assert_eq!(merged.get("title"), Some("Title is required"));
        assert!(merged.has("base_cost"));
    }
}

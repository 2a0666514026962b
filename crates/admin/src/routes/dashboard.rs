//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use segishop_core::shipping::ShippingOverview;

use crate::{filters, routes::render, state::AppState};

/// One counter card on the dashboard.
#[derive(Debug, Clone)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
    pub detail: String,
    pub href: &'static str,
}

impl MetricCard {
    fn cards(overview: &ShippingOverview) -> Vec<Self> {
        vec![
            Self {
                label: "Shipping zones",
                value: overview.total_zones.to_string(),
                detail: format!("{} active", overview.active_zones),
                href: "/shipping/zones",
            },
            Self {
                label: "Shipping methods",
                value: overview.total_methods.to_string(),
                detail: format!("{} active", overview.active_methods),
                href: "/shipping/methods",
            },
            Self {
                label: "Shipping classes",
                value: overview.total_classes.to_string(),
                detail: format!("{} class costs", overview.total_class_costs),
                href: "/shipping/classes",
            },
            Self {
                label: "Products with a class",
                value: format!("{}%", overview.class_coverage_percent()),
                detail: format!(
                    "{} without a shipping class",
                    overview.products_without_shipping_class
                ),
                href: "/products",
            },
        ]
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub current_path: String,
    pub cards: Vec<MetricCard>,
    pub load_error: Option<String>,
}

/// Dashboard page handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let (overview, load_error) = match state.shipping().overview().await {
        Ok(overview) => (overview, None),
        Err(e) => {
            tracing::error!("Failed to fetch shipping overview: {e}");
            (ShippingOverview::default(), Some(e.user_message()))
        }
    };

    render(&DashboardTemplate {
        current_path: "/".to_string(),
        cards: MetricCard::cards(&overview),
        load_error,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_show_coverage() {
        let overview = ShippingOverview {
            total_zones: 4,
            active_zones: 3,
            products_with_shipping_class: 30,
            products_without_shipping_class: 10,
            ..ShippingOverview::default()
        };
        let cards = MetricCard::cards(&overview);
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "4");
        assert_eq!(cards[0].detail, "3 active");
        assert_eq!(cards[3].value, "75%");
        assert_eq!(cards[3].detail, "10 without a shipping class");
    }
}

//! Enumerations shared by the shipping and catalog models.
//!
//! The external API sends these as their PascalCase variant names
//! (`"FlatRate"`, `"PerItem"`), which is serde's default for unit variants.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of delivery mechanism a shipping method represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MethodType {
    #[default]
    FlatRate,
    FreeShipping,
    LocalPickup,
    Express,
    Standard,
}

impl MethodType {
    pub const ALL: [Self; 5] = [
        Self::FlatRate,
        Self::FreeShipping,
        Self::LocalPickup,
        Self::Express,
        Self::Standard,
    ];

    /// Wire name, as sent by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FlatRate => "FlatRate",
            Self::FreeShipping => "FreeShipping",
            Self::LocalPickup => "LocalPickup",
            Self::Express => "Express",
            Self::Standard => "Standard",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FlatRate => "Flat Rate",
            Self::FreeShipping => "Free Shipping",
            Self::LocalPickup => "Local Pickup",
            Self::Express => "Express",
            Self::Standard => "Standard",
        }
    }
}

/// Unit a shipping class cost is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CostType {
    /// A currency amount.
    #[default]
    Fixed,
    /// Percent of the order total.
    Percentage,
    /// Amount multiplied by the line-item quantity.
    PerItem,
}

impl CostType {
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Percentage, Self::PerItem];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Percentage => "Percentage",
            Self::PerItem => "PerItem",
        }
    }

    /// Description shown next to the cost type selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed Amount",
            Self::Percentage => "Percentage of order total",
            Self::PerItem => "Cost per item in class",
        }
    }

    /// Charge implied by a cost row of this type, or `None` when the
    /// amount does not fit in a `Decimal`.
    #[must_use]
    pub fn apply(self, cost: Decimal, order_total: Decimal, quantity: u32) -> Option<Decimal> {
        match self {
            Self::Fixed => Some(cost),
            Self::Percentage => order_total
                .checked_mul(cost)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
            Self::PerItem => cost.checked_mul(Decimal::from(quantity)),
        }
    }

    /// Render a cost value in this unit, e.g. `$4.50`, `12%`, `$1.00 / item`.
    #[must_use]
    pub fn describe(self, cost: Decimal) -> String {
        match self {
            Self::Fixed => format!("${cost:.2}"),
            Self::Percentage => format!("{}%", cost.normalize()),
            Self::PerItem => format!("${cost:.2} / item"),
        }
    }
}

/// How a zone region code is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RegionType {
    #[default]
    Country,
    State,
    PostalCode,
    PostalRange,
}

impl RegionType {
    pub const ALL: [Self; 4] = [
        Self::Country,
        Self::State,
        Self::PostalCode,
        Self::PostalRange,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::State => "State",
            Self::PostalCode => "PostalCode",
            Self::PostalRange => "PostalRange",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::State => "State / Province",
            Self::PostalCode => "Postal Code",
            Self::PostalRange => "Postal Code Range",
        }
    }
}

macro_rules! wire_name_traits {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| format!(concat!("invalid ", $what, ": {}"), s))
            }
        }
    };
}

wire_name_traits!(MethodType, "method type");
wire_name_traits!(CostType, "cost type");
wire_name_traits!(RegionType, "region type");

/// Stock level bucket used for badges in product tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    /// Below this many units a product is flagged as low stock.
    pub const LOW_STOCK_THRESHOLD: i32 = 10;

    #[must_use]
    pub const fn from_stock(stock: i32) -> Self {
        if stock <= 0 {
            Self::OutOfStock
        } else if stock < Self::LOW_STOCK_THRESHOLD {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::InStock => "In Stock",
        }
    }
}

/// Stock filter on the admin product list.
///
/// Buckets differ from [`StockStatus`] at the boundary: the filter counts
/// exactly 10 units as low stock, the badge does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    InStock,
    LowStock,
    OutOfStock,
}

impl StatusFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::InStock, Self::LowStock, Self::OutOfStock];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::InStock => "in-stock",
            Self::LowStock => "low-stock",
            Self::OutOfStock => "out-of-stock",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All Stock Levels",
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::OutOfStock => "Out of Stock",
        }
    }

    /// Whether a product with `stock` units passes this filter.
    #[must_use]
    pub const fn matches(self, stock: i32) -> bool {
        match self {
            Self::All => true,
            Self::InStock => stock > StockStatus::LOW_STOCK_THRESHOLD,
            Self::LowStock => stock > 0 && stock <= StockStatus::LOW_STOCK_THRESHOLD,
            Self::OutOfStock => stock == 0,
        }
    }
}

wire_name_traits!(StatusFilter, "status filter");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_method_type_wire_names() {
        let json = serde_json::to_string(&MethodType::FreeShipping).unwrap();
        assert_eq!(json, "\"FreeShipping\"");
        assert_eq!("localpickup".parse::<MethodType>().unwrap(), MethodType::LocalPickup);
        assert!("Drone".parse::<MethodType>().is_err());
    }

    #[test]
    fn test_cost_type_apply() {
        let cost = Decimal::from_str("5").unwrap();
        let total = Decimal::from_str("80").unwrap();

        assert_eq!(CostType::Fixed.apply(cost, total, 3), Some(cost));
        assert_eq!(CostType::Percentage.apply(cost, total, 3), Some(Decimal::from(4)));
        assert_eq!(CostType::PerItem.apply(cost, total, 3), Some(Decimal::from(15)));
    }

    #[test]
    fn test_cost_type_apply_overflow_is_none() {
        let huge = Decimal::from_str("100000000000000000000").unwrap();
        assert_eq!(CostType::Percentage.apply(Decimal::from(50), Decimal::MAX, 1), None);
        assert_eq!(CostType::PerItem.apply(huge, Decimal::from(100), u32::MAX), None);
        assert_eq!(CostType::Fixed.apply(Decimal::MAX, Decimal::MAX, u32::MAX), Some(Decimal::MAX));
    }

    #[test]
    fn test_cost_type_describe() {
        let cost = Decimal::from_str("12.50").unwrap();
        assert_eq!(CostType::Fixed.describe(cost), "$12.50");
        assert_eq!(CostType::Percentage.describe(cost), "12.5%");
        assert_eq!(CostType::PerItem.describe(cost), "$12.50 / item");
    }

    #[test]
    fn test_stock_status_badges() {
        assert_eq!(StockStatus::from_stock(0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_stock(9), StockStatus::LowStock);
        assert_eq!(StockStatus::from_stock(10), StockStatus::InStock);
    }

    #[test]
    fn test_status_filter_buckets() {
        assert!(StatusFilter::OutOfStock.matches(0));
        assert!(!StatusFilter::OutOfStock.matches(1));
        assert!(StatusFilter::LowStock.matches(1));
        assert!(StatusFilter::LowStock.matches(10));
        assert!(!StatusFilter::LowStock.matches(0));
        assert!(StatusFilter::InStock.matches(11));
        assert!(!StatusFilter::InStock.matches(10));
        assert!(StatusFilter::All.matches(-1));
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(
            "out-of-stock".parse::<StatusFilter>().unwrap(),
            StatusFilter::OutOfStock
        );
        let parsed: StatusFilter = serde_json::from_str("\"low-stock\"").unwrap();
        assert_eq!(parsed, StatusFilter::LowStock);
    }
}

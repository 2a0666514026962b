//! Prices, supported currencies and exchange-rate conversion.
//!
//! Catalog prices are stored in the base currency (USD). Shoppers may pick a
//! display currency; amounts are converted through USD using whatever rate
//! table is at hand and formatted with the currency's own precision.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A price in the base currency.
    #[must_use]
    pub const fn base(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::BASE)
    }

    /// Convert into another currency using `rates`.
    #[must_use]
    pub fn convert(self, to: CurrencyCode, rates: &ExchangeRates) -> Self {
        Self::new(rates.convert(self.amount, self.currency_code, to), to)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.currency_code.format(self.amount))
    }
}

/// ISO 4217 currency codes offered in the currency selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    JPY,
    CHF,
    CNY,
    INR,
    KRW,
}

impl CurrencyCode {
    /// Currency all catalog prices are stored in.
    pub const BASE: Self = Self::USD;

    /// Every supported currency, in selector order.
    pub const ALL: [Self; 10] = [
        Self::USD,
        Self::EUR,
        Self::GBP,
        Self::CAD,
        Self::AUD,
        Self::JPY,
        Self::CHF,
        Self::CNY,
        Self::INR,
        Self::KRW,
    ];

    /// Three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::JPY => "JPY",
            Self::CHF => "CHF",
            Self::CNY => "CNY",
            Self::INR => "INR",
            Self::KRW => "KRW",
        }
    }

    /// Human-readable name for the selector.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::USD => "US Dollar",
            Self::EUR => "Euro",
            Self::GBP => "British Pound",
            Self::CAD => "Canadian Dollar",
            Self::AUD => "Australian Dollar",
            Self::JPY => "Japanese Yen",
            Self::CHF => "Swiss Franc",
            Self::CNY => "Chinese Yuan",
            Self::INR => "Indian Rupee",
            Self::KRW => "South Korean Won",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::CAD => "C$",
            Self::AUD => "A$",
            Self::JPY | Self::CNY => "¥",
            Self::CHF => "CHF",
            Self::INR => "₹",
            Self::KRW => "₩",
        }
    }

    /// Number of minor-unit digits shown.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::JPY | Self::KRW => 0,
            _ => 2,
        }
    }

    /// Rate against USD used when no live rates are available.
    #[must_use]
    pub fn default_rate(self) -> Decimal {
        match self {
            Self::USD => Decimal::ONE,
            Self::EUR => Decimal::new(85, 2),
            Self::GBP => Decimal::new(73, 2),
            Self::CAD => Decimal::new(125, 2),
            Self::AUD => Decimal::new(135, 2),
            Self::JPY => Decimal::new(110, 0),
            Self::CHF => Decimal::new(92, 2),
            Self::CNY => Decimal::new(645, 2),
            Self::INR => Decimal::new(745, 1),
            Self::KRW => Decimal::new(1180, 0),
        }
    }

    /// Format `amount` for display: rounded to the currency's precision,
    /// en-US digit grouping, symbol prefixed (suffixed for EUR).
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        let places = self.decimal_places();
        let rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.*}", places as usize, rounded.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
        let mut number = group_thousands(whole);
        if !fraction.is_empty() {
            number.push('.');
            number.push_str(fraction);
        }
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        match self {
            Self::EUR => format!("{sign}{number}{}", self.symbol()),
            _ => format!("{sign}{}{number}", self.symbol()),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("unsupported currency: {s}"))
    }
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Exchange rates relative to USD.
///
/// Built from a rate API response (`{"rates": {"EUR": 0.91, ...}}`) or from
/// the built-in defaults. Codes the table does not know are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRates {
    rates: HashMap<CurrencyCode, Decimal>,
}

impl ExchangeRates {
    /// The fallback table.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            rates: CurrencyCode::ALL
                .into_iter()
                .map(|c| (c, c.default_rate()))
                .collect(),
        }
    }

    /// Build from raw `code -> rate` pairs, ignoring unsupported codes and
    /// non-positive or non-finite rates.
    #[must_use]
    pub fn from_raw(raw: &HashMap<String, f64>) -> Self {
        let mut rates: HashMap<CurrencyCode, Decimal> = raw
            .iter()
            .filter_map(|(code, rate)| {
                let code = code.parse::<CurrencyCode>().ok()?;
                let rate = Decimal::from_f64(*rate).filter(|r| r.is_sign_positive() && !r.is_zero())?;
                Some((code, rate))
            })
            .collect();
        rates.insert(CurrencyCode::BASE, Decimal::ONE);
        Self { rates }
    }

    /// Rate for `code`, if known.
    #[must_use]
    pub fn rate(&self, code: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&code).copied()
    }

    /// Convert `amount` from one currency to another via USD.
    ///
    /// When either rate is missing the amount is returned unchanged.
    #[must_use]
    pub fn convert(&self, amount: Decimal, from: CurrencyCode, to: CurrencyCode) -> Decimal {
        if from == to {
            return amount;
        }

        let usd = if from == CurrencyCode::BASE {
            amount
        } else {
            match self.rate(from) {
                Some(rate) => amount / rate,
                None => return amount,
            }
        };

        if to == CurrencyCode::BASE {
            return usd;
        }

        self.rate(to).map_or(amount, |rate| usd * rate)
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::defaults()
    }
}

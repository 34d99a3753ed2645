pub mod schedule;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CustomsError, Result};

pub use schedule::{FixedRateSchedule, PublishedRateSchedule, RateSchedule};

/// Currency every cross-currency total is computed through.
pub const REFERENCE_CURRENCY: &str = "KRW";

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, so deserialized `"usd"` still matches `USD`.
    pub fn matches(&self, other: &CurrencyCode) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Rates expressed as units of the reference currency per one unit of each currency.
///
/// The table is validated once at construction: every rate is finite and
/// strictly positive and the reference currency maps to exactly `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateTable {
    reference: CurrencyCode,
    rates: BTreeMap<String, f64>,
}

impl ExchangeRateTable {
    pub fn new<I, K>(reference: impl Into<String>, rates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let reference = CurrencyCode::new(reference);
        let mut table = BTreeMap::new();
        for (code, rate) in rates {
            let code = CurrencyCode::new(code);
            if !rate.is_finite() || rate <= 0.0 {
                return Err(CustomsError::InvalidRateTable(format!(
                    "rate for {} must be a positive number, got {}",
                    code, rate
                )));
            }
            table.insert(code.0, rate);
        }
        match table.get(reference.as_str()) {
            Some(rate) if *rate != 1.0 => {
                return Err(CustomsError::InvalidRateTable(format!(
                    "reference currency {} must map to 1.0, got {}",
                    reference, rate
                )));
            }
            Some(_) => {}
            None => {
                table.insert(reference.0.clone(), 1.0);
            }
        }
        Ok(Self {
            reference,
            rates: table,
        })
    }

    /// The rates the assistant ships with, all quoted against KRW.
    pub fn krw_default() -> Self {
        Self {
            reference: CurrencyCode::new(REFERENCE_CURRENCY),
            rates: default_krw_rates(),
        }
    }

    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    pub fn rate(&self, code: &CurrencyCode) -> Result<f64> {
        self.rates
            .get(&code.as_str().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| CustomsError::UnknownCurrency(code.as_str().to_string()))
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rate(code).is_ok()
    }

    pub fn currencies(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.rates.clone()
    }
}

impl Default for ExchangeRateTable {
    fn default() -> Self {
        Self::krw_default()
    }
}

pub fn default_krw_rates() -> BTreeMap<String, f64> {
    [
        ("USD", 1330.0),
        ("KRW", 1.0),
        ("EUR", 1450.0),
        ("JPY", 8.8),
        ("CNY", 183.0),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate))
    .collect()
}

/// Applies a "reference units per source unit" rate to an amount.
///
/// Cost conversion and duty estimation both go through this one multiplication.
pub fn apply_rate(amount: f64, rate: f64) -> f64 {
    amount * rate
}

/// Converts amounts between currencies through the table's reference currency.
#[derive(Debug, Clone, Default)]
pub struct CurrencyConverter {
    table: ExchangeRateTable,
}

impl CurrencyConverter {
    pub fn new(table: ExchangeRateTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ExchangeRateTable {
        &self.table
    }

    pub fn reference(&self) -> &CurrencyCode {
        self.table.reference()
    }

    pub fn to_reference(&self, amount: f64, currency: &CurrencyCode) -> Result<f64> {
        let rate = self.table.rate(currency)?;
        let converted = apply_rate(amount, rate);
        debug!(amount, currency = %currency, rate, converted, "converted to reference");
        Ok(converted)
    }

    pub fn from_reference(&self, amount: f64, currency: &CurrencyCode) -> Result<f64> {
        // Rates are validated positive when the table is built.
        let rate = self.table.rate(currency)?;
        Ok(amount / rate)
    }

    /// Converts between two currencies, returning the amount untouched when they match.
    pub fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
        if from.matches(to) {
            self.table.rate(from)?;
            return Ok(amount);
        }
        let reference = self.to_reference(amount, from)?;
        self.from_reference(reference, to)
    }
}

pub fn symbol_for(code: &str) -> &str {
    match code {
        "USD" => "$",
        "KRW" => "₩",
        "EUR" => "€",
        "JPY" | "CNY" => "¥",
        _ => code,
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "KRW" | "JPY" => 0,
        _ => 2,
    }
}

/// Renders a number with `,` grouping and the requested precision.
pub fn format_number(value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value.abs());
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body.as_str(), ""),
    };
    let grouped = group_digits(int_part);
    let sign = if value < 0.0 && body.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}{frac_part}")
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats an amount with its currency symbol, e.g. `$ 1,234.50` or `₩ 50,000`.
pub fn format_amount(amount: f64, code: &CurrencyCode) -> String {
    let precision = minor_units_for(code.as_str());
    format!(
        "{} {}",
        symbol_for(code.as_str()),
        format_number(amount, precision)
    )
}

/// Formats a published customs rate, e.g. `1,341.50 KRW/USD`.
pub fn format_exchange_rate(rate: f64) -> String {
    format!("{} KRW/USD", format_number(rate, 2))
}

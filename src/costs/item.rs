use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    currency::{CurrencyCode, CurrencyConverter},
    errors::{CustomsError, Result},
    utils::{dates::lenient_option, generate_id},
};

/// Buckets a cost line item is reported under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CostCategory {
    Customs,
    Freight,
    Warehouse,
    Insurance,
    #[default]
    Other,
}

impl CostCategory {
    pub const ALL: [CostCategory; 5] = [
        CostCategory::Customs,
        CostCategory::Freight,
        CostCategory::Warehouse,
        CostCategory::Insurance,
        CostCategory::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CostCategory::Customs => "customs",
            CostCategory::Freight => "freight",
            CostCategory::Warehouse => "warehouse",
            CostCategory::Insurance => "insurance",
            CostCategory::Other => "other",
        }
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CostCategory::Customs => "Customs",
            CostCategory::Freight => "Freight",
            CostCategory::Warehouse => "Warehouse",
            CostCategory::Insurance => "Insurance",
            CostCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

impl FromStr for CostCategory {
    type Err = CustomsError;

    fn from_str(value: &str) -> Result<Self> {
        let needle = value.trim().to_ascii_lowercase();
        CostCategory::ALL
            .into_iter()
            .find(|category| category.key() == needle)
            .ok_or_else(|| {
                CustomsError::InvalidInput(format!(
                    "unknown cost category `{}` (expected customs, freight, warehouse, insurance or other)",
                    value
                ))
            })
    }
}

/// One entry of a cost breakdown.
///
/// `amount_in_reference` caches the reference-currency conversion computed at
/// edit time. The `set_*` methods for amount, currency and rate date keep it
/// current; name and category edits leave it alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostLineItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub category: CostCategory,
    #[serde(
        default,
        with = "lenient_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub exchange_date: Option<NaiveDate>,
    #[serde(
        default,
        rename = "amountInKRW",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount_in_reference: Option<f64>,
}

impl CostLineItem {
    /// Creates an empty item: amount 0, category `other`, currency USD.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(generate_id(), name)
    }

    /// Creates an empty item priced in `currency`, usually the sheet's
    /// display currency.
    pub fn new_in(name: impl Into<String>, currency: impl Into<CurrencyCode>) -> Self {
        let mut item = Self::new(name);
        item.currency = currency.into();
        item
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            amount: 0.0,
            currency: CurrencyCode::default(),
            category: CostCategory::Other,
            exchange_date: None,
            amount_in_reference: None,
        }
    }

    /// Builder-style setter for the raw amount and currency. Leaves the cache empty.
    pub fn priced(mut self, amount: f64, currency: impl Into<CurrencyCode>) -> Self {
        self.amount = amount;
        self.currency = currency.into();
        self.amount_in_reference = None;
        self
    }

    pub fn in_category(mut self, category: CostCategory) -> Self {
        self.category = category;
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_category(&mut self, category: CostCategory) {
        self.category = category;
    }

    pub fn set_amount(&mut self, amount: f64, converter: &CurrencyConverter) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CustomsError::InvalidValue(format!(
                "cost amount must be a non-negative number, got {}",
                amount
            )));
        }
        self.amount = amount;
        self.refresh(converter)
    }

    pub fn set_currency(
        &mut self,
        currency: impl Into<CurrencyCode>,
        converter: &CurrencyConverter,
    ) -> Result<f64> {
        let currency = currency.into();
        // Validate before mutating so a rejected code leaves the item untouched.
        converter.table().rate(&currency)?;
        self.currency = currency;
        self.refresh(converter)
    }

    pub fn set_exchange_date(
        &mut self,
        date: Option<NaiveDate>,
        converter: &CurrencyConverter,
    ) -> Result<f64> {
        self.exchange_date = date;
        self.refresh(converter)
    }

    /// Recomputes and stores the reference-currency amount.
    pub fn refresh(&mut self, converter: &CurrencyConverter) -> Result<f64> {
        let converted = converter.to_reference(self.amount, &self.currency)?;
        self.amount_in_reference = Some(converted);
        Ok(converted)
    }

    /// Cached reference amount when present, otherwise a fresh conversion.
    pub fn reference_amount(&self, converter: &CurrencyConverter) -> Result<f64> {
        match self.amount_in_reference {
            Some(cached) => Ok(cached),
            None => converter.to_reference(self.amount, &self.currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_in_prices_in_the_given_currency() {
        let item = CostLineItem::new_in("Inland trucking", CurrencyCode::new("KRW"));
        assert_eq!(item.currency, CurrencyCode::new("KRW"));
        assert_eq!(item.amount_in_reference, None);
        assert_eq!(item.id.len(), 8);
    }

    #[test]
    fn new_items_use_defaults() {
        let item = CostLineItem::new("Ocean freight");
        assert_eq!(item.amount, 0.0);
        assert_eq!(item.category, CostCategory::Other);
        assert_eq!(item.currency.as_str(), "USD");
        assert!(item.amount_in_reference.is_none());
    }

    #[test]
    fn amount_and_currency_edits_refresh_the_cache() {
        let converter = CurrencyConverter::default();
        let mut item = CostLineItem::new("Freight");
        item.set_amount(10.0, &converter).unwrap();
        assert_eq!(item.amount_in_reference, Some(13300.0));

        item.set_currency("EUR", &converter).unwrap();
        assert_eq!(item.amount_in_reference, Some(14500.0));

        item.set_category(CostCategory::Freight);
        assert_eq!(item.amount_in_reference, Some(14500.0));
    }

    #[test]
    fn rejected_currency_leaves_item_unchanged() {
        let converter = CurrencyConverter::default();
        let mut item = CostLineItem::new("Broker fee");
        item.set_amount(5.0, &converter).unwrap();
        let err = item.set_currency("GBP", &converter).unwrap_err();
        assert!(matches!(err, CustomsError::UnknownCurrency(code) if code == "GBP"));
        assert_eq!(item.currency.as_str(), "USD");
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let converter = CurrencyConverter::default();
        let mut item = CostLineItem::new("Refund");
        assert!(matches!(
            item.set_amount(-1.0, &converter),
            Err(CustomsError::InvalidValue(_))
        ));
    }

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Freight".parse::<CostCategory>().unwrap(), CostCategory::Freight);
        assert!("duty".parse::<CostCategory>().is_err());
    }

    #[test]
    fn reads_saved_item_json() {
        let json = r#"{
            "id": "K3J9Q2ZL",
            "name": "Warehouse",
            "amount": 250,
            "currency": "EUR",
            "category": "warehouse",
            "exchangeRate": 1450,
            "exchangeDate": "2025-03-15T09:30:00.000Z",
            "amountInKRW": 362500
        }"#;
        let item: CostLineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, CostCategory::Warehouse);
        assert_eq!(item.amount_in_reference, Some(362500.0));
        assert_eq!(
            item.exchange_date,
            NaiveDate::from_ymd_opt(2025, 3, 15)
        );
    }
}

//! Customs declaration drafts: the form payload, prefilling from a duty
//! simulation and the taxable value / tax assessment.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::{
    costs::{ImportType, Incoterm},
    currency::{apply_rate, RateSchedule},
    duty::{parse_declared_value, DutyEstimator, SimulationRecord, TariffSchedule},
    errors::{CustomsError, Result},
    utils::dates::{lenient, parse_date},
};

/// Trade partner recorded for exports prefilled from a simulation.
const EXPORT_TRADE_COUNTRY: &str = "US";

/// Fields `set` accepts, in the order the form lists them.
pub const DECLARATION_FIELDS: [&str; 20] = [
    "type",
    "number",
    "date",
    "company",
    "business_number",
    "declarer",
    "declarer_code",
    "hs",
    "item",
    "origin",
    "quantity",
    "unit",
    "price",
    "description",
    "transaction",
    "payment",
    "incoterm",
    "trade_country",
    "duty_rate",
    "exchange_rate",
];

/// Payload of a saved declaration.
///
/// `taxable_value` and `tax_amount` hold the last assessment and are cleared
/// whenever an input they depend on changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DeclarationData {
    pub declaration_type: ImportType,
    pub declaration_number: String,
    #[serde(with = "lenient")]
    pub declaration_date: NaiveDate,
    pub company: String,
    pub business_number: String,
    pub declarer_name: String,
    pub declarer_code: String,
    pub hs_code: String,
    pub item_name: String,
    pub country_origin: String,
    pub item_quantity: String,
    pub item_unit: String,
    /// Declared item price in USD as entered.
    pub item_price: String,
    pub item_description: String,
    pub transaction_type: String,
    pub payment_method: String,
    pub incoterms: String,
    pub trade_country: String,
    #[serde(deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub duty_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub taxable_value: Option<f64>,
    #[serde(deserialize_with = "lenient_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
}

impl Default for DeclarationData {
    fn default() -> Self {
        Self::new(ImportType::Import, Local::now().date_naive())
    }
}

/// Taxable value and duty of a declaration, both in KRW.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxAssessment {
    pub item_price: f64,
    pub exchange_rate: f64,
    pub duty_rate: f64,
    pub taxable_value: f64,
    /// Rounded to whole won.
    pub tax_amount: f64,
}

impl DeclarationData {
    pub fn new(declaration_type: ImportType, declaration_date: NaiveDate) -> Self {
        Self {
            declaration_type,
            declaration_number: String::new(),
            declaration_date,
            company: String::new(),
            business_number: String::new(),
            declarer_name: String::new(),
            declarer_code: String::new(),
            hs_code: String::new(),
            item_name: String::new(),
            country_origin: String::new(),
            item_quantity: String::new(),
            item_unit: String::new(),
            item_price: String::new(),
            item_description: String::new(),
            transaction_type: String::new(),
            payment_method: String::new(),
            incoterms: String::new(),
            trade_country: String::new(),
            duty_rate: None,
            exchange_rate: None,
            taxable_value: None,
            tax_amount: None,
        }
    }

    /// Drafts a declaration from a saved duty simulation.
    ///
    /// The simulation's applied rate and exchange rate are carried over, so the
    /// assessed tax equals the simulated duty up to rounding.
    pub fn from_simulation(record: &SimulationRecord) -> Self {
        let mut draft = Self::new(record.import_type, record.declaration_date);
        draft.hs_code = record.hs_code.trim().to_string();
        draft.country_origin = record.origin_country.trim().to_ascii_uppercase();
        draft.item_name = record.product_name.clone();
        draft.item_price = record.value.trim().to_string();
        draft.item_description = record.description.clone();
        draft.trade_country = match record.import_type {
            ImportType::Import => draft.country_origin.clone(),
            ImportType::Export => EXPORT_TRADE_COUNTRY.to_string(),
        };
        draft.duty_rate = Some(record.applied_rate());
        draft.exchange_rate = Some(record.exchange_rate);
        debug!(hs_code = %draft.hs_code, "declaration drafted from simulation");
        draft
    }

    /// Applies a `field value` edit as typed in the shell.
    pub fn set(&mut self, field: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match field.trim().to_ascii_lowercase().as_str() {
            "type" => self.declaration_type = value.parse()?,
            "number" => self.declaration_number = value.to_string(),
            "date" => {
                self.declaration_date = parse_date(value).ok_or_else(|| {
                    CustomsError::InvalidInput(format!("`{}` is not a date (use YYYY-MM-DD)", value))
                })?;
            }
            "company" => self.company = value.to_string(),
            "business_number" => self.business_number = value.to_string(),
            "declarer" => self.declarer_name = value.to_string(),
            "declarer_code" => self.declarer_code = value.to_string(),
            "hs" | "hs_code" => self.hs_code = value.to_string(),
            "item" => self.item_name = value.to_string(),
            "origin" => self.country_origin = value.to_ascii_uppercase(),
            "quantity" => self.item_quantity = value.to_string(),
            "unit" => self.item_unit = value.to_ascii_uppercase(),
            "price" => self.item_price = value.to_string(),
            "description" => self.item_description = value.to_string(),
            "transaction" => self.transaction_type = value.to_string(),
            "payment" => self.payment_method = value.to_string(),
            "incoterm" | "incoterms" => {
                self.incoterms = value.parse::<Incoterm>()?.code().to_string();
            }
            "trade_country" => self.trade_country = value.to_ascii_uppercase(),
            "duty_rate" => self.duty_rate = parse_optional_amount(value, "duty rate")?,
            "exchange_rate" => self.exchange_rate = parse_optional_amount(value, "exchange rate")?,
            other => {
                return Err(CustomsError::InvalidInput(format!(
                    "unknown declaration field `{}` (expected one of {})",
                    other,
                    DECLARATION_FIELDS.join(", ")
                )))
            }
        }
        if matches!(
            field.trim().to_ascii_lowercase().as_str(),
            "hs" | "hs_code" | "price" | "date" | "duty_rate" | "exchange_rate"
        ) {
            self.taxable_value = None;
            self.tax_amount = None;
        }
        Ok(())
    }

    /// Required fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("hs", &self.hs_code),
            ("item", &self.item_name),
            ("origin", &self.country_origin),
            ("price", &self.item_price),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_assessed(&self) -> bool {
        self.taxable_value.is_some() && self.tax_amount.is_some()
    }

    /// Computes `taxable value = price × exchange rate` and
    /// `tax = taxable value × duty rate%`.
    ///
    /// A blank exchange rate falls back to the rate `estimator` publishes for
    /// the declaration date; a blank duty rate to the tariff's base rate.
    pub fn assess<S: RateSchedule>(
        &self,
        estimator: &DutyEstimator<S>,
        tariffs: &TariffSchedule,
    ) -> Result<TaxAssessment> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(CustomsError::InvalidInput(format!(
                "declaration is missing: {}",
                missing.join(", ")
            )));
        }
        let item_price = parse_declared_value(&self.item_price)?;
        if !item_price.is_finite() || item_price <= 0.0 {
            return Err(CustomsError::InvalidValue(format!(
                "item price must be greater than zero, got {}",
                item_price
            )));
        }
        let exchange_rate = self
            .exchange_rate
            .unwrap_or_else(|| estimator.exchange_rate_for(self.declaration_date));
        if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
            return Err(CustomsError::InvalidRate(exchange_rate));
        }
        let duty_rate = self
            .duty_rate
            .unwrap_or_else(|| tariffs.lookup(&self.hs_code).base_rate);
        if !duty_rate.is_finite() || duty_rate < 0.0 {
            return Err(CustomsError::InvalidRate(duty_rate));
        }

        let taxable_value = apply_rate(item_price, exchange_rate);
        let tax_amount = (taxable_value * duty_rate / 100.0).round();
        info!(
            hs_code = %self.hs_code,
            taxable_value,
            duty_rate,
            tax_amount,
            "declaration assessed"
        );
        Ok(TaxAssessment {
            item_price,
            exchange_rate,
            duty_rate,
            taxable_value,
            tax_amount,
        })
    }

    /// Stores an assessment's rates and amounts on the draft.
    pub fn record_assessment(&mut self, assessment: &TaxAssessment) {
        self.exchange_rate = Some(assessment.exchange_rate);
        self.duty_rate = Some(assessment.duty_rate);
        self.taxable_value = Some(assessment.taxable_value);
        self.tax_amount = Some(assessment.tax_amount);
    }
}

fn parse_optional_amount(raw: &str, what: &str) -> Result<Option<f64>> {
    match raw.trim() {
        "" | "-" => Ok(None),
        value => clean_amount(value)
            .map(Some)
            .ok_or_else(|| CustomsError::InvalidValue(format!("{} `{}` is not a number", what, value))),
    }
}

/// Reads `"8%"`, `"₩ 1,330"` or `1330` alike.
fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Older drafts keep rates and amounts as display strings; blanks and
/// unreadable values load as `None`.
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(number)) => Some(number),
        Some(Raw::Text(text)) => clean_amount(&text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::FixedRateSchedule;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn simulation() -> SimulationRecord {
        SimulationRecord {
            import_type: ImportType::Import,
            description: "gaming laptop".into(),
            product_name: "Laptop computer".into(),
            hs_code: "8471.30.0000".into(),
            origin_country: "cn".into(),
            value: "1,000".into(),
            base_rate: 8.0,
            fta_rate: None,
            estimated_duty: 107_440.0,
            exchange_rate: 1343.0,
            declaration_date: day(2025, 3, 15),
        }
    }

    #[test]
    fn simulation_prefills_the_draft() {
        let draft = DeclarationData::from_simulation(&simulation());
        assert_eq!(draft.hs_code, "8471.30.0000");
        assert_eq!(draft.country_origin, "CN");
        assert_eq!(draft.trade_country, "CN");
        assert_eq!(draft.item_name, "Laptop computer");
        assert_eq!(draft.item_price, "1,000");
        assert_eq!(draft.duty_rate, Some(8.0));
        assert_eq!(draft.exchange_rate, Some(1343.0));
        assert_eq!(draft.declaration_date, day(2025, 3, 15));
        assert!(!draft.is_assessed());
    }

    #[test]
    fn assessed_tax_matches_the_simulated_duty() {
        let mut draft = DeclarationData::from_simulation(&simulation());
        let assessment = draft
            .assess(&DutyEstimator::published(), &TariffSchedule::standard())
            .unwrap();
        assert_eq!(assessment.taxable_value, 1_343_000.0);
        assert_eq!(assessment.tax_amount, 107_440.0);

        draft.record_assessment(&assessment);
        assert!(draft.is_assessed());
        draft.set("price", "2000").unwrap();
        assert!(!draft.is_assessed());
    }

    #[test]
    fn blank_rates_fall_back_to_schedule_and_tariff() {
        let mut draft = DeclarationData::new(ImportType::Import, day(2024, 6, 3));
        draft.set("hs", "6104.32.0000").unwrap();
        draft.set("item", "Jacket").unwrap();
        draft.set("origin", "vn").unwrap();
        draft.set("price", "500").unwrap();

        let assessment = draft
            .assess(&DutyEstimator::new(FixedRateSchedule(1300.0)), &TariffSchedule::standard())
            .unwrap();
        assert_eq!(assessment.exchange_rate, 1300.0);
        assert_eq!(assessment.duty_rate, 13.0);
        assert_eq!(assessment.tax_amount, 84_500.0);
    }

    #[test]
    fn incomplete_drafts_are_rejected() {
        let draft = DeclarationData::new(ImportType::Import, day(2024, 6, 3));
        let err = draft
            .assess(&DutyEstimator::published(), &TariffSchedule::standard())
            .unwrap_err();
        assert!(matches!(err, CustomsError::InvalidInput(message) if message.contains("hs, item, origin, price")));
    }

    #[test]
    fn set_validates_fields() {
        let mut draft = DeclarationData::default();
        draft.set("incoterm", "fob").unwrap();
        assert_eq!(draft.incoterms, "FOB");
        assert!(draft.set("incoterm", "XYZ").is_err());
        assert!(draft.set("duty_rate", "eight").is_err());
        draft.set("duty_rate", "8%").unwrap();
        assert_eq!(draft.duty_rate, Some(8.0));
        assert!(matches!(draft.set("color", "red"), Err(CustomsError::InvalidInput(_))));
    }

    #[test]
    fn older_drafts_with_display_strings_load() {
        let json = r#"{
            "declarationType": "import",
            "declarationDate": "2025-03-14T15:00:00.000Z",
            "hsCode": "8471.30.0000",
            "itemName": "Laptop computer",
            "countryOrigin": "CN",
            "itemPrice": "1000",
            "dutyRate": "8%",
            "exchangeRate": "1343",
            "taxableValue": "₩ 1,343,000",
            "taxAmount": ""
        }"#;
        let draft: DeclarationData = serde_json::from_str(json).unwrap();
        assert_eq!(draft.declaration_date, day(2025, 3, 15));
        assert_eq!(draft.duty_rate, Some(8.0));
        assert_eq!(draft.taxable_value, Some(1_343_000.0));
        assert_eq!(draft.tax_amount, None);
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    currency::CurrencyCode,
    errors::{CustomsError, Result},
};

use super::{
    aggregator::{CostAggregationResult, CostAggregator},
    incoterm::Incoterm,
    item::CostLineItem,
};

const TOTAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    #[default]
    Import,
    Export,
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportType::Import => "import",
            ImportType::Export => "export",
        })
    }
}

impl FromStr for ImportType {
    type Err = CustomsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(ImportType::Import),
            "export" => Ok(ImportType::Export),
            other => Err(CustomsError::InvalidInput(format!(
                "unknown shipment direction `{}` (expected import or export)",
                other
            ))),
        }
    }
}

/// Shipment header a calculation is made for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentDetails {
    pub hs_code: String,
    pub origin_country: String,
    pub destination_country: String,
    pub import_type: ImportType,
    pub incoterm: Incoterm,
    pub customs_duty: Option<f64>,
    pub vat: Option<f64>,
}

/// Payload of a saved cost calculation: the header, every line item with its
/// cached reference amount, and the totals computed when it was saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculationData {
    #[serde(default)]
    pub hs_code: String,
    #[serde(default)]
    pub origin_country: String,
    #[serde(default)]
    pub destination_country: String,
    #[serde(default)]
    pub import_type: ImportType,
    #[serde(default)]
    pub incoterms: Incoterm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customs_duty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,
    #[serde(default)]
    pub cost_items: Vec<CostLineItem>,
    pub total_currency: CurrencyCode,
    pub total_amount: f64,
    #[serde(
        default,
        rename = "totalAmountInKRW",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount_in_reference: Option<f64>,
}

impl CalculationData {
    /// Aggregates `items` and captures the result alongside the shipment header.
    pub fn build(
        details: ShipmentDetails,
        mut items: Vec<CostLineItem>,
        display_currency: &CurrencyCode,
        aggregator: &CostAggregator,
    ) -> Result<(Self, CostAggregationResult)> {
        for item in &mut items {
            if item.amount_in_reference.is_none() {
                item.refresh(aggregator.converter())?;
            }
        }
        let breakdown = aggregator.aggregate(&items, display_currency)?;
        info!(
            items = items.len(),
            total = breakdown.total,
            currency = %display_currency,
            "cost calculation built"
        );
        let data = Self {
            hs_code: details.hs_code,
            origin_country: details.origin_country,
            destination_country: details.destination_country,
            import_type: details.import_type,
            incoterms: details.incoterm,
            customs_duty: details.customs_duty,
            vat: details.vat,
            cost_items: items,
            total_currency: display_currency.clone(),
            total_amount: breakdown.total,
            total_amount_in_reference: Some(breakdown.total_in_reference),
        };
        Ok((data, breakdown))
    }

    pub fn details(&self) -> ShipmentDetails {
        ShipmentDetails {
            hs_code: self.hs_code.clone(),
            origin_country: self.origin_country.clone(),
            destination_country: self.destination_country.clone(),
            import_type: self.import_type,
            incoterm: self.incoterms,
            customs_duty: self.customs_duty,
            vat: self.vat,
        }
    }

    /// Re-aggregates the stored items in the stored display currency.
    pub fn breakdown(&self, aggregator: &CostAggregator) -> Result<CostAggregationResult> {
        aggregator.aggregate(&self.cost_items, &self.total_currency)
    }

    /// Checks the stored totals against a fresh aggregation of the stored items.
    pub fn verify_totals(&self, aggregator: &CostAggregator) -> Result<bool> {
        let breakdown = self.breakdown(aggregator)?;
        let display_matches = (breakdown.total - self.total_amount).abs() <= TOTAL_TOLERANCE;
        let reference_matches = match self.total_amount_in_reference {
            Some(stored) => (breakdown.total_in_reference - stored).abs() <= TOTAL_TOLERANCE,
            None => true,
        };
        if !(display_matches && reference_matches) {
            warn!(
                stored = self.total_amount,
                recomputed = breakdown.total,
                "stored calculation totals differ from a fresh aggregation"
            );
        }
        Ok(display_matches && reference_matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::CostCategory;

    #[test]
    fn build_fills_missing_reference_amounts() {
        let aggregator = CostAggregator::default();
        let items = vec![
            CostLineItem::new("Duty").priced(100.0, "USD").in_category(CostCategory::Customs),
            CostLineItem::new("Trucking").priced(50_000.0, "KRW").in_category(CostCategory::Freight),
        ];
        let (data, breakdown) =
            CalculationData::build(ShipmentDetails::default(), items, &"USD".into(), &aggregator)
                .unwrap();
        assert!(data.cost_items.iter().all(|item| item.amount_in_reference.is_some()));
        assert_eq!(data.total_amount, breakdown.total);
        assert_eq!(data.total_amount_in_reference, Some(183_000.0));
        assert!(data.verify_totals(&aggregator).unwrap());
    }

    #[test]
    fn tampered_totals_fail_verification() {
        let aggregator = CostAggregator::default();
        let items = vec![CostLineItem::new("Duty").priced(100.0, "USD")];
        let (mut data, _) =
            CalculationData::build(ShipmentDetails::default(), items, &"USD".into(), &aggregator)
                .unwrap();
        data.total_amount += 1.0;
        assert!(!data.verify_totals(&aggregator).unwrap());
    }

    #[test]
    fn parses_import_type() {
        assert_eq!("Export".parse::<ImportType>().unwrap(), ImportType::Export);
        assert!("transit".parse::<ImportType>().is_err());
    }
}

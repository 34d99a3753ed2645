use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    costs::ImportType,
    currency::RateSchedule,
    errors::Result,
    utils::dates::lenient,
};

use super::estimator::{parse_declared_value, DutyEstimate, DutyEstimator};

const DUTY_TOLERANCE: f64 = 1e-6;

/// Payload of a saved duty simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    #[serde(default)]
    pub import_type: ImportType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub product_name: String,
    pub hs_code: String,
    #[serde(default)]
    pub origin_country: String,
    /// Declared value in USD as entered. Older records store it as a number.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub base_rate: f64,
    #[serde(default)]
    pub fta_rate: Option<f64>,
    pub estimated_duty: f64,
    pub exchange_rate: f64,
    #[serde(with = "lenient")]
    pub declaration_date: NaiveDate,
}

impl SimulationRecord {
    /// Runs the stored inputs through `estimator` again.
    pub fn reestimate<S: RateSchedule>(&self, estimator: &DutyEstimator<S>) -> Result<DutyEstimate> {
        let value = parse_declared_value(&self.value)?;
        estimator.estimate(value, self.base_rate, self.fta_rate, self.declaration_date)
    }

    /// Whether re-estimating reproduces the stored duty and exchange rate.
    pub fn matches_stored<S: RateSchedule>(&self, estimator: &DutyEstimator<S>) -> Result<bool> {
        let estimate = self.reestimate(estimator)?;
        Ok((estimate.duty_krw - self.estimated_duty).abs() <= DUTY_TOLERANCE
            && (estimate.exchange_rate - self.exchange_rate).abs() <= DUTY_TOLERANCE)
    }

    pub fn applied_rate(&self) -> f64 {
        self.fta_rate.unwrap_or(self.base_rate)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

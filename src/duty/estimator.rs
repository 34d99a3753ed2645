use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    currency::{apply_rate, PublishedRateSchedule, RateSchedule},
    errors::{CustomsError, Result},
    utils::dates::lenient,
};

/// Estimated import duty for a declared value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DutyEstimate {
    pub value_usd: f64,
    pub base_rate: f64,
    pub preferential_rate: Option<f64>,
    /// Preferential rate when one is set, otherwise the base rate.
    pub applied_rate: f64,
    pub exchange_rate: f64,
    #[serde(with = "lenient")]
    pub rate_date: NaiveDate,
    pub duty_usd: f64,
    pub duty_krw: f64,
}

impl DutyEstimate {
    pub fn is_preferential(&self) -> bool {
        self.preferential_rate.is_some()
    }
}

/// Parses a declared value typed into a form (`"1,250.50"`, `" 1000 "`).
pub fn parse_declared_value(raw: &str) -> Result<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(CustomsError::InvalidValue("declared value is required".into()));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| CustomsError::InvalidValue(format!("`{}` is not a number", raw.trim())))
}

/// Computes `value × rate% × published exchange rate` for a declaration date.
#[derive(Debug, Clone, Default)]
pub struct DutyEstimator<S = PublishedRateSchedule> {
    schedule: S,
}

impl DutyEstimator<PublishedRateSchedule> {
    /// Estimator over the weekly published customs rate.
    pub fn published() -> Self {
        Self::new(PublishedRateSchedule)
    }
}

impl<S: RateSchedule> DutyEstimator<S> {
    pub fn new(schedule: S) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    /// Published exchange rate that an estimate on `date` would apply.
    pub fn exchange_rate_for(&self, date: NaiveDate) -> f64 {
        self.schedule.rate_for(date)
    }

    pub fn estimate(
        &self,
        value_usd: f64,
        base_rate: f64,
        preferential_rate: Option<f64>,
        date: NaiveDate,
    ) -> Result<DutyEstimate> {
        if !value_usd.is_finite() || value_usd <= 0.0 {
            warn!(value_usd, "rejected declared value");
            return Err(CustomsError::InvalidValue(format!(
                "declared value must be greater than zero, got {}",
                value_usd
            )));
        }
        if !base_rate.is_finite() || base_rate < 0.0 {
            return Err(CustomsError::InvalidRate(base_rate));
        }
        if let Some(rate) = preferential_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(CustomsError::InvalidRate(rate));
            }
        }

        let applied_rate = preferential_rate.unwrap_or(base_rate);
        let exchange_rate = self.schedule.rate_for(date);
        let duty_usd = value_usd * (applied_rate / 100.0);
        let duty_krw = apply_rate(duty_usd, exchange_rate);

        info!(
            value_usd,
            applied_rate,
            exchange_rate,
            duty_krw,
            %date,
            "duty estimated"
        );

        Ok(DutyEstimate {
            value_usd,
            base_rate,
            preferential_rate,
            applied_rate,
            exchange_rate,
            rate_date: date,
            duty_usd,
            duty_krw,
        })
    }
}

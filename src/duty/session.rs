use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::{
    costs::ImportType,
    currency::{PublishedRateSchedule, RateSchedule},
    errors::{CustomsError, Result},
};

use super::{
    estimator::{parse_declared_value, DutyEstimate, DutyEstimator},
    record::SimulationRecord,
    tariff::{Classification, KeywordClassifier, TariffSchedule},
    tracker::{DutyInputs, RecalculationTracker},
};

/// A duty simulation being edited: the form inputs, the tariff resolved for
/// them, and the last estimate with its staleness tracking.
#[derive(Debug, Clone)]
pub struct DutySimulation<S = PublishedRateSchedule> {
    estimator: DutyEstimator<S>,
    tariffs: TariffSchedule,
    classifier: KeywordClassifier,
    description: String,
    product_name: String,
    hs_code: String,
    origin_country: String,
    declared_value: String,
    declaration_date: NaiveDate,
    import_type: ImportType,
    base_rate: f64,
    tracker: RecalculationTracker,
}

impl Default for DutySimulation<PublishedRateSchedule> {
    fn default() -> Self {
        Self::new(DutyEstimator::published(), TariffSchedule::standard())
    }
}

impl<S: RateSchedule> DutySimulation<S> {
    pub fn new(estimator: DutyEstimator<S>, tariffs: TariffSchedule) -> Self {
        let base_rate = tariffs.lookup("").base_rate;
        Self {
            estimator,
            tariffs,
            classifier: KeywordClassifier,
            description: String::new(),
            product_name: String::new(),
            hs_code: String::new(),
            origin_country: String::new(),
            declared_value: String::new(),
            declaration_date: Local::now().date_naive(),
            import_type: ImportType::default(),
            base_rate,
            tracker: RecalculationTracker::new(),
        }
    }

    pub fn estimator(&self) -> &DutyEstimator<S> {
        &self.estimator
    }

    pub fn tariffs(&self) -> &TariffSchedule {
        &self.tariffs
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn hs_code(&self) -> &str {
        &self.hs_code
    }

    pub fn origin_country(&self) -> &str {
        &self.origin_country
    }

    pub fn declared_value(&self) -> &str {
        &self.declared_value
    }

    pub fn declaration_date(&self) -> NaiveDate {
        self.declaration_date
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// FTA rate the current origin would receive.
    pub fn preferential_rate(&self) -> Option<f64> {
        self.tariffs.preferential_rate(&self.origin_country)
    }

    /// Classifies `description` and adopts the suggested HS code.
    pub fn classify(&mut self, description: &str) -> Classification {
        self.description = description.trim().to_string();
        let classification = self.classifier.classify(&self.description);
        self.set_hs_code(&classification.hs_code);
        self.product_name = classification.product_name.clone();
        classification
    }

    /// Sets the HS code and the base rate and label the tariff gives it.
    pub fn set_hs_code(&mut self, hs_code: &str) {
        self.hs_code = hs_code.trim().to_string();
        let lookup = self.tariffs.lookup(&self.hs_code);
        self.base_rate = lookup.base_rate;
        if let Some(name) = lookup.product_name {
            self.product_name = name;
        }
    }

    pub fn set_origin(&mut self, country: &str) {
        self.origin_country = country.trim().to_ascii_uppercase();
    }

    pub fn set_value(&mut self, raw: &str) {
        self.declared_value = raw.trim().to_string();
    }

    pub fn set_declaration_date(&mut self, date: NaiveDate) {
        self.declaration_date = date;
    }

    pub fn set_import_type(&mut self, import_type: ImportType) {
        self.import_type = import_type;
    }

    pub fn inputs(&self) -> DutyInputs {
        DutyInputs {
            hs_code: self.hs_code.clone(),
            origin_country: self.origin_country.clone(),
            declared_value: self.declared_value.clone(),
            declaration_date: self.declaration_date,
        }
    }

    /// Estimates duty for the current inputs and marks them as calculated.
    pub fn calculate(&mut self) -> Result<DutyEstimate> {
        if self.hs_code.is_empty() {
            warn!("duty calculation attempted without an HS code");
            return Err(CustomsError::InvalidInput("HS code is required".into()));
        }
        let value = parse_declared_value(&self.declared_value)?;
        let estimate = self.estimator.estimate(
            value,
            self.base_rate,
            self.preferential_rate(),
            self.declaration_date,
        )?;
        self.tracker.record(self.inputs(), estimate.clone());
        Ok(estimate)
    }

    pub fn needs_recalculation(&self) -> bool {
        self.tracker.needs_recalculation(&self.inputs())
    }

    /// An estimate exists but the inputs moved on since it was made.
    pub fn is_stale(&self) -> bool {
        self.tracker.last_estimate().is_some() && self.needs_recalculation()
    }

    /// Inputs edited since the last calculation.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        self.tracker.changed_fields(&self.inputs())
    }

    pub fn current_estimate(&self) -> Option<&DutyEstimate> {
        self.tracker.current_estimate(&self.inputs())
    }

    /// Snapshot for saving; refused while the estimate is missing or stale.
    pub fn to_record(&self) -> Result<SimulationRecord> {
        let estimate = self.current_estimate().ok_or_else(|| {
            CustomsError::InvalidInput("inputs changed since the last calculation; recalculate first".into())
        })?;
        Ok(SimulationRecord {
            import_type: self.import_type,
            description: self.description.clone(),
            product_name: self.product_name.clone(),
            hs_code: self.hs_code.clone(),
            origin_country: self.origin_country.clone(),
            value: self.declared_value.clone(),
            base_rate: estimate.base_rate,
            fta_rate: estimate.preferential_rate,
            estimated_duty: estimate.duty_krw,
            exchange_rate: estimate.exchange_rate,
            declaration_date: self.declaration_date,
        })
    }

    /// Restores a saved simulation. The stored inputs are re-estimated so the
    /// session starts current; the stored base and FTA rates are kept as saved.
    pub fn load_record(&mut self, record: &SimulationRecord) -> Result<DutyEstimate> {
        self.import_type = record.import_type;
        self.description = record.description.clone();
        self.product_name = record.product_name.clone();
        self.hs_code = record.hs_code.trim().to_string();
        self.origin_country = record.origin_country.trim().to_ascii_uppercase();
        self.declared_value = record.value.trim().to_string();
        self.declaration_date = record.declaration_date;
        self.base_rate = record.base_rate;

        let estimate = record.reestimate(&self.estimator)?;
        if (estimate.duty_krw - record.estimated_duty).abs() > 1e-6 {
            warn!(
                stored = record.estimated_duty,
                recomputed = estimate.duty_krw,
                "saved simulation no longer reproduces its duty"
            );
        }
        debug!(hs_code = %self.hs_code, "simulation restored");
        self.tracker.record(self.inputs(), estimate.clone());
        Ok(estimate)
    }

    /// Clears every input and forgets the last estimate.
    pub fn reset(&mut self) {
        self.description.clear();
        self.product_name.clear();
        self.hs_code.clear();
        self.origin_country.clear();
        self.declared_value.clear();
        self.import_type = ImportType::default();
        self.base_rate = self.tariffs.lookup("").base_rate;
        self.tracker.clear();
    }
}

use chrono::NaiveDate;

use super::estimator::DutyEstimate;

/// Inputs whose change invalidates a previous duty estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyInputs {
    pub hs_code: String,
    pub origin_country: String,
    /// Declared value as entered, compared verbatim.
    pub declared_value: String,
    pub declaration_date: NaiveDate,
}

/// Remembers the inputs of the last successful estimate and withholds that
/// estimate once any of them change.
#[derive(Debug, Clone, Default)]
pub struct RecalculationTracker {
    snapshot: Option<DutyInputs>,
    estimate: Option<DutyEstimate>,
}

impl RecalculationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, inputs: DutyInputs, estimate: DutyEstimate) {
        self.snapshot = Some(inputs);
        self.estimate = Some(estimate);
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.estimate = None;
    }

    /// `true` when nothing was calculated yet or any tracked input differs.
    pub fn needs_recalculation(&self, current: &DutyInputs) -> bool {
        self.snapshot.as_ref() != Some(current)
    }

    pub fn changed_fields(&self, current: &DutyInputs) -> Vec<&'static str> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        if snapshot.hs_code != current.hs_code {
            changed.push("hs_code");
        }
        if snapshot.origin_country != current.origin_country {
            changed.push("origin_country");
        }
        if snapshot.declared_value != current.declared_value {
            changed.push("declared_value");
        }
        if snapshot.declaration_date != current.declaration_date {
            changed.push("declaration_date");
        }
        changed
    }

    /// The last estimate, only while it still matches `current`.
    pub fn current_estimate(&self, current: &DutyInputs) -> Option<&DutyEstimate> {
        if self.needs_recalculation(current) {
            None
        } else {
            self.estimate.as_ref()
        }
    }

    /// The last estimate regardless of staleness.
    pub fn last_estimate(&self) -> Option<&DutyEstimate> {
        self.estimate.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> DutyInputs {
        DutyInputs {
            hs_code: "8471.30.0000".into(),
            origin_country: "US".into(),
            declared_value: "1000".into(),
            declaration_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        }
    }

    fn estimate() -> DutyEstimate {
        DutyEstimate {
            value_usd: 1000.0,
            base_rate: 8.0,
            preferential_rate: Some(0.0),
            applied_rate: 0.0,
            exchange_rate: 1330.0,
            rate_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            duty_usd: 0.0,
            duty_krw: 0.0,
        }
    }

    #[test]
    fn empty_tracker_needs_calculation() {
        let tracker = RecalculationTracker::new();
        assert!(tracker.needs_recalculation(&inputs()));
        assert!(tracker.current_estimate(&inputs()).is_none());
        assert!(tracker.changed_fields(&inputs()).is_empty());
    }

    #[test]
    fn unchanged_inputs_keep_the_estimate_current() {
        let mut tracker = RecalculationTracker::new();
        tracker.record(inputs(), estimate());
        assert!(!tracker.needs_recalculation(&inputs()));
        assert_eq!(tracker.current_estimate(&inputs()), Some(&estimate()));
    }

    #[test]
    fn each_tracked_field_makes_the_estimate_stale() {
        let mut tracker = RecalculationTracker::new();
        tracker.record(inputs(), estimate());

        for field in ["hs_code", "origin_country", "declared_value", "declaration_date"] {
            let mut current = inputs();
            match field {
                "hs_code" => current.hs_code = "6104.32.0000".into(),
                "origin_country" => current.origin_country = "CN".into(),
                "declared_value" => current.declared_value = "1200".into(),
                _ => current.declaration_date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            }
            assert!(tracker.needs_recalculation(&current), "{field} should invalidate");
            assert!(tracker.current_estimate(&current).is_none());
            assert_eq!(tracker.changed_fields(&current), vec![field]);
            assert!(tracker.last_estimate().is_some());
        }
    }

    #[test]
    fn reverting_an_edit_restores_the_estimate() {
        let mut tracker = RecalculationTracker::new();
        tracker.record(inputs(), estimate());
        let mut current = inputs();
        current.origin_country = "JP".into();
        assert!(tracker.needs_recalculation(&current));
        current.origin_country = "US".into();
        assert!(!tracker.needs_recalculation(&current));
    }
}

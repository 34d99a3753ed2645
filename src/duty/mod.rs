//! Import duty estimation, tariff lookup and the simulation workflow.

pub mod estimator;
pub mod record;
pub mod session;
pub mod tariff;
pub mod tracker;

pub use estimator::{parse_declared_value, DutyEstimate, DutyEstimator};
pub use record::SimulationRecord;
pub use session::DutySimulation;
pub use tariff::{Classification, KeywordClassifier, TariffLookup, TariffRule, TariffSchedule};
pub use tracker::{DutyInputs, RecalculationTracker};

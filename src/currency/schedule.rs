//! Date-keyed customs exchange rates (KRW per USD).

use chrono::{Datelike, NaiveDate};

/// Supplies the KRW-per-USD rate published for a given date.
pub trait RateSchedule: Send + Sync {
    fn rate_for(&self, date: NaiveDate) -> f64;
}

/// Weekly customs rate publication.
///
/// `rate = 1330 + floor(day_of_month / 7) * 5 + day_of_week * 0.5`, with
/// Sunday as day 0. Saved simulations were computed with this formula, so it
/// must not change.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishedRateSchedule;

impl PublishedRateSchedule {
    const BASE: f64 = 1330.0;
    const WEEKLY_STEP: f64 = 5.0;
    const DAILY_STEP: f64 = 0.5;
}

impl RateSchedule for PublishedRateSchedule {
    fn rate_for(&self, date: NaiveDate) -> f64 {
        let week = date.day() / 7;
        let day_of_week = date.weekday().num_days_from_sunday();
        Self::BASE + f64::from(week) * Self::WEEKLY_STEP + f64::from(day_of_week) * Self::DAILY_STEP
    }
}

/// A schedule that returns the same rate for every date.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateSchedule(pub f64);

impl RateSchedule for FixedRateSchedule {
    fn rate_for(&self, _date: NaiveDate) -> f64 {
        self.0
    }
}

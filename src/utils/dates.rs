//! Lenient date parsing for saved records.
//!
//! Older records store full RFC 3339 timestamps (`2025-03-14T15:00:00.000Z`)
//! where newer ones store plain `YYYY-MM-DD` dates. Both load as [`NaiveDate`]
//! and are always written back in the plain form.
//!
//! Timestamps were written from a date picked at local midnight in Korea, so
//! the calendar day is taken in KST (UTC+9), not UTC.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};

const DATE_FORMAT: &str = "%Y-%m-%d";
const RECORD_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Parses either a `YYYY-MM-DD` date or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .or_else(|| {
            let timestamp = DateTime::parse_from_rfc3339(trimmed).ok()?;
            let offset = FixedOffset::east_opt(RECORD_UTC_OFFSET_SECS)?;
            Some(timestamp.with_timezone(&offset).date_naive())
        })
}

pub mod lenient {
    use super::*;

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`")))
    }
}

pub mod lenient_option {
    use super::*;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse_date(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{value}`"))),
        }
    }
}

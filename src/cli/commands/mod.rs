use chrono::NaiveDate;

pub mod config;
pub mod costs;
pub mod declaration;
pub mod duty;
pub mod records;
pub mod system;

use crate::{
    errors::CustomsError,
    utils::dates::parse_date,
};

use super::core::CommandError;
use super::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in system::definitions()
        .into_iter()
        .chain(costs::definitions())
        .chain(duty::definitions())
        .chain(declaration::definitions())
        .chain(config::definitions())
    {
        registry.register(entry);
    }
}

/// Parses a money amount as typed, allowing `,` thousands separators.
pub(crate) fn parse_amount(raw: &str, what: &str) -> Result<f64, CommandError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            CommandError::Core(CustomsError::InvalidValue(format!(
                "{} `{}` is not a number",
                what, raw
            )))
        })
}

/// Parses a duty rate percentage; `-` or `none` means "no rate".
pub(crate) fn parse_optional_rate(raw: &str) -> Result<Option<f64>, CommandError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "-" | "none" | "" => Ok(None),
        _ => parse_amount(raw.trim_end_matches('%'), "rate").map(Some),
    }
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_date(raw).ok_or_else(|| {
        CommandError::InvalidArguments(format!("`{}` is not a date (use YYYY-MM-DD)", raw))
    })
}

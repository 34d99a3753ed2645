use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    currency::{default_krw_rates, CurrencyCode, ExchangeRateTable, REFERENCE_CURRENCY},
    errors::{CustomsError, Result},
    storage::json_backend::replace_file,
    utils::{app_data_dir, config_dir_in, ensure_dir},
};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub locale: String,
    pub display_currency: String,
    pub reference_currency: String,
    /// Units of the reference currency per one unit of each currency.
    pub rates: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "ko-KR".into(),
            display_currency: "USD".into(),
            reference_currency: REFERENCE_CURRENCY.into(),
            rates: default_krw_rates(),
            data_root: None,
        }
    }
}

impl Config {
    /// Builds the validated rate table the converter is constructed with.
    pub fn rate_table(&self) -> Result<ExchangeRateTable> {
        ExchangeRateTable::new(
            self.reference_currency.as_str(),
            self.rates.iter().map(|(code, rate)| (code.clone(), *rate)),
        )
    }

    pub fn display_currency(&self) -> CurrencyCode {
        CurrencyCode::new(self.display_currency.as_str())
    }

    /// Sets a currency rate, rejecting values the rate table would refuse.
    pub fn set_rate(&mut self, code: &str, rate: f64) -> Result<()> {
        let code = CurrencyCode::new(code);
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CustomsError::Config(format!(
                "rate for {} must be a positive number",
                code
            )));
        }
        if code.as_str().eq_ignore_ascii_case(&self.reference_currency) && rate != 1.0 {
            return Err(CustomsError::Config(format!(
                "the reference currency {} is fixed at 1",
                code
            )));
        }
        self.rates.insert(code.as_str().to_string(), rate);
        Ok(())
    }

    /// Applies a `key value` edit as typed in the shell.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.trim().to_ascii_lowercase().as_str() {
            "locale" => self.locale = value.trim().to_string(),
            "display_currency" | "currency" => {
                let code = CurrencyCode::new(value);
                if !self.rate_table()?.contains(&code) {
                    return Err(CustomsError::UnknownCurrency(code.to_string()));
                }
                self.display_currency = code.as_str().to_string();
            }
            "data_root" => {
                let trimmed = value.trim();
                self.data_root = if trimmed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(trimmed))
                };
            }
            other => {
                return Err(CustomsError::Config(format!(
                    "unknown setting `{}` (expected locale, currency or data_root)",
                    other
                )))
            }
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        let config_root = config_dir_in(&base);
        ensure_dir(&config_root)?;
        Ok(Self {
            path: config_root.join(CONFIG_FILE),
        })
    }

    /// Reads the config file, falling back to defaults when there is none.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data).map_err(|err| {
            CustomsError::Config(format!("{} is invalid: {}", self.path.display(), err))
        })?;
        config.rate_table()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.rate_table()?;
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        replace_file(&self.path, &json)?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

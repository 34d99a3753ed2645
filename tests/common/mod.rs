#![allow(dead_code)]

use std::sync::Mutex;

use customs_core::{
    costs::CostAggregator,
    currency::{CurrencyConverter, ExchangeRateTable},
    storage::RecordStores,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates record stores backed by a unique directory for each test.
pub fn setup_stores() -> RecordStores {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    RecordStores::new(Some(base)).expect("open record stores")
}

/// The two-currency table used throughout the worked examples.
pub fn usd_krw_aggregator() -> CostAggregator {
    let table = ExchangeRateTable::new("KRW", [("USD", 1330.0), ("KRW", 1.0)])
        .expect("valid rate table");
    CostAggregator::new(CurrencyConverter::new(table))
}

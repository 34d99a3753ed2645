#![doc(test(attr(deny(warnings))))]

//! Customs Core provides the cost aggregation, currency conversion and duty
//! estimation primitives behind the customs-compliance assistant and its CLI.

pub mod cli;
pub mod config;
pub mod costs;
pub mod currency;
pub mod declaration;
pub mod duty;
pub mod errors;
pub mod storage;
pub mod utils;

pub use errors::{CustomsError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Customs Core tracing initialized.");
    });
}

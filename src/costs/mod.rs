//! Cost line items and their multi-currency aggregation.

pub mod aggregator;
pub mod calculation;
pub mod incoterm;
pub mod item;

pub use aggregator::{CategorySubtotal, CostAggregationResult, CostAggregator, ItemAmounts};
pub use calculation::{CalculationData, ImportType, ShipmentDetails};
pub use incoterm::Incoterm;
pub use item::{CostCategory, CostLineItem};

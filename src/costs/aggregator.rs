use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    currency::{CurrencyCode, CurrencyConverter},
    errors::Result,
};

use super::item::{CostCategory, CostLineItem};

/// Subtotal for one category, in both the display and the reference currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySubtotal {
    pub category: CostCategory,
    pub subtotal: f64,
    pub subtotal_in_reference: f64,
    /// Share of the display-currency grand total, unrounded. `0.0` when the total is zero.
    pub percentage: f64,
    pub item_count: usize,
}

impl CategorySubtotal {
    fn empty(category: CostCategory) -> Self {
        Self {
            category,
            subtotal: 0.0,
            subtotal_in_reference: 0.0,
            percentage: 0.0,
            item_count: 0,
        }
    }

    /// Percentage rounded to one decimal place.
    pub fn display_percentage(&self) -> f64 {
        (self.percentage * 10.0).round() / 10.0
    }

    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.display_percentage())
    }
}

/// Totals of a cost breakdown. Categories appear in the order they were first seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostAggregationResult {
    pub display_currency: CurrencyCode,
    pub reference_currency: CurrencyCode,
    pub total: f64,
    pub total_in_reference: f64,
    pub categories: Vec<CategorySubtotal>,
}

impl CostAggregationResult {
    pub fn category(&self, category: CostCategory) -> Option<&CategorySubtotal> {
        self.categories.iter().find(|entry| entry.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Display- and reference-currency amounts of a single line item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemAmounts {
    pub display: f64,
    pub reference: f64,
}

/// Groups cost line items by category and totals them in a display currency.
#[derive(Debug, Clone, Default)]
pub struct CostAggregator {
    converter: CurrencyConverter,
}

impl CostAggregator {
    pub fn new(converter: CurrencyConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Resolves one item's contribution.
    ///
    /// Items already in the display currency contribute their raw amount so
    /// they never pick up conversion error.
    pub fn item_amounts(
        &self,
        item: &CostLineItem,
        display_currency: &CurrencyCode,
    ) -> Result<ItemAmounts> {
        let reference = item.reference_amount(&self.converter)?;
        let display = if item.currency.matches(display_currency) {
            item.amount
        } else {
            self.converter.from_reference(reference, display_currency)?
        };
        Ok(ItemAmounts { display, reference })
    }

    pub fn aggregate(
        &self,
        items: &[CostLineItem],
        display_currency: &CurrencyCode,
    ) -> Result<CostAggregationResult> {
        self.converter.table().rate(display_currency)?;

        let mut categories: Vec<CategorySubtotal> = Vec::new();
        for item in items {
            let amounts = self.item_amounts(item, display_currency)?;
            let position = match categories
                .iter()
                .position(|entry| entry.category == item.category)
            {
                Some(position) => position,
                None => {
                    categories.push(CategorySubtotal::empty(item.category));
                    categories.len() - 1
                }
            };
            let entry = &mut categories[position];
            entry.subtotal += amounts.display;
            entry.subtotal_in_reference += amounts.reference;
            entry.item_count += 1;
        }

        let total: f64 = categories.iter().map(|entry| entry.subtotal).sum();
        let total_in_reference: f64 = categories
            .iter()
            .map(|entry| entry.subtotal_in_reference)
            .sum();
        for entry in &mut categories {
            entry.percentage = if total == 0.0 {
                0.0
            } else {
                entry.subtotal / total * 100.0
            };
        }

        debug!(
            items = items.len(),
            categories = categories.len(),
            display = %display_currency,
            total,
            total_in_reference,
            "aggregated cost items"
        );

        Ok(CostAggregationResult {
            display_currency: display_currency.clone(),
            reference_currency: self.converter.reference().clone(),
            total,
            total_in_reference,
            categories,
        })
    }
}

pub mod json_backend;

use serde::{de::DeserializeOwned, Serialize};

use crate::{costs::CalculationData, declaration::DeclarationData, duty::SimulationRecord, errors::Result};

pub use json_backend::{
    JsonRecordStore, RecordStores, SavedRecord, CALCULATIONS_FILE, DECLARATIONS_FILE, SIMULATIONS_FILE,
};

/// Payloads that can be kept in a record collection.
pub trait RecordPayload: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Fields a free-text search looks at besides the record name.
    fn search_fields(&self) -> Vec<&str>;

    /// Amount used when ordering records by value.
    fn sort_amount(&self) -> f64;
}

impl RecordPayload for CalculationData {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.hs_code.as_str(),
            self.origin_country.as_str(),
            self.destination_country.as_str(),
            self.incoterms.code(),
        ]
    }

    fn sort_amount(&self) -> f64 {
        self.total_amount
    }
}

impl RecordPayload for SimulationRecord {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.hs_code.as_str(),
            self.product_name.as_str(),
            self.origin_country.as_str(),
            self.description.as_str(),
        ]
    }

    fn sort_amount(&self) -> f64 {
        self.estimated_duty
    }
}

impl RecordPayload for DeclarationData {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.declaration_number.as_str(),
            self.hs_code.as_str(),
            self.item_name.as_str(),
            self.country_origin.as_str(),
            self.company.as_str(),
        ]
    }

    fn sort_amount(&self) -> f64 {
        self.tax_amount.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// Most recent first; records saved in the same minute keep reverse
    /// insertion order.
    #[default]
    Newest,
    Oldest,
    Name,
    /// Largest amount first.
    Amount,
}

/// A named collection of saved records.
pub trait RecordStorage<T: RecordPayload>: Send + Sync {
    fn save(&self, name: &str, data: T) -> Result<SavedRecord<T>>;
    fn list(&self) -> Result<Vec<SavedRecord<T>>>;
    fn get(&self, id: &str) -> Result<SavedRecord<T>>;
    fn delete(&self, id: &str) -> Result<SavedRecord<T>>;

    /// Records whose name or payload fields contain `term`, case-insensitively.
    fn search(&self, term: &str) -> Result<Vec<SavedRecord<T>>> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| needle.is_empty() || record.matches(&needle))
            .collect())
    }

    fn list_sorted(&self, order: RecordOrder) -> Result<Vec<SavedRecord<T>>> {
        let mut records = self.list()?;
        sort_records(&mut records, order);
        Ok(records)
    }
}

pub fn sort_records<T: RecordPayload>(records: &mut [SavedRecord<T>], order: RecordOrder) {
    match order {
        RecordOrder::Newest => {
            records.reverse();
            records.sort_by(|a, b| b.date.cmp(&a.date));
        }
        RecordOrder::Oldest => records.sort_by(|a, b| a.date.cmp(&b.date)),
        RecordOrder::Name => records.sort_by_key(|record| record.name.to_lowercase()),
        RecordOrder::Amount => records.sort_by(|a, b| {
            b.data
                .sort_amount()
                .total_cmp(&a.data.sort_amount())
        }),
    }
}

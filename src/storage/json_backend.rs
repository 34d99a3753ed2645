use std::{
    fs::{self, File},
    io::Write,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    costs::CalculationData,
    declaration::DeclarationData,
    duty::SimulationRecord,
    errors::{CustomsError, Result},
    utils::{app_data_dir, ensure_dir, generate_id, records_dir_in},
};

use super::{RecordPayload, RecordStorage};

pub const CALCULATIONS_FILE: &str = "calculations.json";
pub const SIMULATIONS_FILE: &str = "simulations.json";
pub const DECLARATIONS_FILE: &str = "declarations.json";

const TMP_SUFFIX: &str = "tmp";
const RECORD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A named, dated entry in a record collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedRecord<T> {
    pub id: String,
    pub name: String,
    pub date: String,
    pub data: T,
}

impl<T: RecordPayload> SavedRecord<T> {
    pub fn new(name: impl Into<String>, data: T) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            date: Local::now().format(RECORD_DATE_FORMAT).to_string(),
            data,
        }
    }

    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .data
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Keeps one record collection as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonRecordStore<T> {
    path: PathBuf,
    _payload: PhantomData<fn() -> T>,
}

impl<T: RecordPayload> JsonRecordStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _payload: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<SavedRecord<T>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|err| {
            CustomsError::Storage(format!("{} is unreadable: {}", self.path.display(), err))
        })
    }

    fn write_all(&self, records: &[SavedRecord<T>]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        replace_file(&self.path, &json)?;
        debug!(path = %self.path.display(), count = records.len(), "records written");
        Ok(())
    }
}

impl<T: RecordPayload> RecordStorage<T> for JsonRecordStore<T> {
    fn save(&self, name: &str, data: T) -> Result<SavedRecord<T>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CustomsError::InvalidInput("a record name is required".into()));
        }
        let mut records = self.read_all()?;
        let record = SavedRecord::new(name, data);
        records.push(record.clone());
        self.write_all(&records)?;
        info!(id = %record.id, name = %record.name, "record saved");
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SavedRecord<T>>> {
        self.read_all()
    }

    fn get(&self, id: &str) -> Result<SavedRecord<T>> {
        self.read_all()?
            .into_iter()
            .find(|record| record.id.eq_ignore_ascii_case(id.trim()))
            .ok_or_else(|| CustomsError::RecordNotFound(id.trim().to_string()))
    }

    fn delete(&self, id: &str) -> Result<SavedRecord<T>> {
        let mut records = self.read_all()?;
        let position = records
            .iter()
            .position(|record| record.id.eq_ignore_ascii_case(id.trim()))
            .ok_or_else(|| CustomsError::RecordNotFound(id.trim().to_string()))?;
        let removed = records.remove(position);
        self.write_all(&records)?;
        info!(id = %removed.id, name = %removed.name, "record deleted");
        Ok(removed)
    }
}

/// The calculation, simulation and declaration collections under one data
/// directory.
#[derive(Debug, Clone)]
pub struct RecordStores {
    root: PathBuf,
    pub calculations: JsonRecordStore<CalculationData>,
    pub simulations: JsonRecordStore<SimulationRecord>,
    pub declarations: JsonRecordStore<DeclarationData>,
}

impl RecordStores {
    /// Opens the collections under `root`, or the application data directory.
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        let records_dir = records_dir_in(&root);
        ensure_dir(&records_dir)?;
        Ok(Self {
            calculations: JsonRecordStore::new(records_dir.join(CALCULATIONS_FILE)),
            simulations: JsonRecordStore::new(records_dir.join(SIMULATIONS_FILE)),
            declarations: JsonRecordStore::new(records_dir.join(DECLARATIONS_FILE)),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_file(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Writes `data` beside `path` and renames it into place.
pub(crate) fn replace_file(path: &Path, data: &str) -> Result<()> {
    let tmp = tmp_path(path);
    write_file(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        costs::{Incoterm, ImportType},
        storage::{sort_records, RecordOrder},
    };
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn stores_with_temp_dir() -> (RecordStores, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let stores = RecordStores::new(Some(temp.path().to_path_buf())).expect("record stores");
        (stores, temp)
    }

    fn simulation(hs_code: &str, duty: f64) -> SimulationRecord {
        SimulationRecord {
            import_type: ImportType::Import,
            description: "laptop".into(),
            product_name: "Laptop computer".into(),
            hs_code: hs_code.into(),
            origin_country: "CN".into(),
            value: "1000".into(),
            base_rate: 8.0,
            fta_rate: None,
            estimated_duty: duty,
            exchange_rate: 1330.0,
            declaration_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        }
    }

    fn calculation(origin: &str) -> CalculationData {
        CalculationData {
            hs_code: "8471.30".into(),
            origin_country: origin.into(),
            destination_country: "KR".into(),
            import_type: ImportType::Import,
            incoterms: Incoterm::Cif,
            customs_duty: None,
            vat: None,
            cost_items: Vec::new(),
            total_currency: "USD".into(),
            total_amount: 0.0,
            total_amount_in_reference: Some(0.0),
        }
    }

    #[test]
    fn missing_file_lists_nothing() {
        let (stores, _guard) = stores_with_temp_dir();
        assert!(stores.simulations.list().unwrap().is_empty());
        assert!(!stores.simulations.path().exists());
    }

    #[test]
    fn save_get_delete_roundtrip() {
        let (stores, _guard) = stores_with_temp_dir();
        let saved = stores
            .simulations
            .save("Laptop order", simulation("8471.30.0000", 106_400.0))
            .expect("save");
        assert_eq!(saved.id.len(), 8);

        let loaded = stores.simulations.get(&saved.id.to_lowercase()).expect("get");
        assert_eq!(loaded, saved);

        let removed = stores.simulations.delete(&saved.id).expect("delete");
        assert_eq!(removed.name, "Laptop order");
        assert!(matches!(
            stores.simulations.get(&saved.id),
            Err(CustomsError::RecordNotFound(_))
        ));
        assert!(matches!(
            stores.simulations.delete(&saved.id),
            Err(CustomsError::RecordNotFound(_))
        ));
    }

    #[test]
    fn blank_names_are_rejected() {
        let (stores, _guard) = stores_with_temp_dir();
        let result = stores.calculations.save("   ", calculation("CN"));
        assert!(matches!(result, Err(CustomsError::InvalidInput(_))));
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let (stores, _guard) = stores_with_temp_dir();
        fs::write(stores.calculations.path(), "{not json").unwrap();
        assert!(matches!(
            stores.calculations.list(),
            Err(CustomsError::Storage(_))
        ));
    }

    #[test]
    fn search_and_sort() {
        let (stores, _guard) = stores_with_temp_dir();
        stores.calculations.save("beta", calculation("CN")).unwrap();
        stores.calculations.save("Alpha", calculation("VN")).unwrap();

        let found = stores.calculations.search("vn").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Alpha");
        assert_eq!(stores.calculations.search("cif").unwrap().len(), 2);

        let sorted = stores.calculations.list_sorted(RecordOrder::Name).unwrap();
        let names: Vec<_> = sorted.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
    }

    #[test]
    fn newest_first_keeps_same_minute_saves_in_reverse_order() {
        let (stores, _guard) = stores_with_temp_dir();
        for name in ["first", "second", "third"] {
            stores.calculations.save(name, calculation("CN")).unwrap();
        }
        let mut records = stores.calculations.list().unwrap();
        for record in &mut records {
            record.date = "2025-03-15 10:30".into();
        }
        sort_records(&mut records, RecordOrder::Newest);
        let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);

        sort_records(&mut records, RecordOrder::Oldest);
        let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn declarations_have_their_own_file() {
        let (stores, _guard) = stores_with_temp_dir();
        let mut draft = DeclarationData::from_simulation(&simulation("8471.30.0000", 106_400.0));
        draft.declaration_number = "12345-25-000001M".into();
        let saved = stores.declarations.save("Laptop declaration", draft).unwrap();

        assert!(stores.declarations.path().ends_with(DECLARATIONS_FILE));
        assert!(stores.simulations.list().unwrap().is_empty());
        assert_eq!(stores.declarations.search("000001m").unwrap()[0].id, saved.id);
    }

    #[test]
    fn write_file_replaces_contents() {
        let (stores, _guard) = stores_with_temp_dir();
        let path = stores.root().join("note.json");
        write_file(&path, "[1]").unwrap();
        replace_file(&path, "[2]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[2]");
        assert!(!tmp_path(&path).exists());
    }
}

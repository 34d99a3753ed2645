mod common;

use chrono::NaiveDate;
use customs_core::{
    config::{Config, ConfigManager},
    costs::{CalculationData, CostCategory, CostLineItem, Incoterm, ShipmentDetails},
    currency::FixedRateSchedule,
    declaration::DeclarationData,
    duty::{DutyEstimator, DutySimulation, SimulationRecord, TariffSchedule},
    storage::{RecordOrder, RecordStorage, RecordStores},
    CustomsError,
};
use tempfile::TempDir;

fn calculation(hs_code: &str, incoterm: Incoterm, freight: f64) -> CalculationData {
    let aggregator = common::usd_krw_aggregator();
    let details = ShipmentDetails {
        hs_code: hs_code.into(),
        origin_country: "CN".into(),
        destination_country: "KR".into(),
        incoterm,
        ..ShipmentDetails::default()
    };
    let items = vec![CostLineItem::new("Ocean freight")
        .priced(freight, "USD")
        .in_category(CostCategory::Freight)];
    CalculationData::build(details, items, &"USD".into(), &aggregator)
        .expect("build calculation")
        .0
}

fn simulation_record() -> SimulationRecord {
    let mut simulation = DutySimulation::new(
        DutyEstimator::new(FixedRateSchedule(1330.0)),
        TariffSchedule::standard(),
    );
    simulation.classify("wool jacket");
    simulation.set_origin("VN");
    simulation.set_value("200");
    simulation.set_declaration_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    simulation.calculate().expect("estimate");
    simulation.to_record().expect("record")
}

#[test]
fn calculations_persist_across_reopen() {
    let stores = common::setup_stores();
    let saved = stores
        .calculations
        .save("Laptop import", calculation("8471.30", Incoterm::Fob, 900.0))
        .unwrap();

    let reopened = RecordStores::new(Some(stores.root().to_path_buf())).unwrap();
    let loaded = reopened.calculations.get(&saved.id).unwrap();
    assert_eq!(loaded.name, "Laptop import");
    assert_eq!(loaded.data, saved.data);
    assert!(loaded
        .data
        .verify_totals(&common::usd_krw_aggregator())
        .unwrap());
}

#[test]
fn search_matches_names_and_shipment_fields() {
    let stores = common::setup_stores();
    stores
        .calculations
        .save("Laptops", calculation("8471.30", Incoterm::Fob, 900.0))
        .unwrap();
    stores
        .calculations
        .save("Jackets", calculation("6104.32", Incoterm::Ddp, 300.0))
        .unwrap();

    let by_code = stores.calculations.search("6104").unwrap();
    assert_eq!(by_code.len(), 1);
    assert_eq!(by_code[0].name, "Jackets");

    let by_incoterm = stores.calculations.search("ddp").unwrap();
    assert_eq!(by_incoterm.len(), 1);

    assert_eq!(stores.calculations.search("LAPTOP").unwrap().len(), 1);
    assert_eq!(stores.calculations.search("").unwrap().len(), 2);

    let by_amount = stores.calculations.list_sorted(RecordOrder::Amount).unwrap();
    assert_eq!(by_amount[0].name, "Laptops");
    let by_name = stores.calculations.list_sorted(RecordOrder::Name).unwrap();
    assert_eq!(by_name[0].name, "Jackets");
}

#[test]
fn simulations_round_trip_and_delete() {
    let stores = common::setup_stores();
    let record = simulation_record();
    assert_eq!(record.hs_code, "6104.32.0000");
    assert_eq!(record.base_rate, 13.0);

    let saved = stores.simulations.save("Jacket quote", record).unwrap();
    let loaded = stores.simulations.get(&saved.id.to_uppercase()).unwrap();
    assert!(loaded
        .data
        .matches_stored(&DutyEstimator::new(FixedRateSchedule(1330.0)))
        .unwrap());

    let removed = stores.simulations.delete(&saved.id).unwrap();
    assert_eq!(removed.name, "Jacket quote");
    assert!(stores.simulations.list().unwrap().is_empty());
    assert!(matches!(
        stores.simulations.get(&saved.id),
        Err(CustomsError::RecordNotFound(_))
    ));
}

#[test]
fn collections_are_kept_in_separate_files() {
    let stores = common::setup_stores();
    stores
        .calculations
        .save("Calc", calculation("9503.00", Incoterm::Exw, 10.0))
        .unwrap();
    stores.simulations.save("Sim", simulation_record()).unwrap();

    assert_eq!(stores.calculations.list().unwrap().len(), 1);
    assert_eq!(stores.simulations.list().unwrap().len(), 1);
    assert_ne!(stores.calculations.path(), stores.simulations.path());
}

#[test]
fn config_data_root_can_be_set_and_cleared() {
    let temp = TempDir::new().unwrap();
    let manager = ConfigManager::with_base_dir(temp.path()).unwrap();
    let mut config = manager.load().unwrap();
    assert_eq!(config, Config::default());
    assert!(config.data_root.is_none());

    config.set("data_root", "/srv/customs").unwrap();
    manager.save(&config).unwrap();
    let reloaded = manager.load().unwrap();
    assert_eq!(
        reloaded.data_root.as_deref(),
        Some(std::path::Path::new("/srv/customs"))
    );

    let mut cleared = reloaded;
    cleared.set("data_root", "").unwrap();
    assert!(cleared.data_root.is_none());
}

#[test]
fn calculations_without_cached_item_amounts_still_load() {
    let stores = common::setup_stores();
    let json = r#"[{
        "id": "c0ffee01",
        "name": "Older quote",
        "date": "2024-05-02 09:15",
        "data": {
            "hsCode": "8471.30",
            "originCountry": "CN",
            "destinationCountry": "KR",
            "importType": "import",
            "incoterms": "FOB",
            "costItems": [
                { "id": "a1", "name": "Broker fee", "amount": 100, "currency": "USD", "category": "customs" },
                { "id": "b2", "name": "Trucking", "amount": 50000, "currency": "KRW", "category": "freight" }
            ],
            "totalCurrency": "USD",
            "totalAmount": 137.593984962406,
            "totalAmountInKRW": 183000
        }
    }]"#;
    std::fs::write(stores.calculations.path(), json).unwrap();

    let loaded = stores.calculations.get("C0FFEE01").unwrap();
    assert!(loaded
        .data
        .cost_items
        .iter()
        .all(|item| item.amount_in_reference.is_none()));

    let aggregator = common::usd_krw_aggregator();
    assert!(loaded.data.verify_totals(&aggregator).unwrap());
    let breakdown = loaded.data.breakdown(&aggregator).unwrap();
    assert!((breakdown.total_in_reference - 183_000.0).abs() < 1e-6);
    let freight = breakdown.category(CostCategory::Freight).unwrap();
    assert!((freight.subtotal_in_reference - 50_000.0).abs() < 1e-9);
}

#[test]
fn saved_timestamps_keep_the_korean_declaration_day() {
    let stores = common::setup_stores();
    let json = r#"[{
        "id": "5a1e0314",
        "name": "Laptop order",
        "date": "2025-03-15 00:10",
        "data": {
            "importType": "import",
            "description": "gaming laptop",
            "productName": "Laptop computer",
            "hsCode": "8471.30.0000",
            "originCountry": "CN",
            "value": "1000",
            "baseRate": 8,
            "estimatedDuty": 107440,
            "exchangeRate": 1343,
            "declarationDate": "2025-03-14T15:00:00.000Z"
        }
    }]"#;
    std::fs::write(stores.simulations.path(), json).unwrap();

    let loaded = stores.simulations.get("5a1e0314").unwrap();
    assert_eq!(
        loaded.data.declaration_date,
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    );
    assert!(loaded.data.matches_stored(&DutyEstimator::published()).unwrap());
}

#[test]
fn declarations_round_trip_with_their_assessment() {
    let stores = common::setup_stores();
    let record = simulation_record();
    let mut draft = DeclarationData::from_simulation(&record);
    let assessment = draft
        .assess(&DutyEstimator::new(FixedRateSchedule(1330.0)), &TariffSchedule::standard())
        .unwrap();
    assert!((assessment.tax_amount - record.estimated_duty).abs() < 0.5);
    draft.record_assessment(&assessment);

    let saved = stores.declarations.save("Jacket declaration", draft.clone()).unwrap();
    let loaded = stores.declarations.get(&saved.id).unwrap();
    assert_eq!(loaded.data, draft);
    assert_eq!(stores.declarations.search("6104").unwrap().len(), 1);
    assert!(stores.simulations.list().unwrap().is_empty());
}

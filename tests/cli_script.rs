use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("customs_core_cli").unwrap();
    cmd.env("CUSTOMS_CORE_CLI_SCRIPT", "1")
        .env("CUSTOMS_CORE_HOME", home.path())
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_aggregates_and_saves_a_cost_sheet() {
    let home = TempDir::new().unwrap();
    let input = "\
# worked example
item add \"Broker fee\" 100 USD customs
item add Trucking 50000 KRW freight
calc
calc save \"First quote\"
exit
";

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Cost breakdown (USD)"))
        .stdout(contains("137.59"))
        .stdout(contains("72.7%"))
        .stdout(contains("27.3%"))
        .stdout(contains("Saved calculation `First quote`"));

    let saved = std::fs::read_to_string(
        home.path().join("records").join("calculations.json"),
    )
    .unwrap();
    assert!(saved.contains("\"First quote\""));
    assert!(saved.contains("\"totalAmountInKRW\""));
}

#[test]
fn script_mode_estimates_duty_for_a_date() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .write_stdin("rate 2023-03-15\nduty 1000 8 - 2023-03-15\nexit\n")
        .assert()
        .success()
        .stdout(contains("1,341.50 KRW/USD"))
        .stdout(contains("₩ 107,320"));
}

#[test]
fn script_mode_reports_errors_and_keeps_going() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .write_stdin("item add Storage 10 GBP\nhelpp\nversion\nexit\n")
        .assert()
        .success()
        .stdout(contains("help"))
        .stdout(contains("Customs Core"));
}

const SAVED_SIMULATION: &str = r#"[{
    "id": "5a1e0314",
    "name": "Laptop order",
    "date": "2025-03-15 00:10",
    "data": {
        "importType": "import",
        "description": "gaming laptop",
        "productName": "Laptop computer",
        "hsCode": "8471.30.0000",
        "originCountry": "CN",
        "value": 1000,
        "baseRate": 8,
        "ftaRate": null,
        "estimatedDuty": 107440,
        "exchangeRate": 1343,
        "declarationDate": "2025-03-14T15:00:00.000Z"
    }
}]"#;

fn seed_simulation(home: &TempDir) {
    let records = home.path().join("records");
    std::fs::create_dir_all(&records).unwrap();
    std::fs::write(records.join("simulations.json"), SAVED_SIMULATION).unwrap();
}

#[test]
fn script_mode_reloads_a_saved_simulation() {
    let home = TempDir::new().unwrap();
    seed_simulation(&home);
    cli(&home)
        .write_stdin("sim load 5a1e0314
sim status
exit
")
        .assert()
        .success()
        .stdout(contains("Loaded `Laptop order`"))
        .stdout(contains("1,343.00 KRW/USD"))
        .stdout(contains("₩ 107,440"))
        .stdout(contains("2025-03-15"))
        .stdout(contains("no longer matches").not());
}

#[test]
fn script_mode_assesses_a_declaration_from_a_saved_simulation() {
    let home = TempDir::new().unwrap();
    seed_simulation(&home);
    cli(&home)
        .write_stdin(
            "decl from-sim 5a1e0314\ndecl set company \"Hanbit Trading\"\ndecl assess\ndecl save \"March laptops\"\ndecl list\nexit\n",
        )
        .assert()
        .success()
        .stdout(contains("₩ 1,343,000"))
        .stdout(contains("Tax amount: ₩ 107,440"))
        .stdout(contains("Saved declaration `March laptops`"));

    let saved = std::fs::read_to_string(
        home.path().join("records").join("declarations.json"),
    )
    .unwrap();
    assert!(saved.contains("\"taxAmount\": 107440.0"));
    assert!(saved.contains("\"company\": \"Hanbit Trading\""));
}


use chrono::Local;

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::costs::ImportType;
use crate::currency::{format_amount, format_exchange_rate, CurrencyCode, REFERENCE_CURRENCY};
use crate::duty::{DutyEstimate, SimulationRecord};
use crate::storage::RecordStorage;

use super::records::{delete_record, list_records, record_id, record_name};
use super::{parse_amount, parse_date_arg, parse_optional_rate};

const DUTY_USAGE: &str = "duty <value-usd> <base-rate%> [preferential-rate%|-] [YYYY-MM-DD]";
const SIM_USAGE: &str =
    "sim <set|calc|status|reset|save|list|load|delete> ...";
const SIM_SET_USAGE: &str = "sim set <hs|origin|value|date|type|description> <value>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "rate",
            "Show the published customs exchange rate for a date",
            "rate [YYYY-MM-DD]",
            cmd_rate,
        ),
        CommandEntry::new("duty", "Estimate duty for a declared value", DUTY_USAGE, cmd_duty),
        CommandEntry::new(
            "classify",
            "Suggest an HS code from a product description",
            "classify <description>",
            cmd_classify,
        ),
        CommandEntry::new("sim", "Run and manage duty simulations", SIM_USAGE, cmd_sim),
    ]
}

fn cmd_rate(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let date = match args.first() {
        Some(raw) => parse_date_arg(raw)?,
        None => Local::now().date_naive(),
    };
    let rate = context.simulation.estimator().exchange_rate_for(date);
    output::info(format!("{}: {}", date, format_exchange_rate(rate)));
    Ok(())
}

fn cmd_duty(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() < 2 {
        return Err(CommandError::usage(DUTY_USAGE));
    }
    let value = parse_amount(args[0], "declared value")?;
    let base_rate = parse_amount(args[1].trim_end_matches('%'), "base rate")?;
    let preferential = match args.get(2) {
        Some(raw) => parse_optional_rate(raw)?,
        None => None,
    };
    let date = match args.get(3) {
        Some(raw) => parse_date_arg(raw)?,
        None => Local::now().date_naive(),
    };
    let estimate = context
        .simulation
        .estimator()
        .estimate(value, base_rate, preferential, date)?;
    print_estimate(&estimate);
    Ok(())
}

fn cmd_classify(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let description = args.join(" ");
    if description.trim().is_empty() {
        return Err(CommandError::usage("classify <description>"));
    }
    let classification = context.simulation.classify(&description);
    output::success(format!(
        "{} -> {} ({})",
        description.trim(),
        classification.hs_code,
        classification.product_name
    ));
    output::info(format!("  Base duty rate: {}%", context.simulation.base_rate()));
    Ok(())
}

fn cmd_sim(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        print_simulation(context);
        return Ok(());
    };
    match action.to_ascii_lowercase().as_str() {
        "set" => set_simulation_field(context, rest),
        "calc" | "calculate" => {
            let estimate = context.simulation.calculate()?;
            print_estimate(&estimate);
            Ok(())
        }
        "status" | "show" => {
            print_simulation(context);
            Ok(())
        }
        "reset" => {
            context.simulation.reset();
            output::success("Simulation cleared.");
            Ok(())
        }
        "save" => {
            let name = record_name(rest, "sim save <name>")?;
            let record = context.simulation.to_record()?;
            let saved = context.stores.simulations.save(&name, record)?;
            output::success(format!("Saved simulation `{}` as {}.", saved.name, saved.id));
            Ok(())
        }
        "list" | "ls" => list_records(
            &context.stores.simulations,
            "Saved simulations",
            rest,
            describe_simulation,
            &["HS code", "Origin", "Duty"],
        ),
        "load" => {
            let id = record_id(rest, "sim load <id>")?;
            let saved = context.stores.simulations.get(id)?;
            if !saved.data.matches_stored(context.simulation.estimator())? {
                output::warning("The stored duty no longer matches a fresh estimate.");
            }
            let estimate = context.simulation.load_record(&saved.data)?;
            output::success(format!("Loaded `{}`.", saved.name));
            print_estimate(&estimate);
            Ok(())
        }
        "delete" | "rm" => delete_record(&context.stores.simulations, rest, "sim delete <id>"),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown sim action `{}`. Available: set, calc, status, reset, save, list, load, delete",
            other
        ))),
    }
}

fn set_simulation_field(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((field, value)) = args.split_first() else {
        return Err(CommandError::usage(SIM_SET_USAGE));
    };
    let value = value.join(" ");
    let simulation = &mut context.simulation;
    match field.to_ascii_lowercase().as_str() {
        "hs" | "hs_code" => simulation.set_hs_code(&value),
        "origin" => simulation.set_origin(&value),
        "value" => simulation.set_value(&value),
        "date" => simulation.set_declaration_date(parse_date_arg(&value)?),
        "type" => simulation.set_import_type(value.parse::<ImportType>()?),
        "description" => {
            simulation.classify(&value);
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown simulation field `{}`. Available: hs, origin, value, date, type, description",
                other
            )))
        }
    }
    if simulation.is_stale() {
        output::warning(format!(
            "Inputs changed ({}); run `sim calc` to recalculate.",
            simulation.changed_fields().join(", ")
        ));
    } else {
        output::success("Simulation updated.");
    }
    Ok(())
}

fn print_simulation(context: &ShellContext) {
    let simulation = &context.simulation;
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    output::section("Duty simulation");
    output::info(format!("  Type        : {}", simulation.import_type()));
    output::info(format!("  Description : {}", or_dash(simulation.description())));
    output::info(format!("  Product     : {}", or_dash(simulation.product_name())));
    output::info(format!("  HS code     : {}", or_dash(simulation.hs_code())));
    output::info(format!("  Origin      : {}", or_dash(simulation.origin_country())));
    output::info(format!("  Value (USD) : {}", or_dash(simulation.declared_value())));
    output::info(format!("  Date        : {}", simulation.declaration_date()));
    output::info(format!("  Base rate   : {}%", simulation.base_rate()));
    if let Some(rate) = simulation.preferential_rate() {
        output::info(format!("  FTA rate    : {}%", rate));
    }
    match simulation.current_estimate() {
        Some(estimate) => print_estimate(estimate),
        None if simulation.is_stale() => output::warning(format!(
            "Recalculation required: {} changed.",
            simulation.changed_fields().join(", ")
        )),
        None => output::hint("Run `sim calc` to estimate duty."),
    }
}

fn describe_simulation(record: &SimulationRecord) -> Vec<String> {
    vec![
        record.hs_code.clone(),
        record.origin_country.clone(),
        format_amount(record.estimated_duty, &CurrencyCode::new(REFERENCE_CURRENCY)),
    ]
}

fn print_estimate(estimate: &DutyEstimate) {
    let usd = CurrencyCode::new("USD");
    let krw = CurrencyCode::new(REFERENCE_CURRENCY);
    output::section("Duty estimate");
    output::info(format!("  Declared value: {}", format_amount(estimate.value_usd, &usd)));
    let applied = if estimate.is_preferential() {
        format!("{}% (FTA, base {}%)", estimate.applied_rate, estimate.base_rate)
    } else {
        format!("{}%", estimate.applied_rate)
    };
    output::info(format!("  Applied rate  : {}", applied));
    output::info(format!(
        "  Exchange rate : {} ({})",
        format_exchange_rate(estimate.exchange_rate),
        estimate.rate_date
    ));
    output::info(format!("  Duty (USD)    : {}", format_amount(estimate.duty_usd, &usd)));
    output::success(format!("Estimated duty: {}", format_amount(estimate.duty_krw, &krw)));
}

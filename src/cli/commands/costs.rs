//! Cost sheet commands: line items, display currency, shipment header and
//! the aggregated breakdown.

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::costs::{
    CalculationData, CostAggregationResult, CostCategory, CostLineItem, ImportType, Incoterm,
};
use crate::currency::{format_amount, format_number, CurrencyCode};
use crate::errors::CustomsError;
use crate::storage::RecordStorage;

use super::records::{delete_record, list_records, record_id, record_name};
use super::{parse_amount, parse_date_arg};

const ITEM_USAGE: &str = "item <add|list|set|remove|clear> ...";
const ITEM_ADD_USAGE: &str = "item add <name> <amount> [currency|-] [category] [YYYY-MM-DD]";
const ITEM_SET_USAGE: &str = "item set <id> <name|amount|currency|category|date> <value>";
const SHIPMENT_USAGE: &str =
    "shipment [hs|origin|destination|type|incoterm|duty|vat <value>]";
const CALC_USAGE: &str = "calc [save <name>|list [search]|load <id>|delete <id>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("rates", "Show the configured exchange rates", "rates", cmd_rates),
        CommandEntry::new(
            "currency",
            "Show or change the display currency",
            "currency [CODE]",
            cmd_currency,
        ),
        CommandEntry::new("item", "Edit cost line items", ITEM_USAGE, cmd_item),
        CommandEntry::new(
            "shipment",
            "Show or edit the shipment header",
            SHIPMENT_USAGE,
            cmd_shipment,
        ),
        CommandEntry::new(
            "calc",
            "Aggregate costs and manage saved calculations",
            CALC_USAGE,
            cmd_calc,
        ),
        CommandEntry::new(
            "incoterm",
            "List Incoterms or show one in detail",
            "incoterm [CODE]",
            cmd_incoterm,
        ),
    ]
}

fn cmd_rates(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let table = context.converter().table();
    let reference = table.reference().clone();
    output::section(format!("Exchange rates ({} per unit)", reference));
    let rows: Vec<Vec<String>> = table
        .currencies()
        .map(|(code, rate)| {
            vec![
                code.to_string(),
                format!("1 {} = {}", code, format_number(rate, 4)),
            ]
        })
        .collect();
    let rate_header = format!("Rate ({})", reference);
    output::render_table(&["Currency", rate_header.as_str()], &rows);
    Ok(())
}

fn cmd_currency(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(raw) = args.first() else {
        output::info(format!("Display currency: {}", context.display_currency));
        return Ok(());
    };
    let code = CurrencyCode::new(*raw);
    if !context.converter().table().contains(&code) {
        return Err(CustomsError::UnknownCurrency(code.to_string()).into());
    }
    context.display_currency = code;
    context.calculation = None;
    output::success(format!("Display currency set to {}.", context.display_currency));
    Ok(())
}

fn cmd_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return Err(CommandError::usage(ITEM_USAGE));
    };
    match action.to_ascii_lowercase().as_str() {
        "add" | "new" => add_item(context, rest),
        "list" | "ls" => {
            list_items(context);
            Ok(())
        }
        "set" | "edit" => set_item_field(context, rest),
        "remove" | "rm" => remove_item(context, rest),
        "clear" => {
            context.items.clear();
            context.calculation = None;
            output::success("All line items removed.");
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown item action `{}`. Available: add, list, set, remove, clear",
            other
        ))),
    }
}

fn add_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() < 2 {
        return Err(CommandError::usage(ITEM_ADD_USAGE));
    }
    let amount = parse_amount(args[1], "amount")?;
    let category = match args.get(3) {
        Some(raw) => raw.parse::<CostCategory>()?,
        None => CostCategory::default(),
    };
    let exchange_date = args.get(4).map(|raw| parse_date_arg(raw)).transpose()?;

    let currency = match args.get(2).map(|raw| raw.trim()) {
        None | Some("-") => context.display_currency.clone(),
        Some(code) => CurrencyCode::new(code),
    };

    let mut item = CostLineItem::new_in(args[0], currency.clone()).in_category(category);
    let converter = context.aggregator.converter();
    item.set_currency(currency, converter)?;
    item.set_amount(amount, converter)?;
    item.set_exchange_date(exchange_date, converter)?;

    output::success(format!(
        "Added {} `{}`: {} ({})",
        item.id,
        item.name,
        format_amount(item.amount, &item.currency),
        item.category
    ));
    context.items.push(item);
    context.calculation = None;
    Ok(())
}

fn set_item_field(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id, field, value @ ..] = args else {
        return Err(CommandError::usage(ITEM_SET_USAGE));
    };
    if value.is_empty() {
        return Err(CommandError::usage(ITEM_SET_USAGE));
    }
    let value = value.join(" ");
    let converter = context.aggregator.converter().clone();
    let item = context.find_item_mut(id)?;
    match field.to_ascii_lowercase().as_str() {
        "name" => item.set_name(value),
        "amount" => {
            item.set_amount(parse_amount(&value, "amount")?, &converter)?;
        }
        "currency" => {
            item.set_currency(value.as_str(), &converter)?;
        }
        "category" => item.set_category(value.parse()?),
        "date" => {
            let date = match value.trim() {
                "-" | "none" => None,
                raw => Some(parse_date_arg(raw)?),
            };
            item.set_exchange_date(date, &converter)?;
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown item field `{}`. Available: name, amount, currency, category, date",
                other
            )))
        }
    }
    let summary = format!("Updated {} `{}`.", item.id, item.name);
    context.calculation = None;
    output::success(summary);
    Ok(())
}

fn remove_item(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = record_id(args, "item remove <id>")?;
    let position = context
        .items
        .iter()
        .position(|item| item.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| CommandError::InvalidArguments(format!("no line item `{}`", id)))?;
    let removed = context.items.remove(position);
    context.calculation = None;
    output::success(format!("Removed {} `{}`.", removed.id, removed.name));
    Ok(())
}

fn list_items(context: &ShellContext) {
    if context.items.is_empty() {
        output::warning("No line items. Add one with `item add`.");
        return;
    }
    let reference = context.converter().reference().clone();
    output::section("Line items");
    let rows: Vec<Vec<String>> = context
        .items
        .iter()
        .map(|item| {
            vec![
                item.id.clone(),
                item.name.clone(),
                item.category.to_string(),
                format_amount(item.amount, &item.currency),
                item.amount_in_reference
                    .map(|value| format_amount(value, &reference))
                    .unwrap_or_else(|| "-".into()),
                item.exchange_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    output::render_table(
        &["ID", "Name", "Category", "Amount", reference.as_str(), "Rate date"],
        &rows,
    );
}

fn cmd_shipment(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((field, value)) = args.split_first() else {
        print_shipment(context);
        return Ok(());
    };
    let value = value.join(" ");
    let value = value.trim();
    let shipment = &mut context.shipment;
    match field.to_ascii_lowercase().as_str() {
        "hs" | "hs_code" => shipment.hs_code = value.to_string(),
        "origin" => shipment.origin_country = value.to_ascii_uppercase(),
        "destination" => shipment.destination_country = value.to_ascii_uppercase(),
        "type" => shipment.import_type = value.parse::<ImportType>()?,
        "incoterm" | "incoterms" => shipment.incoterm = value.parse::<Incoterm>()?,
        "duty" => shipment.customs_duty = super::parse_optional_rate(value)?,
        "vat" => shipment.vat = super::parse_optional_rate(value)?,
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown shipment field `{}`. Available: hs, origin, destination, type, incoterm, duty, vat",
                other
            )))
        }
    }
    context.calculation = None;
    output::success("Shipment updated.");
    Ok(())
}

fn print_shipment(context: &ShellContext) {
    let shipment = &context.shipment;
    let or_dash = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    let percent = |value: Option<f64>| {
        value
            .map(|rate| format!("{}%", rate))
            .unwrap_or_else(|| "-".into())
    };
    output::section("Shipment");
    output::info(format!("  HS code     : {}", or_dash(&shipment.hs_code)));
    output::info(format!("  Origin      : {}", or_dash(&shipment.origin_country)));
    output::info(format!("  Destination : {}", or_dash(&shipment.destination_country)));
    output::info(format!("  Type        : {}", shipment.import_type));
    output::info(format!("  Incoterm    : {}", shipment.incoterm));
    output::info(format!("  Customs duty: {}", percent(shipment.customs_duty)));
    output::info(format!("  VAT         : {}", percent(shipment.vat)));
}

fn cmd_calc(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        return calculate(context);
    };
    match action.to_ascii_lowercase().as_str() {
        "save" => save_calculation(context, rest),
        "list" | "ls" => list_records(
            &context.stores.calculations,
            "Saved calculations",
            rest,
            describe_calculation,
            &["Route", "Incoterm", "Total"],
        ),
        "load" => load_calculation(context, rest),
        "delete" | "rm" => delete_record(&context.stores.calculations, rest, "calc delete <id>"),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown calc action `{}`. Available: save, list, load, delete",
            other
        ))),
    }
}

fn calculate(context: &mut ShellContext) -> CommandResult {
    let (data, breakdown) = CalculationData::build(
        context.shipment.clone(),
        context.items.clone(),
        &context.display_currency,
        &context.aggregator,
    )?;
    print_breakdown(&breakdown);
    context.items = data.cost_items.clone();
    context.calculation = Some(data);
    Ok(())
}

fn save_calculation(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = record_name(args, "calc save <name>")?;
    let Some(data) = context.calculation.clone() else {
        return Err(CommandError::InvalidArguments(
            "nothing to save yet; run `calc` first".into(),
        ));
    };
    let saved = context.stores.calculations.save(&name, data)?;
    output::success(format!("Saved calculation `{}` as {}.", saved.name, saved.id));
    Ok(())
}

fn load_calculation(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = record_id(args, "calc load <id>")?;
    let record = context.stores.calculations.get(id)?;
    let data = record.data;
    if !data.verify_totals(&context.aggregator)? {
        output::warning("Stored totals differ from the current exchange rates.");
    }
    let breakdown = data.breakdown(&context.aggregator)?;
    context.items = data.cost_items.clone();
    context.shipment = data.details();
    context.display_currency = data.total_currency.clone();
    context.calculation = Some(data);
    output::success(format!("Loaded `{}`.", record.name));
    print_breakdown(&breakdown);
    Ok(())
}

fn describe_calculation(data: &CalculationData) -> Vec<String> {
    let route = match (data.origin_country.is_empty(), data.destination_country.is_empty()) {
        (true, true) => "-".to_string(),
        _ => format!("{} -> {}", data.origin_country, data.destination_country),
    };
    vec![
        route,
        data.incoterms.code().to_string(),
        format_amount(data.total_amount, &data.total_currency),
    ]
}

fn print_breakdown(breakdown: &CostAggregationResult) {
    if breakdown.is_empty() {
        output::warning("No line items to aggregate.");
        return;
    }
    let display = &breakdown.display_currency;
    let reference = &breakdown.reference_currency;
    output::section(format!("Cost breakdown ({})", display));
    let mut rows: Vec<Vec<String>> = breakdown
        .categories
        .iter()
        .map(|entry| {
            vec![
                entry.category.to_string(),
                entry.item_count.to_string(),
                format_amount(entry.subtotal, display),
                format_amount(entry.subtotal_in_reference, reference),
                entry.percentage_label(),
            ]
        })
        .collect();
    rows.push(vec![
        "Total".into(),
        breakdown
            .categories
            .iter()
            .map(|entry| entry.item_count)
            .sum::<usize>()
            .to_string(),
        format_amount(breakdown.total, display),
        format_amount(breakdown.total_in_reference, reference),
        if breakdown.total > 0.0 { "100.0%" } else { "0.0%" }.into(),
    ]);
    output::render_table(
        &["Category", "Items", display.as_str(), reference.as_str(), "Share"],
        &rows,
    );
}

fn cmd_incoterm(_context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(raw) = args.first() else {
        output::section("Incoterms 2020");
        let rows: Vec<Vec<String>> = Incoterm::ALL
            .iter()
            .map(|term| {
                vec![
                    term.code().to_string(),
                    term.title().to_string(),
                    if term.seller_pays_duty() { "seller" } else { "buyer" }.to_string(),
                ]
            })
            .collect();
        output::render_table(&["Code", "Term", "Import duty"], &rows);
        return Ok(());
    };
    let term: Incoterm = raw.parse()?;
    output::section(term.to_string());
    output::info(format!("  Seller: {}", term.seller_responsibility()));
    output::info(format!("  Buyer : {}", term.buyer_responsibility()));
    Ok(())
}

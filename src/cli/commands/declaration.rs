use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::costs::ImportType;
use crate::currency::{format_amount, format_exchange_rate, CurrencyCode, REFERENCE_CURRENCY};
use crate::declaration::{DeclarationData, TaxAssessment, DECLARATION_FIELDS};
use crate::storage::RecordStorage;

use super::records::{delete_record, list_records, record_id, record_name};

const DECL_USAGE: &str =
    "decl <show|new|from-sim|set|assess|save|list|load|delete> ...";
const DECL_SET_USAGE: &str = "decl set <field> <value>";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "decl",
        "Draft, assess and manage customs declarations",
        DECL_USAGE,
        cmd_decl,
    )]
}

fn cmd_decl(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        print_declaration(&context.declaration);
        return Ok(());
    };
    match action.to_ascii_lowercase().as_str() {
        "show" | "status" => {
            print_declaration(&context.declaration);
            Ok(())
        }
        "new" => {
            let import_type = match rest.first() {
                Some(raw) => raw.parse::<ImportType>()?,
                None => ImportType::Import,
            };
            context.declaration = DeclarationData::new(import_type, context.simulation.declaration_date());
            output::success(format!("Started a new {} declaration.", import_type));
            Ok(())
        }
        "from-sim" => {
            let record = match rest.first() {
                Some(id) => context.stores.simulations.get(id)?.data,
                None => context.simulation.to_record()?,
            };
            context.declaration = DeclarationData::from_simulation(&record);
            output::success(format!(
                "Declaration drafted from simulation ({} {}).",
                record.hs_code, record.product_name
            ));
            Ok(())
        }
        "set" => {
            let Some((field, value)) = rest.split_first() else {
                return Err(CommandError::usage(DECL_SET_USAGE));
            };
            context.declaration.set(field, &value.join(" "))?;
            output::success("Declaration updated.");
            Ok(())
        }
        "assess" | "calc" => {
            let assessment = context
                .declaration
                .assess(context.simulation.estimator(), context.simulation.tariffs())?;
            context.declaration.record_assessment(&assessment);
            print_assessment(&assessment);
            Ok(())
        }
        "save" => {
            let name = record_name(rest, "decl save <name>")?;
            if !context.declaration.is_assessed() {
                output::warning("Saving a declaration that has not been assessed.");
            }
            let saved = context
                .stores
                .declarations
                .save(&name, context.declaration.clone())?;
            output::success(format!("Saved declaration `{}` as {}.", saved.name, saved.id));
            Ok(())
        }
        "list" | "ls" => list_records(
            &context.stores.declarations,
            "Saved declarations",
            rest,
            describe_declaration,
            &["HS code", "Item", "Tax"],
        ),
        "load" => {
            let id = record_id(rest, "decl load <id>")?;
            let saved = context.stores.declarations.get(id)?;
            context.declaration = saved.data;
            output::success(format!("Loaded `{}`.", saved.name));
            print_declaration(&context.declaration);
            Ok(())
        }
        "delete" | "rm" => delete_record(&context.stores.declarations, rest, "decl delete <id>"),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown decl action `{}`. Available: show, new, from-sim, set, assess, save, list, load, delete",
            other
        ))),
    }
}

fn print_declaration(draft: &DeclarationData) {
    let or_dash = |value: &str| {
        if value.trim().is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    output::section("Customs declaration");
    output::info(format!("  Type        : {}", draft.declaration_type));
    output::info(format!("  Number      : {}", or_dash(&draft.declaration_number)));
    output::info(format!("  Date        : {}", draft.declaration_date));
    output::info(format!("  Company     : {}", or_dash(&draft.company)));
    output::info(format!("  HS code     : {}", or_dash(&draft.hs_code)));
    output::info(format!("  Item        : {}", or_dash(&draft.item_name)));
    output::info(format!("  Origin      : {}", or_dash(&draft.country_origin)));
    output::info(format!(
        "  Quantity    : {} {}",
        or_dash(&draft.item_quantity),
        draft.item_unit
    ));
    output::info(format!("  Price (USD) : {}", or_dash(&draft.item_price)));
    output::info(format!("  Incoterm    : {}", or_dash(&draft.incoterms)));
    output::info(format!("  Trade with  : {}", or_dash(&draft.trade_country)));

    let krw = CurrencyCode::new(REFERENCE_CURRENCY);
    match (draft.taxable_value, draft.tax_amount) {
        (Some(taxable), Some(tax)) => {
            output::info(format!("  Taxable     : {}", format_amount(taxable, &krw)));
            output::success(format!("Tax amount: {}", format_amount(tax, &krw)));
        }
        _ => {
            let missing = draft.missing_fields();
            if missing.is_empty() {
                output::hint("Run `decl assess` to compute the tax.");
            } else {
                output::hint(format!("Still required: {}", missing.join(", ")));
            }
            output::hint(format!("Fields: {}", DECLARATION_FIELDS.join(", ")));
        }
    }
}

fn print_assessment(assessment: &TaxAssessment) {
    let usd = CurrencyCode::new("USD");
    let krw = CurrencyCode::new(REFERENCE_CURRENCY);
    output::section("Tax assessment");
    output::info(format!("  Item price    : {}", format_amount(assessment.item_price, &usd)));
    output::info(format!(
        "  Exchange rate : {}",
        format_exchange_rate(assessment.exchange_rate)
    ));
    output::info(format!("  Taxable value : {}", format_amount(assessment.taxable_value, &krw)));
    output::info(format!("  Duty rate     : {}%", assessment.duty_rate));
    output::success(format!("Tax amount: {}", format_amount(assessment.tax_amount, &krw)));
}

fn describe_declaration(draft: &DeclarationData) -> Vec<String> {
    vec![
        draft.hs_code.clone(),
        draft.item_name.clone(),
        draft
            .tax_amount
            .map(|tax| format_amount(tax, &CurrencyCode::new(REFERENCE_CURRENCY)))
            .unwrap_or_else(|| "-".to_string()),
    ]
}

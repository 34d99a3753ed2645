use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::cli::shell_context::ShellContext;
use crate::currency::format_number;

use super::parse_amount;

const CONFIG_USAGE: &str = "config [show|set <locale|currency|data_root> <value>|rate <CODE> <rate>]";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "Show or change persistent settings",
        CONFIG_USAGE,
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((action, rest)) = args.split_first() else {
        show_config(context);
        return Ok(());
    };
    match action.to_ascii_lowercase().as_str() {
        "show" => {
            show_config(context);
            Ok(())
        }
        "set" => {
            let [key, value @ ..] = rest else {
                return Err(CommandError::usage(CONFIG_USAGE));
            };
            let mut config = context.config.clone();
            config.set(key, &value.join(" "))?;
            context.apply_config(config)?;
            context.display_currency = context.config.display_currency();
            output::success("Configuration updated.");
            Ok(())
        }
        "rate" => {
            let [code, rate] = rest else {
                return Err(CommandError::usage("config rate <CODE> <rate>"));
            };
            let mut config = context.config.clone();
            config.set_rate(code, parse_amount(rate, "rate")?)?;
            context.apply_config(config)?;
            output::success(format!("Rate for {} updated.", code.to_ascii_uppercase()));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`. Available: show, set, rate",
            other
        ))),
    }
}

fn show_config(context: &ShellContext) {
    let config = &context.config;
    output::section("Configuration");
    output::info(format!("  Locale            : {}", config.locale));
    output::info(format!("  Display currency  : {}", config.display_currency));
    output::info(format!("  Reference currency: {}", config.reference_currency));
    output::info(format!("  Data directory    : {}", context.stores.root().display()));
    output::info(format!("  Config file       : {}", context.config_manager.path().display()));
    let rates: Vec<String> = config
        .rates
        .iter()
        .map(|(code, rate)| format!("{}={}", code, format_number(*rate, 2)))
        .collect();
    output::info(format!("  Rates             : {}", rates.join(", ")));
}

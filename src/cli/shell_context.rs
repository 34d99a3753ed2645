use std::path::PathBuf;

use shell_words::split;
use strsim::levenshtein;
use tracing::warn;

use crate::{
    config::{Config, ConfigManager},
    costs::{CalculationData, CostAggregator, CostLineItem, ShipmentDetails},
    currency::{CurrencyCode, CurrencyConverter},
    declaration::DeclarationData,
    duty::DutySimulation,
    storage::RecordStores,
};

use super::commands;
use super::core::{CliError, CommandError, LoopControl};
use super::output;
use super::registry::{CommandEntry, CommandRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Everything a shell session works on: configuration, the cost sheet being
/// edited, the duty simulation, the declaration draft and the saved-record
/// collections.
pub struct ShellContext {
    pub(crate) mode: CliMode,
    pub(crate) registry: CommandRegistry,
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: Config,
    pub(crate) aggregator: CostAggregator,
    pub(crate) stores: RecordStores,
    pub(crate) items: Vec<CostLineItem>,
    pub(crate) shipment: ShipmentDetails,
    pub(crate) display_currency: CurrencyCode,
    pub(crate) calculation: Option<CalculationData>,
    pub(crate) simulation: DutySimulation,
    pub(crate) declaration: DeclarationData,
    pub(crate) running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::from_config_manager(mode, ConfigManager::new()?, None)
    }

    /// Session rooted at `base` for both configuration and saved records.
    pub fn with_base_dir(mode: CliMode, base: impl Into<PathBuf>) -> Result<Self, CliError> {
        let base = base.into();
        let manager = ConfigManager::with_base_dir(&base)?;
        Self::from_config_manager(mode, manager, Some(base))
    }

    fn from_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
        base: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config = config_manager.load()?;
        let aggregator = CostAggregator::new(CurrencyConverter::new(config.rate_table()?));
        let stores = RecordStores::new(config.data_root.clone().or(base))?;
        let display_currency = config.display_currency();

        Ok(Self {
            mode,
            registry,
            config_manager,
            config,
            aggregator,
            stores,
            items: Vec::new(),
            shipment: ShipmentDetails::default(),
            display_currency,
            calculation: None,
            simulation: DutySimulation::default(),
            declaration: DeclarationData::default(),
            running: true,
        })
    }

    pub fn mode(&self) -> CliMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn converter(&self) -> &CurrencyConverter {
        self.aggregator.converter()
    }

    pub fn prompt(&self) -> String {
        let marker = if self.simulation.is_stale() { "*" } else { "" };
        format!("customs[{}{}]> ", self.display_currency, marker)
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    /// Codes of the active rate table, reference currency included.
    pub fn currency_codes(&self) -> Vec<String> {
        self.converter()
            .table()
            .currencies()
            .map(|(code, _)| code.to_string())
            .collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    /// Saves the configuration and rebuilds the converter from its rate table.
    pub(crate) fn apply_config(&mut self, config: Config) -> Result<(), CommandError> {
        let converter = CurrencyConverter::new(config.rate_table()?);
        self.config_manager.save(&config)?;
        self.aggregator = CostAggregator::new(converter);
        self.config = config;
        for item in &mut self.items {
            if let Err(err) = item.refresh(self.aggregator.converter()) {
                warn!(item = %item.id, error = %err, "line item no longer converts");
                item.amount_in_reference = None;
            }
        }
        self.calculation = None;
        Ok(())
    }

    pub(crate) fn find_item_mut(&mut self, id: &str) -> Result<&mut CostLineItem, CommandError> {
        let wanted = id.trim();
        self.items
            .iter_mut()
            .find(|item| item.id.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CommandError::InvalidArguments(format!("no line item `{}`", wanted)))
    }

    /// Parses and runs one input line.
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };

        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = closest_name(self.registry.names(), &input.to_lowercase()) {
            output::hint(format!("Did you mean `{}`?", best));
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(err) => output::error(err),
        }
    }
}

fn closest_name<'a>(names: impl Iterator<Item = &'a str>, input: &str) -> Option<&'a str> {
    names
        .map(|name| (levenshtein(name, input), name))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordStorage;
    use tempfile::TempDir;

    fn context() -> (ShellContext, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let context = ShellContext::with_base_dir(CliMode::Script, temp.path()).expect("context");
        (context, temp)
    }

    #[test]
    fn suggests_close_command_names() {
        let names = ["calc", "classify", "currency"];
        assert_eq!(closest_name(names.iter().copied(), "cals"), Some("calc"));
        assert_eq!(closest_name(names.iter().copied(), "zzzzzz"), None);
    }

    #[test]
    fn exit_stops_the_session() {
        let (mut context, _guard) = context();
        assert_eq!(context.process_line("exit").unwrap(), LoopControl::Exit);
        assert!(!context.is_running());
    }

    #[test]
    fn unknown_commands_do_not_fail() {
        let (mut context, _guard) = context();
        assert_eq!(context.process_line("calcc").unwrap(), LoopControl::Continue);
        assert_eq!(context.process_line("   ").unwrap(), LoopControl::Continue);
    }

    #[test]
    fn cost_sheet_flow() {
        let (mut context, _guard) = context();
        context
            .process_line("item add \"Customs broker\" 100 USD customs")
            .unwrap();
        context.process_line("item add Trucking 50000 KRW freight").unwrap();
        context.process_line("calc").unwrap();

        let calculation = context.calculation.as_ref().expect("calculation");
        assert!((calculation.total_amount - (100.0 + 50_000.0 / 1330.0)).abs() < 1e-9);
        assert_eq!(calculation.cost_items.len(), 2);

        context.process_line("calc save \"First quote\"").unwrap();
        assert_eq!(context.stores.calculations.list().unwrap().len(), 1);
    }

    #[test]
    fn simulation_flow_tracks_staleness() {
        let (mut context, _guard) = context();
        context.process_line("sim set hs 8471.30.0000").unwrap();
        context.process_line("sim set origin CN").unwrap();
        context.process_line("sim set value 1000").unwrap();
        context.process_line("sim set date 2023-03-15").unwrap();
        context.process_line("sim calc").unwrap();
        let estimate = context.simulation.current_estimate().expect("estimate");
        assert!((estimate.duty_krw - 107_320.0).abs() < 1e-6);

        context.process_line("sim set origin US").unwrap();
        assert!(context.simulation.needs_recalculation());
        assert!(matches!(
            context.process_line("sim save Stale"),
            Err(CommandError::Core(_))
        ));
    }

    #[test]
    fn declaration_drafted_from_the_simulation() {
        let (mut context, _guard) = context();
        context.process_line("sim set hs 8471.30.0000").unwrap();
        context.process_line("sim set origin CN").unwrap();
        context.process_line("sim set value 1000").unwrap();
        context.process_line("sim set date 2025-03-15").unwrap();
        context.process_line("sim calc").unwrap();

        context.process_line("decl from-sim").unwrap();
        context.process_line("decl set number 12345-25-000001M").unwrap();
        context.process_line("decl assess").unwrap();
        assert_eq!(context.declaration.taxable_value, Some(1_343_000.0));
        assert_eq!(context.declaration.tax_amount, Some(107_440.0));

        context.process_line("decl save \"Laptop import\"").unwrap();
        let saved = context.stores.declarations.list().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].data.declaration_number, "12345-25-000001M");
    }

    #[test]
    fn items_without_a_currency_use_the_display_currency() {
        let (mut context, _guard) = context();
        context.process_line("currency KRW").unwrap();
        context.process_line("item add Trucking 50000").unwrap();
        context.process_line("item add Handling 20000 - warehouse").unwrap();
        context.process_line("item add Broker 100 usd customs").unwrap();

        let currencies: Vec<_> = context.items.iter().map(|item| item.currency.as_str()).collect();
        assert_eq!(currencies, vec!["KRW", "KRW", "USD"]);
        assert_eq!(context.items[0].amount_in_reference, Some(50_000.0));
    }
}

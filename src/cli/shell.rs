use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use crate::costs::{CostCategory, Incoterm};
use crate::declaration::DECLARATION_FIELDS;

use crate::cli::core::{CliError, LoopControl};
use crate::cli::output;
use crate::cli::shell_context::{CliMode, ShellContext};

pub const SCRIPT_ENV: &str = "CUSTOMS_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    let helper = CommandHelper::new(context.command_names(), context.currency_codes());
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    output::info("Customs cost & duty shell. Type `help` to list commands.");

    while context.is_running() {
        let prompt = context.prompt();
        match editor.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(trimmed).ok();
                match context.process_line(trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err),
                }
                if let Some(helper) = editor.helper_mut() {
                    helper.set_currencies(context.currency_codes());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.is_running() {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match context.process_line(trimmed) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
    }
    Ok(())
}

/// Tab completion for command names, their actions and field names, and the
/// currency codes of the active rate table.
struct CommandHelper {
    commands: Vec<String>,
    currencies: Vec<String>,
}

impl CommandHelper {
    fn new(names: Vec<&'static str>, currencies: Vec<String>) -> Self {
        let mut commands: Vec<String> = names
            .into_iter()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        commands.sort();
        commands.dedup();
        Self {
            commands,
            currencies,
        }
    }

    fn set_currencies(&mut self, currencies: Vec<String>) {
        self.currencies = currencies;
    }

    /// Words that may follow `words`, which hold every completed token.
    fn candidates(&self, words: &[String]) -> Vec<String> {
        let words: Vec<String> = words.iter().map(|word| word.to_ascii_lowercase()).collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        match words.as_slice() {
            [] => self.commands.clone(),
            ["help"] => self.commands.clone(),
            ["currency"] | ["config", "rate"] | ["config", "set", "currency"] => {
                self.currencies.clone()
            }
            ["item", "add", _, _] => self.currencies.clone(),
            ["item", "add", _, _, _] => CostCategory::ALL
                .iter()
                .map(|category| category.key().to_string())
                .collect(),
            ["incoterm"] | ["shipment", "incoterm"] | ["decl", "set", "incoterm"] => Incoterm::ALL
                .iter()
                .map(|term| term.code().to_string())
                .collect(),
            ["shipment", "type"] | ["sim", "set", "type"] | ["decl", "new"] | ["decl", "set", "type"] => {
                owned(&["import", "export"])
            }
            [command] => owned(actions_for(command)),
            ["sim", "set"] => owned(&SIM_FIELDS),
            ["decl", "set"] => owned(&DECLARATION_FIELDS),
            ["config", "set"] => owned(&CONFIG_KEYS),
            ["item", "set", _] => owned(&ITEM_FIELDS),
            _ => Vec::new(),
        }
    }
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|word| word.to_string()).collect()
}

const SIM_FIELDS: [&str; 6] = ["hs", "origin", "value", "date", "type", "description"];
const ITEM_FIELDS: [&str; 5] = ["name", "amount", "currency", "category", "date"];
const CONFIG_KEYS: [&str; 3] = ["locale", "currency", "data_root"];

fn actions_for(command: &str) -> &'static [&'static str] {
    match command {
        "item" => &["add", "list", "set", "remove", "clear"],
        "calc" => &["save", "list", "load", "delete"],
        "sim" => &["set", "calc", "status", "reset", "save", "list", "load", "delete"],
        "decl" => &[
            "show", "new", "from-sim", "set", "assess", "save", "list", "load", "delete",
        ],
        "config" => &["show", "set", "rate"],
        "shipment" => &["hs", "origin", "destination", "type", "incoterm", "duty", "vat"],
        _ => &[],
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);

        // An open quote leaves nothing to complete.
        let Ok(words) = split(&prefix[..start]) else {
            return Ok((start, Vec::new()));
        };

        let needle = prefix[start..].to_ascii_lowercase();
        let candidates = self
            .candidates(&words)
            .into_iter()
            .filter(|word| word.to_ascii_lowercase().starts_with(&needle))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

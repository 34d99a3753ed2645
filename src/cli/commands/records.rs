//! Shared `save | list | load | delete` handling for saved-record collections.

use crate::cli::core::{CommandError, CommandResult};
use crate::cli::output;
use crate::storage::{sort_records, RecordOrder, RecordPayload, RecordStorage, SavedRecord};

/// Joins the remaining arguments into a record name.
pub(crate) fn record_name(args: &[&str], usage: &str) -> Result<String, CommandError> {
    let name = args.join(" ");
    if name.trim().is_empty() {
        Err(CommandError::usage(usage))
    } else {
        Ok(name.trim().to_string())
    }
}

pub(crate) fn record_id<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    args.first().copied().ok_or_else(|| CommandError::usage(usage))
}

/// Lists records, newest first, optionally filtered by a search term.
pub(crate) fn list_records<T, S>(
    store: &S,
    title: &str,
    args: &[&str],
    describe: fn(&T) -> Vec<String>,
    headers: &[&str],
) -> CommandResult
where
    T: RecordPayload,
    S: RecordStorage<T>,
{
    let term = args.join(" ");
    let mut records = if term.trim().is_empty() {
        store.list()?
    } else {
        store.search(&term)?
    };
    if records.is_empty() {
        output::warning(format!("No saved {} found.", title.to_lowercase()));
        return Ok(());
    }
    sort_records(&mut records, RecordOrder::Newest);

    output::section(title);
    let mut all_headers = vec!["ID", "Name", "Saved"];
    all_headers.extend_from_slice(headers);
    let rows: Vec<Vec<String>> = records.iter().map(|record| row(record, describe)).collect();
    output::render_table(&all_headers, &rows);
    Ok(())
}

fn row<T: RecordPayload>(record: &SavedRecord<T>, describe: fn(&T) -> Vec<String>) -> Vec<String> {
    let mut cells = vec![record.id.clone(), record.name.clone(), record.date.clone()];
    cells.extend(describe(&record.data));
    cells
}

pub(crate) fn delete_record<T, S>(store: &S, args: &[&str], usage: &str) -> CommandResult
where
    T: RecordPayload,
    S: RecordStorage<T>,
{
    let id = record_id(args, usage)?;
    let removed = store.delete(id)?;
    output::success(format!("Deleted `{}` ({}).", removed.name, removed.id));
    Ok(())
}

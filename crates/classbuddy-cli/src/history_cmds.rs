//! CLI handlers for `classbuddy history` subcommands.
//!
//! Implements:
//! - `classbuddy history list [--json]` -- saved lessons, most recent first
//! - `classbuddy history show <id>`     -- one entry as JSON
//! - `classbuddy history delete <id>`   -- remove one entry
//! - `classbuddy history clear`         -- remove every entry
//! - `classbuddy history save <file>`   -- save a plan file as a new entry

use std::io::Write;

use anyhow::{Context, Result, bail};

use classbuddy_store::{HISTORY_CAPACITY, HistoryLedger};

use crate::HistoryCommands;
use crate::plan_file;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `HistoryCommands` variant against `ledger`, printing to `out`.
pub fn run_history_command(
    command: HistoryCommands,
    ledger: &mut HistoryLedger,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        HistoryCommands::List { json } => cmd_list(ledger, json, out),
        HistoryCommands::Show { id } => cmd_show(ledger, &id, out),
        HistoryCommands::Delete { id } => cmd_delete(ledger, &id, out),
        HistoryCommands::Clear => cmd_clear(ledger, out),
        HistoryCommands::Save { file } => cmd_save(ledger, &file, out),
    }
}

fn storage_error(e: classbuddy_store::StoreError) -> anyhow::Error {
    let message = e.user_message();
    anyhow::Error::new(e).context(message)
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

fn cmd_list(ledger: &HistoryLedger, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(ledger.list())?)?;
        return Ok(());
    }

    if ledger.is_empty() {
        writeln!(out, "No saved lessons.")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<36}  {:<24}  {:>5}  {:>8}  SUBJECT",
        "ID", "SAVED", "MIN", "SECTIONS"
    )?;
    for entry in ledger.list() {
        let plan = &entry.lesson_plan;
        writeln!(
            out,
            "{:<36}  {:<24}  {:>5}  {:>8}  {}",
            entry.id,
            entry.created_at,
            plan.total_duration,
            plan.sections.len(),
            plan.display_subject()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{} of {HISTORY_CAPACITY} slots used.", ledger.len())?;
    Ok(())
}

fn cmd_show(ledger: &HistoryLedger, id: &str, out: &mut impl Write) -> Result<()> {
    let Some(entry) = ledger.get(id) else {
        bail!("no history entry with id {id}");
    };
    writeln!(out, "{}", serde_json::to_string_pretty(entry)?)?;
    Ok(())
}

fn cmd_delete(ledger: &mut HistoryLedger, id: &str, out: &mut impl Write) -> Result<()> {
    let removed = ledger.delete(id).map_err(storage_error)?;
    if removed {
        writeln!(out, "Deleted {id}.")?;
    } else {
        writeln!(out, "No history entry with id {id}; nothing deleted.")?;
    }
    Ok(())
}

fn cmd_clear(ledger: &mut HistoryLedger, out: &mut impl Write) -> Result<()> {
    let count = ledger.len();
    ledger.clear().map_err(storage_error)?;
    writeln!(out, "History cleared ({count} entries removed).")?;
    Ok(())
}

fn cmd_save(ledger: &mut HistoryLedger, file: &str, out: &mut impl Write) -> Result<()> {
    let plan = plan_file::read_plan(file)?;
    let saved = ledger
        .save(&plan)
        .map_err(storage_error)
        .context("failed to save plan to history")?;
    writeln!(out, "Saved \"{}\" as {}", plan.display_subject(), saved.id)?;
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

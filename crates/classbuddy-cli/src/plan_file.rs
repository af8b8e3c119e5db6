//! Reading and writing lesson plan JSON files.
//!
//! A plan file holds either a bare `LessonPlan` or a `SavedLesson` (as
//! printed by `classbuddy history show`). The path `-` means stdin/stdout.

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use classbuddy_store::{HistoryLedger, LessonPlan, SavedLesson};

/// Parse plan JSON, accepting a bare plan or a saved history entry.
pub fn parse_plan(json: &str) -> Result<LessonPlan> {
    if let Ok(plan) = serde_json::from_str::<LessonPlan>(json) {
        return Ok(plan);
    }
    if let Ok(saved) = serde_json::from_str::<SavedLesson>(json) {
        return Ok(saved.lesson_plan);
    }
    // Neither shape: report the plan parse error, it is the common case.
    serde_json::from_str::<LessonPlan>(json).context("not a lesson plan JSON document")
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read plan from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read plan file: {path}"))
    }
}

/// Read and parse the plan file at `path` (`-` for stdin).
pub fn read_plan(path: &str) -> Result<LessonPlan> {
    let json = read_input(path)?;
    parse_plan(&json).with_context(|| format!("failed to parse plan file: {path}"))
}

/// Load a plan from `file`, or from the history entry `history_id`.
///
/// Exactly one of the two must be given.
pub fn load_plan(
    file: Option<&str>,
    history_id: Option<&str>,
    history: impl FnOnce() -> Result<HistoryLedger>,
) -> Result<LessonPlan> {
    match (file, history_id) {
        (Some(path), None) => read_plan(path),
        (None, Some(id)) => {
            let ledger = history()?;
            ledger
                .get(id)
                .map(|saved| saved.lesson_plan.clone())
                .with_context(|| format!("no history entry with id {id}"))
        }
        (Some(_), Some(_)) => bail!("give either a plan file or --from-history, not both"),
        (None, None) => bail!("a plan file or --from-history <ID> is required"),
    }
}

/// Pretty-print `value` as JSON to `output` (a path) or stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    match output {
        Some(path) if path != "-" => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("cannot create output file: {path}"))?;
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

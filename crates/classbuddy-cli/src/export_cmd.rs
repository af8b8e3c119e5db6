use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDateTime};

use classbuddy_core::LessonPlan;
use classbuddy_core::export::{self, DocumentKind};

/// Parse `--format`: one kind, a comma-separated list, or `all`.
pub fn parse_formats(formats: &str) -> Result<Vec<DocumentKind>> {
    if formats.trim().eq_ignore_ascii_case("all") {
        return Ok(DocumentKind::ALL.to_vec());
    }
    let mut kinds = Vec::new();
    for part in formats.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: DocumentKind = part.parse().map_err(|e: export::ExportError| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        bail!("no export format given");
    }
    Ok(kinds)
}

/// Where the `kind` rendering of `plan` goes.
///
/// Without `output` the default file name lands in the working directory. An
/// existing directory receives the default file name; anything else is taken
/// as the file path, which only makes sense for a single format.
fn target_path(
    plan: &LessonPlan,
    kind: DocumentKind,
    output: Option<&Path>,
    generated_at: NaiveDateTime,
    several: bool,
) -> Result<PathBuf> {
    let name = export::export_file_name(plan, kind.extension(), generated_at.date());
    match output {
        None => Ok(PathBuf::from(name)),
        Some(dir) if dir.is_dir() => Ok(dir.join(name)),
        Some(_) if several => bail!("--output must be an existing directory when exporting several formats"),
        Some(file) => Ok(file.to_path_buf()),
    }
}

/// Render `plan` once per kind and write the files. Returns the written paths.
pub fn write_exports(
    plan: &LessonPlan,
    kinds: &[DocumentKind],
    output: Option<&Path>,
    generated_at: NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    let several = kinds.len() > 1;
    let mut written = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let path = target_path(plan, kind, output, generated_at, several)?;
        let bytes = export::render(plan, kind, generated_at).map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })?;
        std::fs::write(&path, &bytes)
            .with_context(|| format!("cannot create output file: {}", path.display()))?;
        tracing::info!(kind = %kind, path = %path.display(), bytes = bytes.len(), "exported plan");
        written.push(path);
    }
    Ok(written)
}

pub fn run_export(plan: &LessonPlan, format: &str, output: Option<&Path>) -> Result<()> {
    let kinds = parse_formats(format)?;
    let written = write_exports(plan, &kinds, output, Local::now().naive_local())?;
    for path in &written {
        println!("Exported {}", path.display());
    }
    Ok(())
}

//! `classbuddy generate`: one lesson plan from the chat backend.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;

use classbuddy_core::LessonPlan;
use classbuddy_core::lesson::{LessonGenerator, LessonRequest};
use classbuddy_core::llm::GatewayClient;
use classbuddy_store::HistoryLedger;

use crate::config::ClassBuddyConfig;
use crate::plan_file;

pub struct GenerateOptions<'a> {
    /// Plan JSON destination; stdout when `None`.
    pub output: Option<&'a str>,
    pub save: bool,
}

/// Build the generator for the resolved chat configuration.
pub fn build_generator(config: &ClassBuddyConfig) -> Result<LessonGenerator> {
    let client = GatewayClient::new(config.chat.clone()).context("failed to build chat client")?;
    Ok(LessonGenerator::new(Arc::new(client)).with_max_tokens(config.chat.max_tokens))
}

/// Run the generator, giving up when `cancel` fires.
pub async fn generate_plan(
    generator: &LessonGenerator,
    request: &LessonRequest,
    cancel: &CancellationToken,
) -> Result<LessonPlan> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => bail!("lesson generation cancelled"),
        result = generator.generate(request) => result.map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        }),
    }
}

pub async fn run_generate(
    config: &ClassBuddyConfig,
    request: &LessonRequest,
    options: &GenerateOptions<'_>,
    cancel: &CancellationToken,
    history: impl FnOnce() -> Result<HistoryLedger>,
) -> Result<()> {
    let generator = build_generator(config)?;
    let plan = generate_plan(&generator, request, cancel).await?;

    if let Some((sections, total)) = plan.duration_mismatch() {
        eprintln!("Note: sections add up to {sections} min, plan total is {total} min.");
    }

    plan_file::write_json(&plan, options.output)?;
    if let Some(path) = options.output {
        eprintln!(
            "Lesson plan \"{}\" ({} sections) written to {path}",
            plan.display_subject(),
            plan.sections.len()
        );
    }

    if options.save {
        let mut ledger = history()?;
        let saved = ledger.save(&plan).context("failed to save plan to history")?;
        eprintln!("Saved to history as {}", saved.id);
    }

    Ok(())
}

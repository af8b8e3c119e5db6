//! `classbuddy slides`: a Gamma presentation for a plan.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use classbuddy_core::LessonPlan;
use classbuddy_core::slides::{GammaClient, SlideDeckLinks, SlideOrchestrator};

use crate::config::ClassBuddyConfig;

pub fn build_orchestrator(config: &ClassBuddyConfig) -> Result<SlideOrchestrator> {
    let client = GammaClient::new(config.gamma.clone()).context("failed to build Gamma client")?;
    Ok(SlideOrchestrator::new(Arc::new(client)))
}

pub async fn create_deck(
    orchestrator: &SlideOrchestrator,
    plan: &LessonPlan,
    cancel: &CancellationToken,
) -> Result<SlideDeckLinks> {
    orchestrator
        .submit_and_await(plan, cancel)
        .await
        .map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })
}

/// One `label: url` line per link, `-` for a missing one.
pub fn render_links(links: &SlideDeckLinks) -> String {
    let line = |label: &str, url: &Option<String>| {
        format!("{label:<6} {}\n", url.as_deref().unwrap_or("-"))
    };
    let mut out = String::new();
    out.push_str(&line("Gamma:", &links.gamma_url));
    out.push_str(&line("PPTX:", &links.pptx_url));
    out.push_str(&line("PDF:", &links.pdf_url));
    out
}

pub async fn run_slides(
    config: &ClassBuddyConfig,
    plan: &LessonPlan,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    eprintln!(
        "Submitting \"{}\" to Gamma ({} sections)...",
        plan.display_subject(),
        plan.sections.len()
    );
    let links = create_deck(&orchestrator, plan, cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
    } else {
        print!("{}", render_links(&links));
    }
    Ok(())
}

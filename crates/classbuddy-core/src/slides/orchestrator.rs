//! Submit a lesson plan for slide generation and wait for the result.
//!
//! The flow is: create the generation job, poll its status until it
//! completes, and when the completed job carries no PPTX link, run one
//! secondary export job for it. Failures of the secondary export are logged
//! and dropped; the caller gets whatever links exist.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::LessonPlan;
use crate::poll::{PollError, Probe, RetryPolicy, poll_until};

use super::api::SlidesApi;
use super::error::SlidesError;
use super::input::{build_input_text, card_count};
use super::types::{
    ExportFormat, ExportTicket, GenerationRequest, GenerationSnapshot, GenerationStatus,
    SlideDeckLinks,
};

/// Polling budgets for the two jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub job_policy: RetryPolicy,
    pub export_policy: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            job_policy: RetryPolicy::generation_job(),
            export_policy: RetryPolicy::export_job(),
        }
    }
}

pub struct SlideOrchestrator {
    api: Arc<dyn SlidesApi>,
    config: OrchestratorConfig,
}

impl SlideOrchestrator {
    pub fn new(api: Arc<dyn SlidesApi>) -> Self {
        Self::with_config(api, OrchestratorConfig::default())
    }

    pub fn with_config(api: Arc<dyn SlidesApi>, config: OrchestratorConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Generate a deck for `plan` and return its links.
    ///
    /// Honors `cancel` at every request and every wait, including inside the
    /// secondary export.
    pub async fn submit_and_await(
        &self,
        plan: &LessonPlan,
        cancel: &CancellationToken,
    ) -> Result<SlideDeckLinks, SlidesError> {
        let request = GenerationRequest::presentation(build_input_text(plan), card_count(plan));
        let created = cancellable(cancel, self.api.create_generation(&request)).await?;

        let generation_id = created
            .generation_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SlidesError::Protocol("no generationId returned".to_string()))?;

        info!(
            %generation_id,
            num_cards = request.num_cards,
            "slide generation submitted"
        );

        let snapshot = self.await_generation(&generation_id, cancel).await?;
        let mut links = SlideDeckLinks {
            gamma_url: snapshot.gamma_url,
            pptx_url: snapshot.pptx_url,
            pdf_url: snapshot.pdf_url,
        };

        if links.pptx_url.is_none() {
            match self.export_deck(&generation_id, cancel).await {
                Ok(url) => {
                    info!(%generation_id, "secondary export finished");
                    links.pptx_url = Some(url);
                }
                Err(SlidesError::Cancelled) => return Err(SlidesError::Cancelled),
                Err(e) => {
                    warn!(%generation_id, error = %e, "secondary export failed, returning available links");
                }
            }
        }

        info!(
            %generation_id,
            has_pptx = links.pptx_url.is_some(),
            has_pdf = links.pdf_url.is_some(),
            "slide generation completed"
        );
        Ok(links)
    }

    async fn await_generation(
        &self,
        generation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<GenerationSnapshot, SlidesError> {
        let api = &self.api;
        poll_until(&self.config.job_policy, cancel, "generation", move |_| async move {
            let snapshot = api.generation_status(generation_id).await?;
            Ok::<_, SlidesError>(match snapshot.status {
                GenerationStatus::Completed => Probe::Ready(snapshot),
                GenerationStatus::Failed => Probe::Failed("generation reported failed".to_string()),
                GenerationStatus::Pending | GenerationStatus::Unknown => Probe::Pending,
            })
        })
        .await
        .map_err(SlidesError::from)
    }

    /// Request a PPTX export and wait for its URL.
    async fn export_deck(
        &self,
        generation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SlidesError> {
        let ticket = cancellable(
            cancel,
            self.api.request_export(generation_id, ExportFormat::Pptx),
        )
        .await?;

        let export_id = match ticket {
            ExportTicket::Ready(url) => return Ok(url),
            ExportTicket::Pending(export_id) => export_id,
        };

        let api = &self.api;
        let export_id = export_id.as_str();
        poll_until(&self.config.export_policy, cancel, "export", move |_| async move {
            let snapshot = api.export_status(generation_id, export_id).await?;
            Ok::<_, SlidesError>(match (snapshot.status, snapshot.url) {
                (GenerationStatus::Completed, Some(url)) => Probe::Ready(url),
                (GenerationStatus::Completed, None) => {
                    Probe::Failed("export completed without a download URL".to_string())
                }
                (GenerationStatus::Failed, _) => Probe::Failed("export reported failed".to_string()),
                _ => Probe::Pending,
            })
        })
        .await
        .map_err(SlidesError::from)
    }
}

impl From<PollError> for SlidesError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Failed(reason) => Self::GenerationFailed(reason),
            PollError::Exhausted { attempts } => Self::Timeout { attempts },
            PollError::TooManyErrors { errors, last } => Self::StatusUnavailable { errors, last },
            PollError::Cancelled => Self::Cancelled,
        }
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, SlidesError>>,
) -> Result<T, SlidesError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SlidesError::Cancelled),
        result = call => result,
    }
}

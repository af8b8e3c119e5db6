use std::sync::Arc;

use tracing::{info, warn};

use crate::LessonPlan;
use crate::llm::{ChatModel, ChatRequest};

use super::error::GenerateError;
use super::normalize::normalize_response;
use super::prompt::{LessonRequest, build_prompt};

/// Turns a [`LessonRequest`] into a [`LessonPlan`] through a [`ChatModel`].
pub struct LessonGenerator {
    model: Arc<dyn ChatModel>,
    max_tokens: u32,
}

impl LessonGenerator {
    pub const DEFAULT_MAX_TOKENS: u32 = 32_000;

    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Validate, prompt, call the model once and normalize its reply.
    ///
    /// Nothing is retried: a malformed reply surfaces as
    /// [`GenerateError::MalformedResponse`] and the user decides.
    pub async fn generate(&self, request: &LessonRequest) -> Result<LessonPlan, GenerateError> {
        let prompt = build_prompt(request)?;

        info!(
            backend = self.model.name(),
            total_time = request.total_time,
            subject = %request.prompt_subject(),
            has_source = request.source().is_some(),
            "generating lesson plan"
        );

        let reply = self
            .model
            .complete(&ChatRequest {
                system: prompt.system,
                user: prompt.user,
                max_tokens: self.max_tokens,
            })
            .await
            .inspect_err(|e| warn!(backend = self.model.name(), error = %e, "chat call failed"))?;

        let plan = normalize_response(&reply)
            .inspect_err(|e| warn!(reply_chars = reply.len(), error = %e, "unusable model reply"))?;

        if let Some((sections, total)) = plan.duration_mismatch() {
            warn!(
                section_minutes = sections,
                total_duration = total,
                "section durations do not add up to the lesson total"
            );
        }

        info!(sections = plan.sections.len(), "lesson plan generated");
        Ok(plan)
    }
}

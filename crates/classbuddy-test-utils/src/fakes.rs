//! Scripted fakes for the model and slides seams.
//!
//! Each fake replays a fixed script and counts calls so tests can assert
//! exactly how many round trips a workflow made.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use classbuddy_core::llm::{ChatError, ChatModel, ChatRequest};
use classbuddy_core::slides::{
    CreatedGeneration, ExportFormat, ExportSnapshot, ExportTicket, GenerationRequest,
    GenerationSnapshot, GenerationStatus, SlidesApi, SlidesError,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Chat model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum ChatReply {
    Text(String),
    /// Fail as if the backend answered with this HTTP status.
    Status(u16),
    MissingKey,
}

/// A [`ChatModel`] that replays [`ChatReply`] values in order and records
/// every request. Calls past the end of the script fail.
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<ChatReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(replies: impl IntoIterator<Item = ChatReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([ChatReply::Text(text.into())])
    }

    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        lock(&self.requests).push(request.clone());
        match lock(&self.replies).pop_front() {
            Some(ChatReply::Text(text)) => Ok(text),
            Some(ChatReply::Status(status)) => {
                Err(ChatError::from_status(status, "scripted failure"))
            }
            Some(ChatReply::MissingKey) => Err(ChatError::MissingApiKey),
            None => Err(ChatError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Slides API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum CreateReply {
    Id(String),
    /// A 2xx reply without a generation id.
    Missing,
    Status(u16),
}

#[derive(Debug, Clone)]
pub enum StatusReply {
    Pending,
    /// A status string the client does not know, e.g. "processing".
    Unknown,
    Completed {
        gamma_url: Option<String>,
        pptx_url: Option<String>,
        pdf_url: Option<String>,
    },
    Failed,
    Status(u16),
}

impl StatusReply {
    pub fn completed(gamma_url: &str, pptx_url: Option<&str>) -> Self {
        Self::Completed {
            gamma_url: Some(gamma_url.to_string()),
            pptx_url: pptx_url.map(str::to_string),
            pdf_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExportReply {
    Direct(String),
    Job(String),
    Status(u16),
}

#[derive(Debug, Clone)]
pub enum ExportStatusReply {
    Pending,
    Completed(Option<String>),
    Failed,
    Status(u16),
}

fn upstream(status: u16) -> SlidesError {
    SlidesError::Upstream {
        status,
        body: "scripted failure".to_string(),
    }
}

/// A [`SlidesApi`] driven by per-endpoint scripts.
///
/// Status scripts repeat their last entry once exhausted, so a script of
/// `[Pending]` never completes.
pub struct ScriptedSlidesApi {
    create: CreateReply,
    statuses: Mutex<VecDeque<StatusReply>>,
    export: ExportReply,
    export_statuses: Mutex<VecDeque<ExportStatusReply>>,

    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    export_requests: AtomicUsize,
    export_status_calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedSlidesApi {
    /// Creation succeeds with `generation_id`; status stays pending.
    pub fn new(generation_id: &str) -> Self {
        Self {
            create: CreateReply::Id(generation_id.to_string()),
            statuses: Mutex::new(VecDeque::from([StatusReply::Pending])),
            export: ExportReply::Status(500),
            export_statuses: Mutex::new(VecDeque::from([ExportStatusReply::Pending])),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            export_requests: AtomicUsize::new(0),
            export_status_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_create(mut self, reply: CreateReply) -> Self {
        self.create = reply;
        self
    }

    pub fn with_statuses(self, replies: impl IntoIterator<Item = StatusReply>) -> Self {
        *lock(&self.statuses) = replies.into_iter().collect();
        self
    }

    pub fn with_export(mut self, reply: ExportReply) -> Self {
        self.export = reply;
        self
    }

    pub fn with_export_statuses(
        self,
        replies: impl IntoIterator<Item = ExportStatusReply>,
    ) -> Self {
        *lock(&self.export_statuses) = replies.into_iter().collect();
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn export_requests(&self) -> usize {
        self.export_requests.load(Ordering::SeqCst)
    }

    pub fn export_status_calls(&self) -> usize {
        self.export_status_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        lock(&self.last_request).clone()
    }
}

/// Pop the next entry, keeping the last one in place.
fn next_reply<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = lock(queue);
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl SlidesApi for ScriptedSlidesApi {
    async fn create_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<CreatedGeneration, SlidesError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_request) = Some(request.clone());
        match &self.create {
            CreateReply::Id(id) => Ok(CreatedGeneration {
                generation_id: Some(id.clone()),
            }),
            CreateReply::Missing => Ok(CreatedGeneration::default()),
            CreateReply::Status(status) => Err(upstream(*status)),
        }
    }

    async fn generation_status(
        &self,
        _generation_id: &str,
    ) -> Result<GenerationSnapshot, SlidesError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = |status| GenerationSnapshot {
            status,
            gamma_url: None,
            pptx_url: None,
            pdf_url: None,
        };
        match next_reply(&self.statuses).unwrap_or(StatusReply::Pending) {
            StatusReply::Pending => Ok(snapshot(GenerationStatus::Pending)),
            StatusReply::Unknown => Ok(snapshot(GenerationStatus::Unknown)),
            StatusReply::Failed => Ok(snapshot(GenerationStatus::Failed)),
            StatusReply::Completed {
                gamma_url,
                pptx_url,
                pdf_url,
            } => Ok(GenerationSnapshot {
                status: GenerationStatus::Completed,
                gamma_url,
                pptx_url,
                pdf_url,
            }),
            StatusReply::Status(status) => Err(upstream(status)),
        }
    }

    async fn request_export(
        &self,
        _generation_id: &str,
        _format: ExportFormat,
    ) -> Result<ExportTicket, SlidesError> {
        self.export_requests.fetch_add(1, Ordering::SeqCst);
        match &self.export {
            ExportReply::Direct(url) => Ok(ExportTicket::Ready(url.clone())),
            ExportReply::Job(id) => Ok(ExportTicket::Pending(id.clone())),
            ExportReply::Status(status) => Err(upstream(*status)),
        }
    }

    async fn export_status(
        &self,
        _generation_id: &str,
        _export_id: &str,
    ) -> Result<ExportSnapshot, SlidesError> {
        self.export_status_calls.fetch_add(1, Ordering::SeqCst);
        match next_reply(&self.export_statuses).unwrap_or(ExportStatusReply::Pending) {
            ExportStatusReply::Pending => Ok(ExportSnapshot {
                status: GenerationStatus::Pending,
                url: None,
            }),
            ExportStatusReply::Completed(url) => Ok(ExportSnapshot {
                status: GenerationStatus::Completed,
                url,
            }),
            ExportStatusReply::Failed => Ok(ExportSnapshot {
                status: GenerationStatus::Failed,
                url: None,
            }),
            ExportStatusReply::Status(status) => Err(upstream(status)),
        }
    }
}

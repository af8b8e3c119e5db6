use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use classbuddy_core::export::{self, DocumentKind, ExportError};
use classbuddy_core::lesson::{GenerateError, LessonGenerator, LessonRequest};
use classbuddy_core::slides::{SlideDeckLinks, SlideOrchestrator, SlidesError};
use classbuddy_core::{LessonPlan, SavedLesson};
use classbuddy_store::{HistoryLedger, MemoryStore, StoreError};

use crate::config::ClassBuddyConfig;
use crate::{generate_cmd, slides_cmd};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>, cause: &dyn Display) -> Self {
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %cause, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %cause, "request rejected");
        }
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        Self::new(StatusCode::NOT_FOUND, msg.clone(), &msg)
    }

    fn shutting_down() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Servidor encerrando. Tente novamente.",
            &"server shutting down",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = format!("Corpo da requisição inválido: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, message, &rejection)
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        let status = match &err {
            GenerateError::Validation { .. } => StatusCode::BAD_REQUEST,
            GenerateError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenerateError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GenerateError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            GenerateError::Upstream { .. }
            | GenerateError::Network(_)
            | GenerateError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.user_message(), &err)
    }
}

impl From<SlidesError> for AppError {
    fn from(err: SlidesError) -> Self {
        let status = match &err {
            SlidesError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SlidesError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            SlidesError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            SlidesError::Protocol(_)
            | SlidesError::GenerationFailed(_)
            | SlidesError::StatusUnavailable { .. }
            | SlidesError::Upstream { .. }
            | SlidesError::Network(_)
            | SlidesError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.user_message(), &err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.user_message(), &err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        let status = match &err {
            ExportError::UnknownFormat(_) => StatusCode::NOT_FOUND,
            ExportError::Archive(_) | ExportError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.user_message(), &err)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    generator: Arc<LessonGenerator>,
    slides: Arc<SlideOrchestrator>,
    history: Arc<Mutex<HistoryLedger>>,
    /// Cancelled on shutdown; in-flight slide jobs stop polling.
    cancel: CancellationToken,
}

impl AppState {
    pub fn new(
        generator: LessonGenerator,
        slides: SlideOrchestrator,
        history: HistoryLedger,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            slides: Arc::new(slides),
            history: Arc::new(Mutex::new(history)),
            cancel,
        }
    }

    pub fn from_config(
        config: &ClassBuddyConfig,
        history: HistoryLedger,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if config.chat.api_key.is_none() {
            warn!("no chat API key configured; lesson generation will fail");
        }
        if config.gamma.api_key.is_none() {
            warn!("no Gamma API key configured; slide generation will fail");
        }
        Ok(Self::new(
            generate_cmd::build_generator(config)?,
            slides_cmd::build_orchestrator(config)?,
            history,
            cancel,
        ))
    }
}

/// A history ledger that lives only as long as the process.
pub fn memory_history() -> HistoryLedger {
    HistoryLedger::open(Box::new(MemoryStore::new()))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-lesson", post(generate_lesson))
        .route("/api/generate-gamma-slides", post(generate_slides))
        .route(
            "/api/history",
            get(list_history).post(save_history).delete(clear_history),
        )
        .route(
            "/api/history/{id}",
            get(get_history).delete(delete_history),
        )
        .route("/api/export/{format}", post(export_plan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let shutdown = state.cancel.clone();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("classbuddy serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("classbuddy serve shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate_lesson(
    State(state): State<AppState>,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<LessonPlan>, AppError> {
    let Json(request) = payload?;
    tokio::select! {
        biased;
        _ = state.cancel.cancelled() => Err(AppError::shutting_down()),
        result = state.generator.generate(&request) => Ok(Json(result?)),
    }
}

async fn generate_slides(
    State(state): State<AppState>,
    payload: Result<Json<LessonPlan>, JsonRejection>,
) -> Result<Json<SlideDeckLinks>, AppError> {
    let Json(plan) = payload?;
    let links = state
        .slides
        .submit_and_await(&plan, &state.cancel.child_token())
        .await?;
    Ok(Json(links))
}

async fn list_history(State(state): State<AppState>) -> Json<Vec<SavedLesson>> {
    Json(state.history.lock().await.list().to_vec())
}

async fn save_history(
    State(state): State<AppState>,
    payload: Result<Json<LessonPlan>, JsonRejection>,
) -> Result<(StatusCode, Json<SavedLesson>), AppError> {
    let Json(plan) = payload?;
    let saved = state.history.lock().await.save(&plan)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SavedLesson>, AppError> {
    let history = state.history.lock().await;
    history
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Aula {id} não encontrada no histórico.")))
}

async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.history.lock().await.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_history(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.history.lock().await.clear()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_plan(
    Path(format): Path<String>,
    payload: Result<Json<LessonPlan>, JsonRejection>,
) -> Result<Response, AppError> {
    let kind: DocumentKind = format.parse()?;
    let Json(plan) = payload?;

    let now = Local::now().naive_local();
    let bytes = export::render(&plan, kind, now)?;
    let file_name = export::export_file_name(&plan, kind.extension(), now.date());

    Ok((
        [
            (header::CONTENT_TYPE, kind.content_type().to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        bytes,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback name and the RFC 5987
/// UTF-8 form.
fn content_disposition(file_name: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    let fallback: String = file_name
        .chars()
        .map(|c| if safe(c) { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if safe(byte as char) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use classbuddy_core::poll::RetryPolicy;
    use classbuddy_core::slides::OrchestratorConfig;
    use classbuddy_test_utils::{
        ChatReply, ScriptedChatModel, ScriptedSlidesApi, StatusReply, sample_plan,
    };

    use super::*;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn plan_reply() -> ChatReply {
        ChatReply::Text(format!(
            "```json\n{}\n```",
            serde_json::to_string(&sample_plan()).unwrap()
        ))
    }

    fn state_with(chat: Vec<ChatReply>, slides: ScriptedSlidesApi) -> AppState {
        let fast = RetryPolicy::fixed(3, Duration::from_millis(1));
        AppState::new(
            LessonGenerator::new(Arc::new(ScriptedChatModel::new(chat))),
            SlideOrchestrator::with_config(
                Arc::new(slides),
                OrchestratorConfig {
                    job_policy: fast,
                    export_policy: fast,
                },
            ),
            memory_history(),
            CancellationToken::new(),
        )
    }

    fn default_state() -> AppState {
        state_with(vec![plan_reply()], ScriptedSlidesApi::new("g-1"))
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), 16 * 1_048_576)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn lesson_request() -> Value {
        json!({"content": "Ciclo da água", "totalTime": 50, "subject": "Ciências"})
    }

    fn plan_json() -> Value {
        serde_json::to_value(sample_plan()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_is_ok() {
        let resp = send(&default_state(), "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn generate_lesson_returns_plan() {
        let resp = send(
            &default_state(),
            "POST",
            "/api/generate-lesson",
            Some(lesson_request()),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let plan: LessonPlan = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(plan, sample_plan());
    }

    #[tokio::test]
    async fn generate_lesson_validation_is_400() {
        let body = json!({"content": "  ", "totalTime": 50, "subject": "Ciências"});
        let resp = send(&default_state(), "POST", "/api/generate-lesson", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(
            json["error"].as_str().unwrap().contains("conteúdo"),
            "unexpected error body: {json}"
        );
    }

    #[tokio::test]
    async fn generate_lesson_bad_body_is_400() {
        let resp = send(
            &default_state(),
            "POST",
            "/api/generate-lesson",
            Some(json!({"content": "x"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn generate_lesson_maps_backend_errors() {
        let cases = [
            (ChatReply::Status(429), StatusCode::TOO_MANY_REQUESTS),
            (ChatReply::Status(402), StatusCode::PAYMENT_REQUIRED),
            (ChatReply::Status(500), StatusCode::BAD_GATEWAY),
            (ChatReply::Text("not json".to_string()), StatusCode::BAD_GATEWAY),
            (ChatReply::MissingKey, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (reply, expected) in cases {
            let state = state_with(vec![reply], ScriptedSlidesApi::new("g-1"));
            let resp = send(&state, "POST", "/api/generate-lesson", Some(lesson_request())).await;
            assert_eq!(resp.status(), expected);
            assert!(body_json(resp).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn generate_slides_returns_links() {
        let api = ScriptedSlidesApi::new("g-1").with_statuses([StatusReply::completed(
            "https://gamma.app/d/g-1",
            Some("https://cdn/g-1.pptx"),
        )]);
        let state = state_with(vec![], api);
        let resp = send(&state, "POST", "/api/generate-gamma-slides", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_json(resp).await,
            json!({
                "gammaUrl": "https://gamma.app/d/g-1",
                "pptxUrl": "https://cdn/g-1.pptx",
                "pdfUrl": null
            })
        );
    }

    #[tokio::test]
    async fn generate_slides_error_statuses() {
        let timeout = state_with(vec![], ScriptedSlidesApi::new("g-1"));
        let resp = send(&timeout, "POST", "/api/generate-gamma-slides", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

        let failed = state_with(
            vec![],
            ScriptedSlidesApi::new("g-1").with_statuses([StatusReply::Failed]),
        );
        let resp = send(&failed, "POST", "/api/generate-gamma-slides", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn shutdown_cancels_slide_jobs() {
        let state = state_with(vec![], ScriptedSlidesApi::new("g-1"));
        state.cancel.cancel();
        let resp = send(&state, "POST", "/api/generate-gamma-slides", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn history_lifecycle() {
        let state = default_state();

        let resp = send(&state, "POST", "/api/history", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let saved: SavedLesson = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(saved.lesson_plan, sample_plan());

        let resp = send(&state, "GET", "/api/history", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let list = body_json(resp).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], saved.id.as_str());

        let uri = format!("/api/history/{}", saved.id);
        let resp = send(&state, "GET", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["lessonPlan"]["subject"], "Ciências");

        let resp = send(&state, "DELETE", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&state, "GET", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_json(resp).await["error"].is_string());

        // Unknown ids delete as a no-op.
        let resp = send(&state, "DELETE", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn clear_history_empties_list() {
        let state = default_state();
        for _ in 0..2 {
            send(&state, "POST", "/api/history", Some(plan_json())).await;
        }
        let resp = send(&state, "DELETE", "/api/history", None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&state, "GET", "/api/history", None).await;
        assert_eq!(body_json(resp).await, json!([]));
    }

    #[tokio::test]
    async fn export_pdf_is_an_attachment() {
        let resp = send(&default_state(), "POST", "/api/export/pdf", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/pdf");
        let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"plano_Ci_ncias_"));
        assert!(disposition.contains("filename*=UTF-8''plano_Ci%C3%AAncias_"));
        assert!(disposition.ends_with(".pdf"));
        assert!(body_bytes(resp).await.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn export_text_and_deck() {
        let state = default_state();

        let resp = send(&state, "POST", "/api/export/txt", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(text.contains("PLANO DE AULA"));

        let resp = send(&state, "POST", "/api/export/pptx", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_bytes(resp).await.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn export_unknown_format_is_404() {
        let resp = send(&default_state(), "POST", "/api/export/docx", Some(plan_json())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("docx"));
    }

    #[test]
    fn content_disposition_encodes_non_ascii() {
        assert_eq!(
            content_disposition("plano_Física_2026-10-14.pdf"),
            "attachment; filename=\"plano_F_sica_2026-10-14.pdf\"; \
             filename*=UTF-8''plano_F%C3%ADsica_2026-10-14.pdf"
        );
    }
}

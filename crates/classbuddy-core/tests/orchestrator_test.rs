//! Slide orchestration against the scripted slides API.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use classbuddy_core::poll::RetryPolicy;
use classbuddy_core::slides::{OrchestratorConfig, SlideOrchestrator, SlidesError};
use classbuddy_test_utils::{
    CreateReply, ExportReply, ExportStatusReply, ScriptedSlidesApi, StatusReply,
    plan_with_sections, sample_plan,
};

const TICK: Duration = Duration::from_millis(1);

fn quick_config(job_attempts: u32, export_attempts: u32) -> OrchestratorConfig {
    OrchestratorConfig {
        job_policy: RetryPolicy::fixed(job_attempts, TICK),
        export_policy: RetryPolicy::fixed(export_attempts, TICK),
    }
}

fn orchestrator(api: &Arc<ScriptedSlidesApi>, config: OrchestratorConfig) -> SlideOrchestrator {
    SlideOrchestrator::with_config(api.clone(), config)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submission_carries_outline_and_card_count() {
    let api = Arc::new(
        ScriptedSlidesApi::new("g1").with_statuses([StatusReply::completed(
            "https://gamma.app/d/g1",
            Some("https://cdn/g1.pptx"),
        )]),
    );
    orchestrator(&api, quick_config(5, 5))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();

    let request = api.last_request().unwrap();
    assert!(request.input_text.starts_with("# Ciências\n\n## Objetivo\n"));
    assert!(request.input_text.contains("## 2. Evaporação e condensação (25 min)"));
    assert_eq!(request.num_cards, 5);
    assert_eq!(request.text_mode, "generate");
    assert_eq!(request.format, "presentation");
    assert_eq!(request.export_as, "pptx");
}

#[tokio::test]
async fn missing_generation_id_is_a_protocol_error() {
    let api = Arc::new(ScriptedSlidesApi::new("unused").with_create(CreateReply::Missing));
    let err = orchestrator(&api, quick_config(5, 5))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Protocol(_)));
    assert_eq!(api.status_calls(), 0);
}

#[tokio::test]
async fn rejected_submission_is_not_retried() {
    let api = Arc::new(ScriptedSlidesApi::new("unused").with_create(CreateReply::Status(401)));
    let err = orchestrator(&api, quick_config(5, 5))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Upstream { status: 401, .. }));
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.status_calls(), 0);
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completes_after_pending_statuses() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([
        StatusReply::Pending,
        StatusReply::Pending,
        StatusReply::Pending,
        StatusReply::completed("https://gamma.app/d/g1", Some("https://cdn/g1.pptx")),
    ]));
    let links = orchestrator(&api, quick_config(30, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(api.status_calls(), 4);
    assert_eq!(api.export_requests(), 0);
    assert_eq!(links.gamma_url.as_deref(), Some("https://gamma.app/d/g1"));
    assert_eq!(links.pptx_url.as_deref(), Some("https://cdn/g1.pptx"));
    assert!(links.pdf_url.is_none());
}

#[tokio::test]
async fn failed_status_stops_polling_immediately() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([StatusReply::Failed]));
    let err = orchestrator(&api, quick_config(30, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::GenerationFailed(_)));
    assert_eq!(api.status_calls(), 1);
}

#[tokio::test]
async fn never_completing_job_times_out_after_max_attempts() {
    let api = Arc::new(ScriptedSlidesApi::new("g1"));
    let err = orchestrator(&api, quick_config(12, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Timeout { attempts: 12 }));
    assert_eq!(api.status_calls(), 12);
}

#[tokio::test]
async fn unknown_status_counts_as_pending() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([
        StatusReply::Unknown,
        StatusReply::Unknown,
        StatusReply::completed("https://gamma.app/d/g1", Some("https://cdn/g1.pptx")),
    ]));
    orchestrator(&api, quick_config(30, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(api.status_calls(), 3);
}

#[tokio::test]
async fn transient_status_errors_are_skipped() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([
        StatusReply::Status(503),
        StatusReply::Pending,
        StatusReply::Status(500),
        StatusReply::completed("https://gamma.app/d/g1", Some("https://cdn/g1.pptx")),
    ]));
    let mut config = quick_config(30, 15);
    config.job_policy = config.job_policy.with_error_budget(2);
    orchestrator(&api, config)
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(api.status_calls(), 4);
}

#[tokio::test]
async fn consecutive_status_errors_exhaust_the_budget() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([StatusReply::Status(503)]));
    let mut config = quick_config(30, 15);
    config.job_policy = config.job_policy.with_error_budget(4);
    let err = orchestrator(&api, config)
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::StatusUnavailable { errors: 4, .. }));
    assert_eq!(api.status_calls(), 4);
}

#[tokio::test]
async fn without_budget_errors_only_consume_attempts() {
    let api = Arc::new(ScriptedSlidesApi::new("g1").with_statuses([StatusReply::Status(503)]));
    let err = orchestrator(&api, quick_config(6, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Timeout { attempts: 6 }));
    assert_eq!(api.status_calls(), 6);
}

// ---------------------------------------------------------------------------
// Secondary export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_pptx_link_triggers_one_export() {
    let api = Arc::new(
        ScriptedSlidesApi::new("g1")
            .with_statuses([StatusReply::completed("https://gamma.app/d/g1", None)])
            .with_export(ExportReply::Job("e1".to_string()))
            .with_export_statuses([
                ExportStatusReply::Pending,
                ExportStatusReply::Completed(Some("https://cdn/e1.pptx".to_string())),
            ]),
    );
    let links = orchestrator(&api, quick_config(30, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(api.export_requests(), 1);
    assert_eq!(api.export_status_calls(), 2);
    assert_eq!(links.pptx_url.as_deref(), Some("https://cdn/e1.pptx"));
}

#[tokio::test]
async fn direct_export_url_needs_no_polling() {
    let api = Arc::new(
        ScriptedSlidesApi::new("g1")
            .with_statuses([StatusReply::completed("https://gamma.app/d/g1", None)])
            .with_export(ExportReply::Direct("https://cdn/direct.pptx".to_string())),
    );
    let links = orchestrator(&api, quick_config(30, 15))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(api.export_status_calls(), 0);
    assert_eq!(links.pptx_url.as_deref(), Some("https://cdn/direct.pptx"));
}

#[tokio::test]
async fn export_timeout_still_returns_gamma_link() {
    let api = Arc::new(
        ScriptedSlidesApi::new("g1")
            .with_statuses([StatusReply::completed("https://gamma.app/d/g1", None)])
            .with_export(ExportReply::Job("e1".to_string())),
    );
    let links = orchestrator(&api, quick_config(30, 4))
        .submit_and_await(&sample_plan(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(api.export_requests(), 1);
    assert_eq!(api.export_status_calls(), 4);
    assert_eq!(links.gamma_url.as_deref(), Some("https://gamma.app/d/g1"));
    assert!(links.pptx_url.is_none());
}

#[tokio::test]
async fn export_failures_are_not_fatal() {
    for (export, statuses) in [
        (ExportReply::Status(500), vec![ExportStatusReply::Pending]),
        (ExportReply::Job("e1".to_string()), vec![ExportStatusReply::Failed]),
        (
            ExportReply::Job("e1".to_string()),
            vec![ExportStatusReply::Completed(None)],
        ),
    ] {
        let api = Arc::new(
            ScriptedSlidesApi::new("g1")
                .with_statuses([StatusReply::completed("https://gamma.app/d/g1", None)])
                .with_export(export)
                .with_export_statuses(statuses),
        );
        let links = orchestrator(&api, quick_config(30, 15))
            .submit_and_await(&sample_plan(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(api.export_requests(), 1);
        assert_eq!(links.gamma_url.as_deref(), Some("https://gamma.app/d/g1"));
        assert!(links.pptx_url.is_none());
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

fn cancel_after(delay: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        trigger.cancel();
    });
    cancel
}

#[tokio::test]
async fn cancellation_interrupts_status_polling() {
    let api = Arc::new(ScriptedSlidesApi::new("g1"));
    let config = OrchestratorConfig {
        job_policy: RetryPolicy::fixed(30, Duration::from_secs(3600)),
        export_policy: RetryPolicy::fixed(15, TICK),
    };
    let err = orchestrator(&api, config)
        .submit_and_await(&plan_with_sections(2), &cancel_after(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Cancelled));
    assert_eq!(api.status_calls(), 0);
}

#[tokio::test]
async fn cancellation_propagates_from_the_export_step() {
    let api = Arc::new(
        ScriptedSlidesApi::new("g1")
            .with_statuses([StatusReply::completed("https://gamma.app/d/g1", None)])
            .with_export(ExportReply::Job("e1".to_string())),
    );
    let config = OrchestratorConfig {
        job_policy: RetryPolicy::fixed(30, TICK),
        export_policy: RetryPolicy::fixed(15, Duration::from_secs(3600)),
    };
    let err = orchestrator(&api, config)
        .submit_and_await(&plan_with_sections(2), &cancel_after(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Cancelled));
    assert_eq!(api.status_calls(), 1);
    assert_eq!(api.export_requests(), 1);
}

#[tokio::test]
async fn already_cancelled_token_sends_nothing() {
    let api = Arc::new(ScriptedSlidesApi::new("g1"));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = orchestrator(&api, quick_config(5, 5))
        .submit_and_await(&sample_plan(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SlidesError::Cancelled));
    assert_eq!(api.create_calls(), 0);
}

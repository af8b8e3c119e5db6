//! Bounded polling with cancellation.
//!
//! [`poll_until`] sleeps, probes, and repeats until the probe reports a
//! terminal state, the attempt budget runs out, too many probes in a row
//! fail, or the cancellation token fires. The sleep precedes every probe.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How long and how often to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Sleep before every probe.
    pub delay: Duration,
    /// Consecutive probe errors tolerated before giving up. `None` means
    /// errors only ever consume attempts.
    pub max_consecutive_errors: Option<u32>,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            max_consecutive_errors: None,
        }
    }

    pub const fn with_error_budget(mut self, max_consecutive_errors: u32) -> Self {
        self.max_consecutive_errors = Some(max_consecutive_errors);
        self
    }

    /// Outer generation job: 30 probes, 2 s apart, 10 errors in a row.
    pub const fn generation_job() -> Self {
        Self::fixed(30, Duration::from_secs(2)).with_error_budget(10)
    }

    /// Secondary export: 15 probes, 2 s apart, 5 errors in a row.
    pub const fn export_job() -> Self {
        Self::fixed(15, Duration::from_secs(2)).with_error_budget(5)
    }
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// What one probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    /// Terminal failure reported by the remote side.
    Failed(String),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("remote job failed: {0}")]
    Failed(String),

    #[error("still pending after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("{errors} consecutive probe errors, last: {last}")]
    TooManyErrors { errors: u32, last: String },

    #[error("polling cancelled")]
    Cancelled,
}

/// Poll `probe` under `policy` until it yields a terminal result.
///
/// `probe` receives the 1-based attempt number. An `Err` from the probe is
/// logged and counts against the error budget; any successful probe resets
/// that count. `label` tags the log lines.
pub async fn poll_until<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
    E: Display,
{
    let mut consecutive_errors = 0u32;

    for attempt in 1..=policy.max_attempts {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(policy.delay) => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            outcome = probe(attempt) => outcome,
        };

        match outcome {
            Ok(Probe::Ready(value)) => {
                debug!(label, attempt, "poll finished");
                return Ok(value);
            }
            Ok(Probe::Failed(reason)) => {
                warn!(label, attempt, %reason, "remote job failed");
                return Err(PollError::Failed(reason));
            }
            Ok(Probe::Pending) => {
                consecutive_errors = 0;
                debug!(label, attempt, max_attempts = policy.max_attempts, "still pending");
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!(label, attempt, consecutive_errors, error = %e, "probe failed");
                if let Some(limit) = policy.max_consecutive_errors
                    && consecutive_errors >= limit
                {
                    return Err(PollError::TooManyErrors {
                        errors: consecutive_errors,
                        last: e.to_string(),
                    });
                }
            }
        }
    }

    warn!(label, attempts = policy.max_attempts, "poll budget exhausted");
    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

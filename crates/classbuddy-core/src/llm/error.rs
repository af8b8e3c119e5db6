use thiserror::Error;

/// Errors from a [`super::ChatModel`] call.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat backend API key is not configured")]
    MissingApiKey,

    #[error("rate limited by chat backend (HTTP 429)")]
    RateLimited,

    #[error("chat backend reports insufficient credits (HTTP 402)")]
    QuotaExceeded,

    #[error("chat backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ChatError {
    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::QuotaExceeded,
            _ => Self::Api {
                status,
                message: message.into(),
            },
        }
    }
}

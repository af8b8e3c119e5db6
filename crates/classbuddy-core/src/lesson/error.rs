use thiserror::Error;

use crate::llm::ChatError;

/// Errors from generating a lesson plan.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Missing or out-of-range user input. The user corrects and retries.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Missing backend credential.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("rate limited by the model backend")]
    RateLimited,

    #[error("model backend credits exhausted")]
    QuotaExceeded,

    /// Any other non-success status from the model backend.
    #[error("model backend failed with HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("model backend unreachable: {0}")]
    Network(String),

    /// The model replied, but not with a parseable lesson plan.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl GenerateError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Single user-facing message for this error (pt-BR).
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Configuration(_) => {
                "Chave da API de IA não configurada. Contate o administrador.".to_string()
            }
            Self::RateLimited => {
                "Limite de requisições excedido. Tente novamente mais tarde.".to_string()
            }
            Self::QuotaExceeded => {
                "Créditos insuficientes. Adicione créditos ao seu workspace.".to_string()
            }
            Self::Upstream { .. } | Self::Network(_) => "Erro ao gerar plano de aula.".to_string(),
            Self::MalformedResponse(_) => {
                "Erro ao processar resposta da IA. Tente novamente.".to_string()
            }
        }
    }
}

impl From<ChatError> for GenerateError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::MissingApiKey => {
                Self::Configuration("chat backend API key is not configured".to_string())
            }
            ChatError::RateLimited => Self::RateLimited,
            ChatError::QuotaExceeded => Self::QuotaExceeded,
            ChatError::Api { status, message } => Self::Upstream { status, message },
            ChatError::Network(e) => Self::Network(e.to_string()),
            ChatError::InvalidResponse(msg) => Self::MalformedResponse(msg),
        }
    }
}

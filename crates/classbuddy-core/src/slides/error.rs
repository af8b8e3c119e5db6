use thiserror::Error;

/// Errors from the slide-generation workflow.
#[derive(Debug, Error)]
pub enum SlidesError {
    /// API key missing. Raised before any request is sent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API answered without something it must always send
    /// (e.g. a generation id).
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("slide generation failed: {0}")]
    GenerationFailed(String),

    #[error("slide generation still pending after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("status endpoint failed {errors} times in a row: {last}")]
    StatusUnavailable { errors: u32, last: String },

    #[error("slide generation cancelled")]
    Cancelled,

    #[error("slides API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SlidesError {
    /// Single user-facing message for this error (pt-BR).
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "Chave da API Gamma não configurada.".to_string(),
            Self::Protocol(_) | Self::InvalidResponse(_) => {
                "Resposta inesperada da API Gamma.".to_string()
            }
            Self::GenerationFailed(_) => "Falha na geração dos slides no Gamma.".to_string(),
            Self::Timeout { .. } => {
                "Tempo limite excedido aguardando a geração dos slides.".to_string()
            }
            Self::StatusUnavailable { .. } => {
                "Não foi possível consultar o status da geração dos slides.".to_string()
            }
            Self::Cancelled => "Geração dos slides cancelada.".to_string(),
            Self::Upstream { .. } | Self::Network(_) => {
                "Erro ao gerar slides com Gamma.".to_string()
            }
        }
    }
}

//! Unified client error handling
//!
//! Every failure the inference engine boundary can produce, with a stable
//! code for logs and a human-readable message for the operator.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DiagnosisError {
    /// Transport or connectivity failure (timeout, refused connection, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// Case or question id no longer resolvable on the engine.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input, caught locally whenever possible.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Any other non-success answer from the engine.
    #[error("Engine error ({status}): {message}")]
    Engine { status: u16, message: String },

    /// The engine answered with a body we could not decode.
    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    /// The session owning the request was closed or replaced.
    #[error("Request cancelled")]
    Cancelled,
}

impl DiagnosisError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Engine { .. } => "ENGINE_ERROR",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Message shown to the operator next to the retry action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "No se pudo contactar al motor de diagnóstico. Verifique la conexión e intente nuevamente."
                    .to_string()
            }
            Self::NotFound(msg) => format!("No encontrado: {}", msg),
            Self::Validation(msg) => msg.clone(),
            Self::Engine { message, .. } => message.clone(),
            // Don't leak decoding details
            Self::InvalidResponse(_) => {
                "Error al cargar el diagnóstico. Por favor intente nuevamente.".to_string()
            }
            Self::Cancelled => "La operación fue cancelada.".to_string(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::InvalidResponse(_) => true,
            Self::Engine { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Validation(_) | Self::Cancelled => false,
        }
    }
}

impl From<reqwest::Error> for DiagnosisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

pub type DiagnosisResult<T> = Result<T, DiagnosisError>;

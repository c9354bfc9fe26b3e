use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

const VISION_EXHAUSTED: &str =
    "Image analysis is temporarily unavailable. Please try again later or send text only.";
const TEXT_EXHAUSTED: &str =
    "All AI models are currently unavailable. Please try again in a moment.";

/// Everything the HTTP layer can report. The `Display` text is exactly what
/// the caller sees in the `error` field.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid messages format")]
    InvalidRequest,

    #[error("Invalid chat format")]
    InvalidChat,

    #[error("Invalid API key. Please check your configuration.")]
    UpstreamAuth,

    #[error("Chat not found")]
    ChatNotFound,

    #[error("{}", exhausted_message(.vision))]
    AllModelsExhausted { vision: bool },

    #[error("Server error. Please try again.")]
    Internal(#[from] anyhow::Error),
}

fn exhausted_message(vision: &bool) -> &'static str {
    if *vision {
        VISION_EXHAUSTED
    } else {
        TEXT_EXHAUSTED
    }
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest | ProxyError::InvalidChat => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamAuth => StatusCode::UNAUTHORIZED,
            ProxyError::ChatNotFound => StatusCode::NOT_FOUND,
            ProxyError::AllModelsExhausted { .. } | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ProxyError::Internal(e) = self {
            error!("Server error: {:#}", e);
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

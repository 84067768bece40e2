use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chat::ChatError;
use crate::preview::{FetchFailure, PreviewError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote page could not be retrieved. `status` is the upstream HTTP
    /// status when one was received.
    #[error("Failed to fetch URL")]
    FetchFailed { status: Option<u16> },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal,
}

impl From<PreviewError> for AppError {
    fn from(e: PreviewError) -> Self {
        match e {
            PreviewError::InvalidUrl | PreviewError::BlockedHost => {
                AppError::Validation(e.public_message().into())
            }
            PreviewError::FetchFailed(FetchFailure::Status(status)) => AppError::FetchFailed {
                status: Some(status),
            },
            PreviewError::FetchFailed(_) => AppError::FetchFailed { status: None },
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::EmptyMessage => AppError::Validation("Message is required".into()),
            ChatError::MissingApiKey => {
                AppError::Configuration("OpenAI API key is not configured".into())
            }
            ChatError::Upstream(msg) => AppError::Upstream(msg),
            ChatError::Transport(e) => AppError::Upstream(e.to_string()),
        }
    }
}

/// Malformed or non-JSON request bodies keep the `{ error }` shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::FetchFailed { status } => {
                let code = status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (code, "Failed to fetch URL".into())
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Internal => {
                tracing::error!("Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

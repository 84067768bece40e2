pub mod chat;
pub mod link_preview;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::AppError;

pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "linkchat-server",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Flatten `validator` failures into a single client-facing message.
pub(crate) fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation(
        e.field_errors()
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

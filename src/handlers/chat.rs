use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{ChatRequest, ChatResponse},
    state::AppState,
};

use super::validation_error;

/// POST /api/chat
///
/// Relays one user message to the completion service and returns its reply.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(req) = payload?;
    req.validate().map_err(validation_error)?;
    let message = req.message.unwrap_or_default();

    info!(chars = message.chars().count(), "Relaying chat message");
    let response = state.chat.complete(&message).await?;

    Ok(Json(ChatResponse { response }))
}

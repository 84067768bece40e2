use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{LinkPreview, LinkPreviewRequest, TextPreviewEntry, TextPreviewsRequest},
    state::AppState,
};

use super::validation_error;

/// POST /api/og
///
/// Returns Open Graph style metadata for the given URL. Nothing is cached;
/// every call fetches the page once.
pub async fn get_link_preview(
    State(state): State<AppState>,
    payload: Result<Json<LinkPreviewRequest>, JsonRejection>,
) -> AppResult<Json<LinkPreview>> {
    let Json(req) = payload?;
    req.validate().map_err(validation_error)?;
    let url = req.url.unwrap_or_default();

    let preview = state.previews.extract(&url).await?;
    Ok(Json(preview))
}

/// POST /api/previews
///
/// Detects URLs in a block of text and previews each one independently.
/// Per-URL failures are reported inline and never fail the request.
pub async fn previews_for_text(
    State(state): State<AppState>,
    payload: Result<Json<TextPreviewsRequest>, JsonRejection>,
) -> AppResult<Json<Vec<TextPreviewEntry>>> {
    let Json(req) = payload?;
    req.validate().map_err(validation_error)?;
    let text = req.text.unwrap_or_default();

    let entries = state
        .previews
        .extract_from_text(&text)
        .await
        .into_iter()
        .map(|(detected, result)| {
            let (preview, error) = match result {
                Ok(preview) => (Some(preview), None),
                Err(e) => (None, Some(e.public_message().to_string())),
            };
            TextPreviewEntry {
                url: detected.url,
                start_index: detected.start_index,
                end_index: detected.end_index,
                preview,
                error,
            }
        })
        .collect();

    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_fails_validation() {
        let req: LinkPreviewRequest = serde_json::from_str("{}").unwrap();
        let err = validation_error(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "Validation error: URL is required");
    }

    #[test]
    fn empty_url_fails_validation() {
        let req: LinkPreviewRequest = serde_json::from_str(r#"{"url":""}"#).unwrap();
        let err = validation_error(req.validate().unwrap_err());
        assert_eq!(err.to_string(), "Validation error: URL is required");
    }

    #[test]
    fn empty_text_is_allowed() {
        let req: TextPreviewsRequest = serde_json::from_str(r#"{"text":""}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}

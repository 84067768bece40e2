use serde::{Deserialize, Serialize};
use validator::Validate;

/// Page metadata returned by `POST /api/og`.
///
/// Every field is either empty or a trimmed, non-empty value. `image`, when
/// present, is always an absolute URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub site_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LinkPreviewRequest {
    #[validate(
        required(message = "URL is required"),
        length(min = 1, message = "URL is required")
    )]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TextPreviewsRequest {
    #[validate(required(message = "Text is required"))]
    pub text: Option<String>,
}

/// One URL found in a block of text together with its preview outcome.
/// Exactly one of `preview` and `error` is set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPreviewEntry {
    pub url: String,
    pub start_index: usize,
    pub end_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<LinkPreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

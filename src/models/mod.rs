use serde::{Deserialize, Serialize};
use validator::Validate;

mod link_preview;

pub use link_preview::{LinkPreview, LinkPreviewRequest, TextPreviewEntry, TextPreviewsRequest};

// ============================================================================
// Chat Models
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(
        required(message = "Message is required"),
        length(min = 1, message = "Message is required")
    )]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

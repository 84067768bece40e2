use crate::chat::ChatClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::preview::PreviewExtractor;

/// Shared application state passed to all handlers.
/// Both clients are built once at startup and hold no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatClient,
    pub previews: PreviewExtractor,
}

impl AppState {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(AppState {
            chat: ChatClient::from_config(config)?,
            previews: PreviewExtractor::new(config.preview_settings())?,
        })
    }
}

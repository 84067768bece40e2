// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use linkchat_server::{
    chat::ChatClient,
    handlers,
    preview::{PreviewExtractor, PreviewSettings},
    state::AppState,
};

pub const TEST_API_KEY: &str = "sk-test-key";

/// Completion API root that nothing listens on. Tests that must not reach
/// the provider use it so an accidental call fails loudly.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9/v1";

/// Build state for tests. Private hosts are allowed so previews can target
/// the local `wiremock` server.
pub fn test_state(api_key: Option<&str>, chat_base_url: &str) -> AppState {
    AppState {
        chat: ChatClient::new(
            api_key.map(str::to_string),
            chat_base_url,
            "gpt-3.5-turbo",
            0.7,
            Duration::from_secs(5),
        )
        .unwrap(),
        previews: PreviewExtractor::new(PreviewSettings {
            timeout: Duration::from_secs(5),
            allow_private_hosts: true,
            ..PreviewSettings::default()
        })
        .unwrap(),
    }
}

/// Router whose preview extractor uses `settings`; chat has no key.
pub fn preview_app_with(settings: PreviewSettings) -> Router {
    let mut state = test_state(None, UNREACHABLE_BASE_URL);
    state.previews = PreviewExtractor::new(settings).unwrap();
    create_test_app(state)
}

/// Build the full application router around the given state.
pub fn create_test_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/chat", post(handlers::chat::send_message))
        .route("/api/og", post(handlers::link_preview::get_link_preview))
        .route(
            "/api/previews",
            post(handlers::link_preview::previews_for_text),
        )
        .with_state(state)
}

/// Router with preview fetching enabled for local hosts and no chat key.
pub fn preview_app() -> Router {
    create_test_app(test_state(None, UNREACHABLE_BASE_URL))
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    send(app, req).await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ── Page fixtures ────────────────────────────────────────────────────────────

pub fn og_page(title: &str, description: &str, image: &str) -> String {
    format!(
        r#"<!doctype html><html><head>
        <title>Fallback Title</title>
        <meta property="og:title" content="{title}">
        <meta property="og:description" content="{description}">
        <meta property="og:image" content="{image}">
        </head><body><p>content</p></body></html>"#
    )
}

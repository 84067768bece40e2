mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = common::get_json(common::preview_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "linkchat-server");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = common::get_json(common::preview_app(), "/api/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

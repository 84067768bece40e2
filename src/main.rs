use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkchat_server::config::Config;
use linkchat_server::handlers;
use linkchat_server::state::AppState;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // JSON logs in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linkchat_server=info,tower_http=info"));

    if config.is_dev {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    }

    info!("Linkchat server starting...");

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; /api/chat will answer with a configuration error");
    }
    if config.preview_allow_private_hosts {
        tracing::warn!("Link previews may fetch private and loopback addresses");
    } else if !config.preview_allowed_hosts.is_empty() {
        info!(hosts = ?config.preview_allowed_hosts, "Link preview guard exemptions");
    }

    let app_state = AppState::from_config(&config).expect("Failed to build HTTP clients");

    let cors = if config.is_dev {
        info!("CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        info!("CORS: restrictive (production mode)");
        CorsLayer::new()
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .route("/api/chat", post(handlers::chat::send_message))
        .route("/api/og", post(handlers::link_preview::get_link_preview))
        .route("/api/previews", post(handlers::link_preview::previews_for_text))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(cors)
        .with_state(app_state);

    let addr = config.server_addr();
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::http::header;
use axum::routing::{get, post};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::GatewayConfig;
use crate::connection::GatewayState;
use crate::{frontend, handlers};

/// Assemble the full router: JSON API, embedded UI, permissive CORS.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(frontend::index))
        .route("/assets/app.js", get(frontend::app_js))
        .route("/assets/style.css", get(frontend::style_css))
        .route("/api/health", get(handlers::health))
        .route("/api/connect", post(handlers::connect))
        .route("/api/run-query", post(handlers::run_query))
        .route("/api/disconnect", post(handlers::disconnect))
        .route("/api/format", post(handlers::format_query))
        .route("/api/lint", post(handlers::lint_query))
        .route("/api/export", post(handlers::export_csv))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: GatewayConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let read_only = config.read_only;
    let state = Arc::new(GatewayState::new(config));
    let app = build_router(state);

    info!("sqldeck listening on http://{}", addr);
    if read_only {
        info!("read-only mode is on: only read statements will be forwarded");
    }
    info!("  GET  /               - web UI");
    info!("  GET  /api/health     - connection status");
    info!("  POST /api/connect    - open a pooled connection to one database");
    info!("  POST /api/run-query  - execute SQL on the active connection");
    info!("  POST /api/disconnect - close the active connection");
    info!("  POST /api/format     - pretty-print a statement");
    info!("  POST /api/lint       - heuristic checks for a statement");
    info!("  POST /api/export     - run a statement and download CSV");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use sqldeck::config::GatewayConfig;
use sqldeck::connection::GatewayState;
use sqldeck::server::build_router;
use tower::util::ServiceExt;

fn test_router() -> Router {
    build_router(Arc::new(GatewayState::new(GatewayConfig::default())))
}

fn read_only_router() -> Router {
    let config = GatewayConfig {
        read_only: true,
        ..GatewayConfig::default()
    };
    build_router(Arc::new(GatewayState::new(config)))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_starts_disconnected() {
    let response = test_router()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["connected"], false);
    // No connection, so no database key in the payload.
    assert!(body.get("database").is_none());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn run_query_without_connection_is_rejected() {
    let response = test_router()
        .oneshot(post_json(
            "/api/run-query",
            serde_json::json!({ "query": "SELECT 1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "No database connection established. Please connect first."
    );
}

#[tokio::test]
async fn connect_rejects_blank_database_name() {
    for database in ["", "   "] {
        let response = test_router()
            .oneshot(post_json(
                "/api/connect",
                serde_json::json!({ "database": database }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid or empty database name");
    }
}

#[tokio::test]
async fn connect_rejects_missing_database_field() {
    let response = test_router()
        .oneshot(post_json("/api/connect", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or empty database name");
}

#[tokio::test]
async fn run_query_rejects_blank_query() {
    let response = test_router()
        .oneshot(post_json(
            "/api/run-query",
            serde_json::json!({ "query": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid or empty query");
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let router = test_router();

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(post_json("/api/disconnect", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "No active connection");
    }
}

#[tokio::test]
async fn read_only_mode_rejects_write_statements() {
    let statements = [
        "DELETE FROM users",
        "DROP TABLE users",
        "WITH x AS (SELECT 1) SELECT * FROM x",
    ];

    for statement in statements {
        let response = read_only_router()
            .oneshot(post_json(
                "/api/run-query",
                serde_json::json!({ "query": statement }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("Read-only mode"), "got: {error}");
    }
}

#[tokio::test]
async fn read_only_check_runs_before_connection_check() {
    // A read statement on a disconnected gateway fails on the missing
    // connection, not on the read-only guard.
    let response = read_only_router()
        .oneshot(post_json(
            "/api/run-query",
            serde_json::json!({ "query": "-- note\nSELECT 1" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "No database connection established. Please connect first."
    );

    // A write statement is rejected up front even without a connection.
    let response = read_only_router()
        .oneshot(post_json(
            "/api/run-query",
            serde_json::json!({ "query": "UPDATE t SET a = 1" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Read-only mode"), "got: {error}");
}

#[tokio::test]
async fn format_works_without_a_connection() {
    let response = test_router()
        .oneshot(post_json(
            "/api/format",
            serde_json::json!({ "query": "select id from users where id = 1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let formatted = body["formatted"].as_str().unwrap();
    assert!(formatted.contains("SELECT"));
    assert!(formatted.contains("FROM"));
}

#[tokio::test]
async fn lint_flags_select_star() {
    let response = test_router()
        .oneshot(post_json(
            "/api/lint",
            serde_json::json!({ "query": "SELECT * FROM users" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["severity"], "warning");
}

#[tokio::test]
async fn lint_passes_clean_query() {
    let response = test_router()
        .oneshot(post_json(
            "/api/lint",
            serde_json::json!({ "query": "SELECT id FROM users WHERE id = 1" }),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn export_without_connection_is_rejected() {
    let response = test_router()
        .oneshot(post_json(
            "/api/export",
            serde_json::json!({ "query": "SELECT 1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "No database connection established. Please connect first."
    );
}

#[tokio::test]
async fn ui_routes_serve_embedded_assets() {
    let cases = [
        ("/", "text/html"),
        ("/assets/app.js", "application/javascript"),
        ("/assets/style.css", "text/css"),
    ];

    for (uri, content_type) in cases {
        let response = test_router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
        let header = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(header.starts_with(content_type), "uri: {uri} got: {header}");
    }

    let response = test_router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("sqldeck"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = test_router()
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_body_is_a_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/run-query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = test_router().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

//! Route definitions

use super::handlers;
use super::mcp;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Tool routes
        .route("/tools", get(handlers::tools))
        .route("/tools/:name", post(handlers::call_tool))
        .route("/mcp", post(mcp::rpc))
        // API routes
        .route("/health", get(handlers::health))
        .route("/backends", get(handlers::backends))
        // Add middleware
        .layer(cors)
        // Add state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{Availability, BackendId, BackendRegistry, Reference};
    use crate::config::{BackendConfig, Settings};
    use crate::dispatch::Dispatcher;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(Reference::new()), BackendConfig::named("reference"));
        let availability = Availability::builder()
            .available(BackendId::Reference, &[crate::intents::IntentKind::InfoLookup])
            .build();
        let dispatcher = Dispatcher::new(Arc::new(registry), availability);
        create_router(AppState::new(Settings::default(), dispatcher))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backends_available"], json!(["reference"]));
    }

    #[tokio::test]
    async fn test_tools_listing() {
        let (status, body) = send(app(), "GET", "/tools", None).await;
        assert_eq!(status, StatusCode::OK);
        let tools = body.as_array().unwrap();
        assert_eq!(tools.len(), crate::intents::IntentKind::ALL.len());
        assert!(tools.iter().any(|t| t["name"] == "run_tap_query"));
    }

    #[tokio::test]
    async fn test_info_tool() {
        let (status, body) = send(app(), "POST", "/tools/get_alma_info", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "reference");
        assert_eq!(body["row_count"], body["rows"].as_array().unwrap().len());
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_400() {
        let (status, body) = send(
            app(),
            "POST",
            "/tools/search_by_position",
            Some(json!({"ra_degrees": 400.0, "dec_degrees": 0.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_parameters");
        assert_eq!(body["error"]["field"], "ra_degrees");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_400() {
        let (status, body) = send(app(), "POST", "/tools/search_google", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "name");
    }

    #[tokio::test]
    async fn test_all_backends_failed_is_502() {
        let (status, body) = send(
            app(),
            "POST",
            "/tools/search_by_frequency",
            Some(json!({"min_freq_ghz": 84.0, "max_freq_ghz": 116.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["kind"], "all_backends_failed");
        assert_eq!(body["error"]["skipped"][0]["backend"], "tap");
    }

    #[tokio::test]
    async fn test_backends_snapshot() {
        let (status, body) = send(app(), "GET", "/backends", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reference"]["available"], true);
        assert_eq!(body["tap"]["available"], false);
    }

    #[tokio::test]
    async fn test_mcp_session() {
        let (_, init) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})),
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], mcp::PROTOCOL_VERSION);

        let (status, _) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (_, list) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})),
        )
        .await;
        assert!(list["result"]["tools"][0]["inputSchema"].is_object());

        let (_, called) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "get_alma_info", "arguments": {}}
            })),
        )
        .await;
        assert_eq!(called["id"], 3);
        assert_eq!(called["result"]["isError"], false);
        assert_eq!(called["result"]["structuredContent"]["source"], "reference");
    }

    #[tokio::test]
    async fn test_mcp_errors() {
        let (_, invalid) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({
                "jsonrpc": "2.0",
                "id": "a",
                "method": "tools/call",
                "params": {"name": "search_by_target", "arguments": {}}
            })),
        )
        .await;
        assert_eq!(invalid["error"]["code"], -32602);
        assert_eq!(invalid["error"]["data"]["field"], "target_name");

        let (_, failed) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({
                "jsonrpc": "2.0",
                "id": "b",
                "method": "tools/call",
                "params": {"name": "resolve_target", "arguments": {"target_name": "M87"}}
            })),
        )
        .await;
        assert_eq!(failed["result"]["isError"], true);

        let (_, unknown) = send(
            app(),
            "POST",
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"})),
        )
        .await;
        assert_eq!(unknown["error"]["code"], -32601);
    }
}

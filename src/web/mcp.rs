//! JSON-RPC 2.0 tool protocol endpoint
//!
//! Implements the subset of the Model Context Protocol a calling agent needs:
//! `initialize`, `tools/list` and `tools/call`. Notifications (requests
//! without an id) are accepted and produce no response body.

use super::handlers::{call, ApiError};
use super::state::AppState;
use crate::dispatch::DispatchError;
use crate::intents::catalog;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// JSON-RPC handler
pub async fn rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let response = RpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {}", e), None);
            return Json(response).into_response();
        }
    };

    let Some(id) = request.id.clone() else {
        debug!("Notification {}", request.method);
        return StatusCode::ACCEPTED.into_response();
    };

    Json(handle(&state, id, request).await).into_response()
}

async fn handle(state: &AppState, id: Value, request: RpcRequest) -> RpcResponse {
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"", None);
    }

    match request.method.as_str() {
        "initialize" => RpcResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": state.instance_name(),
                    "version": crate::VERSION,
                },
            }),
        ),
        "ping" => RpcResponse::result(id, json!({})),
        "tools/list" => RpcResponse::result(id, json!({ "tools": list_tools() })),
        "tools/call" => {
            let params: CallParams = match serde_json::from_value(request.params) {
                Ok(params) => params,
                Err(e) => return RpcResponse::error(id, INVALID_PARAMS, format!("invalid params: {}", e), None),
            };
            call_tool(state, id, params).await
        }
        other => RpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", other), None),
    }
}

fn list_tools() -> Vec<Value> {
    catalog()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema(),
            })
        })
        .collect()
}

async fn call_tool(state: &AppState, id: Value, params: CallParams) -> RpcResponse {
    match call(state, &params.name, params.arguments).await {
        Ok(output) => match serde_json::to_value(&output) {
            Ok(value) => RpcResponse::result(id, tool_result(value, false)),
            Err(e) => RpcResponse::error(id, INTERNAL_ERROR, e.to_string(), None),
        },
        Err(ApiError(err @ DispatchError::InvalidParameters(_))) => {
            let data = serde_json::to_value(err.report()).ok();
            RpcResponse::error(id, INVALID_PARAMS, err.to_string(), data)
        }
        Err(ApiError(err)) => {
            let body = json!({ "error": err.report() });
            RpcResponse::result(id, tool_result(body, true))
        }
    }
}

/// Tool result carrying the JSON both as text content and structured content
fn tool_result(value: Value, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": value.to_string() }],
        "structuredContent": value,
        "isError": is_error,
    })
}

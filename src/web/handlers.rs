//! HTTP request handlers

use super::state::AppState;
use crate::dispatch::{DispatchError, DispatchOutput};
use crate::intents::{catalog, Intent, ParamError};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

/// Tool listing entry
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Error returned from a tool call
#[derive(Debug)]
pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self(err)
    }
}

impl From<ParamError> for ApiError {
    fn from(err: ParamError) -> Self {
        Self(DispatchError::InvalidParameters(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DispatchError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            DispatchError::AllBackendsFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.0.report() });
        (self.status(), Json(body)).into_response()
    }
}

/// Parse a request body into tool arguments; an empty body means no arguments
pub(crate) fn parse_arguments(body: &[u8]) -> Result<Value, ParamError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ParamError::new("arguments", format!("invalid JSON: {}", e)))
}

/// Run one tool call end to end
pub(crate) async fn call(state: &AppState, tool: &str, arguments: Value) -> Result<DispatchOutput, ApiError> {
    let intent = Intent::from_tool_call(tool, arguments)?;
    info!("Tool call {}", tool);
    Ok(state.dispatcher.handle(&intent).await?)
}

/// Tool call handler
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<DispatchOutput>, ApiError> {
    let arguments = parse_arguments(&body)?;
    let output = call(&state, &name, arguments).await?;
    Ok(Json(output))
}

/// Tool catalog handler
pub async fn tools() -> impl IntoResponse {
    let tools: Vec<ToolResponse> = catalog()
        .iter()
        .map(|tool| ToolResponse {
            name: tool.name,
            description: tool.description,
            input_schema: tool.input_schema(),
        })
        .collect();
    Json(tools)
}

/// Availability snapshot handler
pub async fn backends(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dispatcher.availability().clone())
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "instance": state.instance_name(),
        "version": crate::VERSION,
        "backends_available": state.dispatcher.availability().available(),
    }))
}

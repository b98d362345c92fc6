//! Stdio tool-invocation server
//!
//! Speaks JSON-RPC 2.0, one message per line, on stdin/stdout. Logging must
//! go to stderr since stdout carries the protocol.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::operations::DocumentOperations;
use crate::tools::{self, DispatchError, TOOLS};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request or notification
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code, reason = "always \"2.0\", kept for deserialization")]
    jsonrpc: Option<String>,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response
#[derive(Debug, Serialize, PartialEq)]
pub struct McpResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn result_value(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// Serve requests from stdin until it closes
pub async fn serve_stdio(ops: DocumentOperations) -> Result<()> {
    tracing::info!(mode = ?ops.edit_mode(), "docx-tools stdio server starting");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_message(&ops, &line).await else {
            continue;
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, stdio server shutting down");
    Ok(())
}

/// Handle one line of input; notifications produce no response
pub async fn handle_message(ops: &DocumentOperations, line: &str) -> Option<McpResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("invalid JSON on stdin: {e}");
            return Some(McpResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };

    let request: McpRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return Some(McpResponse::error(
                Value::Null,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ));
        }
    };

    tracing::debug!(method = %request.method, "received request");

    // Notifications carry no id and expect no reply
    let Some(id) = request.id else {
        if !request.method.starts_with("notifications/") {
            tracing::warn!(method = %request.method, "ignoring notification");
        }
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => McpResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "docx-tools",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        ),

        "ping" => McpResponse::result(id, json!({})),

        "tools/list" => McpResponse::result(id, json!({ "tools": list_tools() })),

        "tools/call" => call_tool(ops, id, request.params.unwrap_or(Value::Null)).await,

        other => {
            tracing::warn!("unknown method: {other}");
            McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
        }
    };

    Some(response)
}

fn list_tools() -> Vec<Value> {
    TOOLS
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.parameters,
            })
        })
        .collect()
}

async fn call_tool(ops: &DocumentOperations, id: Value, params: Value) -> McpResponse {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    tracing::info!(tool = %name, "calling tool");

    // Run on its own task so a panic inside an operation becomes an error reply
    let task_ops = ops.clone();
    let task_name = name.clone();
    let joined =
        tokio::spawn(async move { tools::call_tool(&task_ops, &task_name, arguments).await })
            .await;

    match joined {
        Ok(Ok((tool, result))) => McpResponse::result(
            id,
            json!({
                "content": [{ "type": "text", "text": tools::reply_text(tool, &result) }],
                "isError": !result.success,
            }),
        ),
        Ok(Err(err @ DispatchError::InvalidParameters { .. })) => McpResponse::result(
            id,
            json!({
                "content": [{ "type": "text", "text": err.to_string() }],
                "isError": true,
            }),
        ),
        Ok(Err(err @ DispatchError::UnknownTool(_))) => {
            McpResponse::error(id, INVALID_PARAMS, err.to_string())
        }
        Err(e) => {
            tracing::error!(tool = %name, "tool task failed: {e}");
            McpResponse::error(id, INTERNAL_ERROR, format!("tool execution failed: {e}"))
        }
    }
}

//! HTTP JSON surface
//!
//! `GET /tools/list` returns the tool descriptors and `POST /tools/call`
//! dispatches `{name, parameters}` to the matching operation.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::operations::DocumentOperations;
use crate::tools::{self, DispatchError, TOOLS, ToolDescriptor};

/// Body of `POST /tools/call`
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Build the router with all routes
pub fn router(ops: DocumentOperations) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/tools/list", get(list_tools))
        .route("/tools/call", post(call_tool))
        .with_state(ops)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind and serve until interrupted
pub async fn serve(ops: DocumentOperations, addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid listen address {addr}"))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(mode = ?ops.edit_mode(), "docx-tools HTTP server listening on http://{addr}");

    axum::serve(listener, router(ops))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}

async fn health_check() -> &'static str {
    "OK"
}

/// GET /tools/list
async fn list_tools() -> Json<&'static [ToolDescriptor]> {
    Json(TOOLS.as_slice())
}

/// POST /tools/call
async fn call_tool(
    State(ops): State<DocumentOperations>,
    body: Result<Json<ToolCallRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return failure(
                StatusCode::BAD_REQUEST,
                format!("invalid request body: {}", rejection.body_text()),
            );
        }
    };
    let name = request.name.clone();

    // Run on its own task so a panic inside an operation becomes a 500
    let joined = tokio::spawn(async move {
        tools::call_tool(&ops, &request.name, request.parameters).await
    })
    .await;

    match joined {
        Ok(Ok((_, result))) => Json(result).into_response(),
        Ok(Err(err @ DispatchError::UnknownTool(_))) => {
            tracing::warn!(tool = %name, "unsupported tool requested");
            failure(StatusCode::BAD_REQUEST, err.to_string())
        }
        Ok(Err(err @ DispatchError::InvalidParameters { .. })) => {
            failure(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(e) => {
            tracing::error!(tool = %name, "tool task failed: {e}");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("tool execution failed: {e}"),
            )
        }
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

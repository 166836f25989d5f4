//! HTTP route handlers for the API.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quorum_common::QuorumError;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: String,
}

/// Chat response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ErrorResponse {
    fn from_error(e: QuorumError) -> Self {
        let status = match &e {
            QuorumError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            error: e.to_string(),
            status,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Run one chat turn through the workflow.
pub async fn invoke_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ErrorResponse> {
    info!(
        thread_id = %request.thread_id,
        message_preview = %request.message.chars().take(50).collect::<String>(),
        "Received chat request"
    );

    let conversation = state
        .graph
        .invoke(&request.thread_id, &request.message)
        .await
        .map_err(|e| {
            error!(thread_id = %request.thread_id, error = %e, "Chat turn failed");
            ErrorResponse::from_error(e)
        })?;

    Ok(Json(ChatResponse {
        response: conversation.final_answer().to_string(),
        thread_id: request.thread_id,
    }))
}

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::agent::output_types::ReplyKind;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub kind: ReplyKind,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;

    let limit = state.config.system_config.max_message_bytes;
    if request.message.len() > limit {
        return Err(AppError::PayloadTooLarge {
            size: request.message.len(),
            limit,
        });
    }

    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("chat", request_id = %request_id);

    let reply = state
        .agent
        .handle_input(&request.message)
        .instrument(span)
        .await
        .map_err(|e| {
            error!(request_id = %request_id, "Agent pipeline failed: {}", e);
            AppError::from(e)
        })?;

    info!(request_id = %request_id, kind = ?reply.kind, "Chat reply ready");

    Ok(Json(ChatResponse {
        response: reply.text,
        kind: reply.kind,
        request_id,
        detail: reply.detail,
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.config.agent_config.llm_provider,
        "model": state.agent.model_id(),
        "chatbot_enabled": state.agent.chatbot_enabled(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

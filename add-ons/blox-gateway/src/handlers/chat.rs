//! `/api/chat`: CEO persona chat completion. History is not stored server side.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

pub const CONNECTIVITY_ERROR: &str =
    "I apologize, but I encountered connectivity issues. Please try again.";

/// Falsy JSON values count as "no message"; other non-strings are forwarded as their JSON text.
fn message_text(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub async fn chat_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Some(message) = body.ok().and_then(|Json(b)| message_text(&b)) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No message provided." })),
        );
    };

    let Some(api_key) = state.access.openai_api_key.as_deref() else {
        tracing::warn!(target: "blox::llm", "OPENAI_API_KEY not set; chat unavailable");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": CONNECTIVITY_ERROR })),
        );
    };

    match state.llm.chat(api_key, &message).await {
        Ok(reply) => (StatusCode::OK, Json(json!({ "reply": reply }))),
        Err(e) => {
            tracing::error!(target: "blox::llm", error = %e, "chat completion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": CONNECTIVITY_ERROR })),
            )
        }
    }
}

/// No server-side history.
pub async fn chat_history() -> Json<Value> {
    Json(json!({ "messages": [] }))
}

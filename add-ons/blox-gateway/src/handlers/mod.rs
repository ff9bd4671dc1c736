//! JSON API handlers.

pub mod chat;
pub mod crew;
pub mod dashboard;
pub mod tools;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blox_core::CrewRunResponse;

use crate::AppState;

pub const UNAUTHORIZED_MESSAGE: &str = "Login required. Set BYPASS_AUTH=true to use the UI shell.";
pub const VALIDATION_MESSAGE: &str = "Message is required and must be a non-empty string.";

/// Errors surfaced by the protected routes as `{success:false, error:{code, message}}`.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Validation,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", UNAUTHORIZED_MESSAGE),
            ApiError::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", VALIDATION_MESSAGE),
        };
        (status, Json(CrewRunResponse::failure(code, message))).into_response()
    }
}

pub fn require_bypass(state: &AppState) -> Result<(), ApiError> {
    if state.access.bypass_auth {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

pub async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "app": state.config.app_name }))
}

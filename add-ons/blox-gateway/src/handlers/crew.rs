//! `POST /api/crew/run`: route a message to a catalog agent and answer in UI-only mode.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use blox_core::{compose_reply, CrewRunRequest, CrewRunResponse};

use super::{require_bypass, ApiError};
use crate::AppState;

pub async fn crew_run(
    State(state): State<AppState>,
    payload: Result<Json<CrewRunRequest>, JsonRejection>,
) -> Result<Json<CrewRunResponse>, ApiError> {
    require_bypass(&state)?;

    let Json(req) = payload.map_err(|e| {
        tracing::debug!(target: "blox::gateway", error = %e, "crew-run body rejected");
        ApiError::Validation
    })?;
    let message = req.text().ok_or(ApiError::Validation)?;
    let profile = req.company_profile.as_ref();

    let outcome = state
        .router
        .resolve(message, req.agent.as_deref(), req.role, profile)
        .await;
    tracing::info!(
        target: "blox::gateway",
        agent = outcome.agent.map(|a| a.key).unwrap_or("ceo"),
        source = ?outcome.source,
        channel = ?req.channel,
        "crew run routed"
    );

    Ok(Json(compose_reply(message, &outcome, profile)))
}

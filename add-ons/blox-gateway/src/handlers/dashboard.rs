//! Mock dashboard endpoints. Every call returns freshly randomized values.

use axum::Json;
use blox_core::mock_data;
use serde_json::{json, Value};

pub async fn status() -> Json<Value> {
    let data = mock_data::dashboard_status(&mut rand::thread_rng());
    Json(json!({ "success": true, "data": data }))
}

pub async fn agents() -> Json<Value> {
    let data = mock_data::agent_roster(&mut rand::thread_rng());
    Json(json!({ "success": true, "data": data }))
}

pub async fn activity() -> Json<Value> {
    let data = mock_data::activity_feed(&mut rand::thread_rng());
    Json(json!({ "success": true, "data": data }))
}

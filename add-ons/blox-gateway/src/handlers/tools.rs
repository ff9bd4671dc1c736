//! `GET /api/tools/invocations?limit=N`: static fallback invocation list.

use axum::extract::{Query, State};
use axum::Json;
use blox_core::mock_data::{fallback_invocations, take_limit, DEFAULT_INVOCATION_LIMIT};
use serde::Deserialize;

use super::{require_bypass, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InvocationQuery {
    limit: Option<String>,
}

/// Number-coercion rules of the query string: missing or empty means the default, blank means 0,
/// fractions truncate, anything unparseable selects nothing.
pub fn parse_limit(raw: Option<&str>) -> i64 {
    let raw = match raw {
        None | Some("") => return DEFAULT_INVOCATION_LIMIT,
        Some(r) => r.trim(),
    };
    if raw.is_empty() {
        return 0;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => 0,
        // `as` saturates at the i64 bounds
        Ok(v) => v.trunc() as i64,
        Err(_) => 0,
    }
}

pub async fn list_invocations(
    State(state): State<AppState>,
    Query(q): Query<InvocationQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_bypass(&state)?;
    let limit = parse_limit(q.limit.as_deref());
    let invocations = take_limit(fallback_invocations(), limit);
    Ok(Json(serde_json::json!({
        "success": true,
        "invocations": invocations,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_coercion() {
        assert_eq!(parse_limit(None), 20);
        assert_eq!(parse_limit(Some("")), 20);
        assert_eq!(parse_limit(Some("  ")), 0);
        assert_eq!(parse_limit(Some("2")), 2);
        assert_eq!(parse_limit(Some("2.9")), 2);
        assert_eq!(parse_limit(Some("-1")), -1);
        assert_eq!(parse_limit(Some("abc")), 0);
    }
}

//! Route guard for the app shell: `/app*` and `/dashboard*` redirect to `/login` unless the
//! bypass flag is set.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::AppState;

pub const PROTECTED_PREFIXES: [&str; 2] = ["/app", "/dashboard"];

/// Redirect target for a blocked path, or `None` when the request may proceed.
pub fn login_redirect(path: &str, query: Option<&str>, bypass: bool) -> Option<String> {
    let protected = PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p));
    if !protected || bypass || path.starts_with("/login") {
        return None;
    }
    Some(match query {
        Some(q) if !q.is_empty() => format!("/login?{}", q),
        _ => "/login".to_string(),
    })
}

pub async fn access_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let uri = request.uri();
    match login_redirect(uri.path(), uri.query(), state.access.bypass_auth) {
        Some(target) => {
            tracing::debug!(target: "blox::gateway", path = %uri.path(), "app shell locked; redirecting to login");
            // 307 keeps the method
            Redirect::temporary(&target).into_response()
        }
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_rules() {
        assert_eq!(login_redirect("/app/chat", None, false).as_deref(), Some("/login"));
        assert_eq!(login_redirect("/dashboard", Some("tab=1"), false).as_deref(), Some("/login?tab=1"));
        assert!(login_redirect("/app/chat", None, true).is_none());
        assert!(login_redirect("/login", None, false).is_none());
        assert!(login_redirect("/api/dashboard/status", None, false).is_none());
        assert!(login_redirect("/", None, false).is_none());
    }
}

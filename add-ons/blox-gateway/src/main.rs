//! BLOX AI CEO gateway: mock dashboard API, crew-run routing, CEO chat, and the app shell.
//! Config-driven via CoreConfig (`config/gateway.toml` + `BLOX__*` env).

mod access_gate;
mod handlers;
mod pages;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use blox_core::{AccessSettings, AgentRouter, CoreConfig, LlmBridge};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CoreConfig>,
    /// Read once at startup.
    pub access: Arc<AccessSettings>,
    pub router: Arc<AgentRouter>,
    pub llm: LlmBridge,
}

impl AppState {
    fn new(config: CoreConfig, access: AccessSettings) -> Self {
        let llm = LlmBridge::new(&config);
        let router = AgentRouter::new(llm.clone(), access.openai_api_key.clone());
        Self {
            config: Arc::new(config),
            access: Arc::new(access),
            router: Arc::new(router),
            llm,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[blox-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[blox-gateway] invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let access = AccessSettings::from_env();
    if !access.bypass_auth {
        tracing::warn!(target: "blox::gateway", "BYPASS_AUTH is not \"true\": app shell and protected API routes are locked");
    }
    if access.openai_api_key.is_none() {
        tracing::info!(target: "blox::gateway", "OPENAI_API_KEY not set: /api/chat will fail and crew-run uses profile keys or keywords");
    }

    let addr = config.bind_addr();
    let app_name = config.app_name.clone();
    let app = build_app(AppState::new(config, access));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[blox-gateway] cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(target: "blox::gateway", "{} listening on {}", app_name, addr);

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(target: "blox::gateway", "Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "blox::gateway", "Shutdown requested (Ctrl+C)");
        }
    }
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &axum::http::HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            s.starts_with("http://localhost:") || s.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/dashboard/status", get(handlers::dashboard::status))
        .route("/api/dashboard/agents", get(handlers::dashboard::agents))
        .route("/api/dashboard/activity", get(handlers::dashboard::activity))
        .route("/api/crew/run", post(handlers::crew::crew_run))
        .route("/api/tools/invocations", get(handlers::tools::list_invocations))
        .route(
            "/api/chat",
            get(handlers::chat::chat_history).post(handlers::chat::chat_post),
        )
        .route("/", get(pages::root))
        .route("/login", get(pages::login))
        .route("/app", get(pages::dashboard))
        .route("/dashboard", get(pages::dashboard))
        .route("/app/chat", get(pages::chat))
        .route("/app/activity", get(pages::activity))
        .route("/app/integrations", get(pages::integrations))
        .route("/app/settings", get(pages::settings))
        .route("/app/ide", get(pages::ide))
        .route("/app/agent", get(pages::agent_directory))
        .route("/app/agents/:key", get(pages::agent_chat))
        .fallback(pages::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            access_gate::access_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Shell".to_string(),
            // nothing listens here; classifier and chat calls fail fast
            llm_api_base: "http://127.0.0.1:9".to_string(),
            ..CoreConfig::default()
        }
    }

    fn app(bypass_auth: bool) -> Router {
        build_app(AppState::new(
            test_config(),
            AccessSettings {
                bypass_auth,
                openai_api_key: None,
            },
        ))
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn crew_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/crew/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn crew_run_requires_bypass_flag() {
        let res = app(false)
            .oneshot(crew_request(serde_json::json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let json = json_body(res).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn crew_run_rejects_blank_message() {
        let res = app(true)
            .oneshot(crew_request(serde_json::json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json.get("reply").is_none());
    }

    #[tokio::test]
    async fn crew_run_routes_marketing_question() {
        let res = app(true)
            .oneshot(crew_request(serde_json::json!({
                "message": "Can you review our marketing campaign performance?",
                "channel": "web"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["success"], true);
        assert!(json["reply"]
            .as_str()
            .unwrap()
            .starts_with("BLOX (UI-only mode): Routed to M.A.R.K. (Marketing Agent)."));
        assert_eq!(json["toolsUsed"][0]["agentName"], "M.A.R.K. (Marketing Agent)");
        assert_eq!(json["toolsUsed"][0]["toolKey"], "ui");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn crew_run_tolerates_null_and_mistyped_context() {
        for body in [
            serde_json::json!({"message": "plan a campaign", "role": null}),
            serde_json::json!({"message": "plan a campaign", "companyProfile": {"companyName": null}}),
            serde_json::json!({"message": "plan a campaign", "agent": 7}),
        ] {
            let res = app(true).oneshot(crew_request(body.clone())).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", body);
            let json = json_body(res).await;
            assert_eq!(json["success"], true);
            assert_eq!(json["toolsUsed"][0]["agentName"], "M.A.R.K. (Marketing Agent)");
        }
    }

    #[tokio::test]
    async fn crew_run_honours_profile_tool_override() {
        let res = app(true)
            .oneshot(crew_request(serde_json::json!({
                "message": "status please",
                "agent": "fint",
                "companyProfile": {"companyName": "Acme", "agentTools": {"fint": ["stripe"]}}
            })))
            .await
            .unwrap();
        let json = json_body(res).await;
        assert_eq!(json["toolsUsed"][0]["summary"], "Allowed tools: stripe");
        assert!(json["reply"].as_str().unwrap().contains("Company: Acme | Industry: n/a"));
    }

    #[tokio::test]
    async fn invocations_limit_two_returns_first_two() {
        let req = Request::builder()
            .uri("/api/tools/invocations?limit=2")
            .body(Body::empty())
            .unwrap();
        let res = app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        let ids: Vec<&str> = json["invocations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["inv-1", "inv-2"]);
        assert_eq!(json["invocations"][0]["tenant_id"], "blox-ui");
    }

    #[tokio::test]
    async fn invocations_locked_without_bypass() {
        let req = Request::builder()
            .uri("/api/tools/invocations")
            .body(Body::empty())
            .unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dashboard_status_envelope() {
        let req = Request::builder()
            .uri("/api/dashboard/status")
            .body(Body::empty())
            .unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert_eq!(json["success"], true);
        let tools = json["data"]["kpis"]["toolsConnected"].as_u64().unwrap();
        assert_eq!(json["data"]["healthSignals"]["integrations"].as_u64(), Some(tools));
        assert_eq!(json["data"]["systemStatus"]["aiEngine"], "ready");
    }

    #[tokio::test]
    async fn activity_feed_has_four_items() {
        let req = Request::builder()
            .uri("/api/dashboard/activity")
            .body(Body::empty())
            .unwrap();
        let json = json_body(app(false).oneshot(req).await.unwrap()).await;
        assert_eq!(json["data"]["recentActivity"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn app_shell_redirects_to_login_when_locked() {
        let req = Request::builder().uri("/app/chat").body(Body::empty()).unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers()[header::LOCATION], "/login");

        let req = Request::builder().uri("/login").body(Body::empty()).unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ide_page_renders_empty_state() {
        let req = Request::builder().uri("/app/ide").body(Body::empty()).unwrap();
        let res = app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("No workspace connected"));
        assert!(html.contains("blox_company_profile"));
    }

    #[tokio::test]
    async fn chat_page_lists_workstreams() {
        let req = Request::builder().uri("/app/chat").body(Body::empty()).unwrap();
        let res = app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"id="ws-list""#));
        assert!(html.contains(r#"id="new-ws""#));
    }

    #[tokio::test]
    async fn unknown_agent_page_is_404() {
        let req = Request::builder().uri("/app/agents/zeus").body(Body::empty()).unwrap();
        let res = app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let req = Request::builder().uri("/app/agents/cyra").body(Body::empty()).unwrap();
        let res = app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_requires_message() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "No message provided.");
    }

    #[tokio::test]
    async fn chat_forwards_to_completion_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Focus on retention."}}]
            })))
            .mount(&server)
            .await;
        let config = CoreConfig {
            llm_api_base: server.uri(),
            ..CoreConfig::default()
        };
        let app = build_app(AppState::new(
            config,
            AccessSettings {
                bypass_auth: false,
                openai_api_key: Some("sk-test".to_string()),
            },
        ));
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message":"What should we prioritise?"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["reply"], "Focus on retention.");
    }

    #[tokio::test]
    async fn chat_upstream_failure_is_generic_500() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message":"hi"}"#))
            .unwrap();
        let res = app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(res).await["error"],
            handlers::chat::CONNECTIVITY_ERROR
        );
    }
}

//! OpenAI-compatible chat-completions bridge.
//!
//! Two calls only: the one-shot agent classification used by crew-run routing, and the
//! CEO persona chat behind `/api/chat`. No retries; the caller decides what a failure means.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CoreConfig;
use crate::error::{BloxError, Result};

pub const BLOX_CEO_PROMPT: &str = "You are B.L.O.X (Barlow Logic Operations Xecutive), the AI CEO of a technology company. Your role is to:

1. Provide executive-level strategic guidance and decision-making
2. Direct and coordinate AI agents and automated systems
3. Focus on business operations, workflow optimization, and strategic planning
4. Maintain a professional, authoritative, yet approachable tone
5. Think like a CEO - consider ROI, efficiency, scalability, and business impact
6. Help users make informed decisions about their AI workforce and operations

You have the authority to direct other AI agents (similar to D.A.S.H) and should provide clear, actionable guidance for business operations and system management.";

pub const EMPTY_REPLY_FALLBACK: &str =
    "I apologize, but I encountered an issue processing your request.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Thin client over `{api_base}/chat/completions`. Cheap to clone.
#[derive(Clone)]
pub struct LlmBridge {
    client: reqwest::Client,
    api_base: String,
    router_model: String,
    chat_model: String,
}

impl LlmBridge {
    pub fn new(config: &CoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: config.llm_api_base.trim_end_matches('/').to_string(),
            router_model: config.router_model.clone(),
            chat_model: config.chat_model.clone(),
        }
    }

    /// Point the bridge at another OpenAI-compatible root (used by tests against a mock server).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Ask the service for exactly one catalog key. Returns the raw answer, trimmed and
    /// lowercased; validating it against the catalog is the router's job.
    pub async fn classify(&self, api_key: &str, message: &str) -> Result<String> {
        let prompt = classification_prompt(message);
        let body = ChatRequest {
            model: &self.router_model,
            messages: vec![ChatMessage {
                role: "system",
                content: &prompt,
            }],
            temperature: 0.0,
            max_tokens: 10,
        };
        let raw = self.complete(api_key, &body).await?;
        Ok(raw.unwrap_or_default().trim().to_lowercase())
    }

    /// CEO persona completion for `/api/chat`.
    pub async fn chat(&self, api_key: &str, message: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: BLOX_CEO_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let reply = self.complete(api_key, &body).await?;
        Ok(reply
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string()))
    }

    async fn complete(&self, api_key: &str, body: &ChatRequest<'_>) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.api_base);
        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.trim()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(BloxError::Upstream { status, body });
        }

        let parsed: ChatResponse = res.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content))
    }
}

/// System prompt for the routing call.
pub fn classification_prompt(message: &str) -> String {
    [
        "You are routing a request to the best agent.".to_string(),
        "Pick ONLY ONE agent key from the list.".to_string(),
        "If uncertain, choose \"alex\" for operations.".to_string(),
        format!("Agents:\n{}", crate::catalog::render_options()),
        format!("User: {}", message.trim()),
        "Respond with only the agent key.".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bridge(server: &MockServer) -> LlmBridge {
        LlmBridge::new(&CoreConfig::default()).with_api_base(&server.uri())
    }

    #[test]
    fn prompt_lists_agents_and_trimmed_message() {
        let p = classification_prompt("  budget help  ");
        assert!(p.contains("Agents:\nmark: Marketing Agent\n"));
        assert!(p.contains("User: budget help\n"));
        assert!(p.ends_with("Respond with only the agent key."));
    }

    #[tokio::test]
    async fn classify_sends_deterministic_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0,
                "max_tokens": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "  FINT \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let key = bridge(&server).classify("sk-test", "hello").await.unwrap();
        assert_eq!(key, "fint");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = bridge(&server).chat("sk-test", "hi").await.unwrap_err();
        match err {
            BloxError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_fall_back_to_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let reply = bridge(&server).chat("sk-test", "hi").await.unwrap();
        assert_eq!(reply, EMPTY_REPLY_FALLBACK);
    }
}

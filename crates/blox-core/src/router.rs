//! Crew-run agent routing.
//!
//! Resolution order: explicit catalog key > one LLM classification call (CEO role with a key)
//! > keyword scan in catalog order > generic CEO persona. A failed or unroutable
//! classification is never an error for the caller; it just falls through.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{self, AgentProfile, CEO_LABEL};
use crate::llm::LlmBridge;
use crate::models::{lenient, CompanyProfile, Message, ToolUsed};

/// Max knowledge documents quoted in a reply.
pub const MAX_KNOWLEDGE_DOCS: usize = 3;
/// Max characters quoted per knowledge document.
pub const KNOWLEDGE_EXCERPT_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ceo,
    #[default]
    Agent,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Web,
    Email,
    Sms,
    #[serde(other)]
    Other,
}

/// `POST /api/crew/run` body. `message` stays untyped so a non-string can be reported as a
/// validation failure instead of a decode failure. The other fields are context: null or
/// mistyped values decode to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewRunRequest {
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub role: Role,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub company_profile: Option<CompanyProfile>,
}

impl CrewRunRequest {
    pub fn new(message: &str) -> Self {
        Self {
            message: serde_json::Value::String(message.to_string()),
            channel: Some(Channel::Web),
            ..Default::default()
        }
    }

    /// The message when it is a string with non-whitespace content.
    pub fn text(&self) -> Option<&str> {
        self.message.as_str().filter(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewRunResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<ToolUsed>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Shown when the crew-run endpoint cannot be reached at all.
pub const CONNECT_ERROR_TEXT: &str = "Sorry, I'm having trouble connecting right now. Please try again.";
const REQUEST_ERROR_TEXT: &str = "Sorry, I encountered an issue processing your request.";
const EMPTY_REPLY_TEXT: &str = "I processed your request.";

impl CrewRunResponse {
    /// Chat bubble for this response: the reply, or an inline error message.
    pub fn into_message(self) -> Message {
        if self.success {
            let reply = self
                .reply
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| EMPTY_REPLY_TEXT.to_string());
            Message::from_blox(&reply, self.tools_used)
        } else {
            let text = self
                .error
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| REQUEST_ERROR_TEXT.to_string());
            Message::error(&text)
        }
    }

    pub fn failure(code: &str, message: &str) -> Self {
        Self {
            success: false,
            reply: None,
            tools_used: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// How the handling agent was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Explicit,
    Classifier,
    Keyword,
    Unrouted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub agent: Option<&'static AgentProfile>,
    pub source: RouteSource,
}

impl RoutingOutcome {
    fn via(agent: &'static AgentProfile, source: RouteSource) -> Self {
        Self {
            agent: Some(agent),
            source,
        }
    }

    pub fn label(&self) -> String {
        self.agent
            .map(|a| a.label())
            .unwrap_or_else(|| CEO_LABEL.to_string())
    }
}

pub struct AgentRouter {
    llm: LlmBridge,
    /// Server-side key used when the profile carries none.
    fallback_key: Option<String>,
}

impl AgentRouter {
    pub fn new(llm: LlmBridge, fallback_key: Option<String>) -> Self {
        Self { llm, fallback_key }
    }

    /// Pick the agent for a validated message.
    pub async fn resolve(
        &self,
        message: &str,
        explicit: Option<&str>,
        role: Role,
        profile: Option<&CompanyProfile>,
    ) -> RoutingOutcome {
        if let Some(agent) = explicit.and_then(catalog::lookup) {
            debug!(target: "blox::router", agent = agent.key, "explicit agent");
            return RoutingOutcome::via(agent, RouteSource::Explicit);
        }

        if role == Role::Ceo {
            let key = profile
                .and_then(|p| p.classification_key())
                .or(self.fallback_key.as_deref());
            if let Some(key) = key {
                if let Some(agent) = self.classify(key, message).await {
                    return RoutingOutcome::via(agent, RouteSource::Classifier);
                }
            }
        }

        match catalog::match_keywords(message) {
            Some(agent) => RoutingOutcome::via(agent, RouteSource::Keyword),
            None => RoutingOutcome {
                agent: None,
                source: RouteSource::Unrouted,
            },
        }
    }

    async fn classify(&self, api_key: &str, message: &str) -> Option<&'static AgentProfile> {
        match self.llm.classify(api_key, message).await {
            Ok(answer) => match catalog::lookup(&answer) {
                Some(agent) => {
                    info!(target: "blox::router", agent = agent.key, "classifier routed request");
                    Some(agent)
                }
                None => {
                    info!(
                        target: "blox::router",
                        answer = %answer,
                        "classifier declined or answered outside the catalog; using keywords"
                    );
                    None
                }
            },
            Err(e) => {
                warn!(target: "blox::router", error = %e, "classifier unavailable; using keywords");
                None
            }
        }
    }
}

/// Canned UI-mode reply plus the placeholder tool entry.
pub fn compose_reply(
    message: &str,
    outcome: &RoutingOutcome,
    profile: Option<&CompanyProfile>,
) -> CrewRunResponse {
    let label = outcome.label();
    let reply = format!(
        "BLOX (UI-only mode): Routed to {}. {}\n\n{}\n\nUser message: \"{}\"",
        label,
        company_context(profile),
        knowledge_context(profile),
        message.trim()
    );

    let summary = match outcome.agent {
        Some(agent) => format!("Allowed tools: {}", allowed_tools(agent, profile).join(", ")),
        None => "CEO routed the request.".to_string(),
    };

    CrewRunResponse {
        success: true,
        reply: Some(reply),
        tools_used: Some(vec![ToolUsed {
            agent_name: label,
            tool_key: "ui".to_string(),
            summary,
            invocation_id: None,
        }]),
        error: None,
    }
}

/// Profile override when present (even if empty), else the catalog defaults.
pub fn allowed_tools(agent: &AgentProfile, profile: Option<&CompanyProfile>) -> Vec<String> {
    profile
        .and_then(|p| p.agent_tools.get(agent.key))
        .cloned()
        .unwrap_or_else(|| agent.default_tools.iter().map(|t| t.to_string()).collect())
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn company_context(profile: Option<&CompanyProfile>) -> String {
    match profile {
        Some(p) => format!(
            "Company: {} | Industry: {} | Services: {} | ICP: {}",
            or_default(&p.company_name, "Unknown"),
            or_default(&p.industry, "n/a"),
            or_default(&p.services, "n/a"),
            or_default(&p.ideal_customer, "n/a"),
        ),
        None => "Company: not configured".to_string(),
    }
}

fn knowledge_context(profile: Option<&CompanyProfile>) -> String {
    let docs = profile.map(|p| p.knowledge_docs.as_slice()).unwrap_or(&[]);
    if docs.is_empty() {
        return "No company documents provided.".to_string();
    }
    docs.iter()
        .take(MAX_KNOWLEDGE_DOCS)
        .map(|doc| {
            let excerpt: String = doc.content.chars().take(KNOWLEDGE_EXCERPT_CHARS).collect();
            format!("Doc: {} ({}) - {}", doc.title, doc.source, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::models::KnowledgeDoc;

    fn offline_router() -> AgentRouter {
        // Nothing listens on port 9; any classifier attempt fails fast.
        AgentRouter::new(
            LlmBridge::new(&CoreConfig::default()).with_api_base("http://127.0.0.1:9"),
            None,
        )
    }

    #[test]
    fn request_text_rejects_blank_and_non_strings() {
        let mut req = CrewRunRequest::new("   ");
        assert!(req.text().is_none());
        req.message = serde_json::json!(42);
        assert!(req.text().is_none());
        req.message = serde_json::Value::Null;
        assert!(req.text().is_none());
        assert_eq!(CrewRunRequest::new(" hi ").text(), Some(" hi "));
    }

    #[test]
    fn responses_become_chat_messages() {
        let ok = CrewRunResponse {
            success: true,
            reply: Some(String::new()),
            tools_used: None,
            error: None,
        };
        let m = ok.into_message();
        assert_eq!(m.content, "I processed your request.");
        assert!(m.id.ends_with("-blox"));

        let denied = CrewRunResponse::failure("UNAUTHORIZED", "Login required.").into_message();
        assert_eq!(denied.content, "Login required.");
        assert!(denied.id.ends_with("-error"));
    }

    #[test]
    fn unknown_role_and_channel_still_decode() {
        let req: CrewRunRequest =
            serde_json::from_str(r#"{"message":"x","role":"board","channel":"fax"}"#).unwrap();
        assert_eq!(req.role, Role::Other);
        assert_eq!(req.channel, Some(Channel::Other));
        let req: CrewRunRequest = serde_json::from_str(r#"{"message":"x"}"#).unwrap();
        assert_eq!(req.role, Role::Agent);
    }

    #[test]
    fn null_and_mistyped_context_decode_to_defaults() {
        let req: CrewRunRequest = serde_json::from_str(
            r#"{"message":"plan a campaign","role":null,"agent":7,"channel":[],
                "companyProfile":{"companyName":null}}"#,
        )
        .unwrap();
        assert_eq!(req.text(), Some("plan a campaign"));
        assert_eq!(req.role, Role::Agent);
        assert_eq!(req.agent, None);
        assert_eq!(req.channel, None);
        assert_eq!(req.company_profile.map(|p| p.company_name), Some(String::new()));

        let req: CrewRunRequest =
            serde_json::from_str(r#"{"message":"x","companyProfile":"acme"}"#).unwrap();
        assert!(req.company_profile.is_none());
    }

    #[tokio::test]
    async fn explicit_key_beats_keywords() {
        let out = offline_router()
            .resolve("marketing campaign", Some("tony"), Role::Agent, None)
            .await;
        assert_eq!(out.agent.map(|a| a.key), Some("tony"));
        assert_eq!(out.source, RouteSource::Explicit);
    }

    #[tokio::test]
    async fn invalid_explicit_key_is_ignored() {
        let out = offline_router()
            .resolve("Need a budget forecast", Some("nobody"), Role::Agent, None)
            .await;
        assert_eq!(out.agent.map(|a| a.key), Some("fint"));
        assert_eq!(out.source, RouteSource::Keyword);
    }

    #[tokio::test]
    async fn no_match_is_unrouted() {
        let out = offline_router()
            .resolve("good morning", None, Role::Ceo, None)
            .await;
        assert!(out.agent.is_none());
        assert_eq!(out.label(), "BLOX AI CEO");
    }

    #[tokio::test]
    async fn classifier_transport_failure_falls_through() {
        let mut profile = CompanyProfile::default();
        profile.openai_api_key = "sk-test".into();
        let out = offline_router()
            .resolve("deploy to the cloud", None, Role::Ceo, Some(&profile))
            .await;
        assert_eq!(out.agent.map(|a| a.key), Some("tony"));
        assert_eq!(out.source, RouteSource::Keyword);
    }

    #[test]
    fn reply_without_profile() {
        let outcome = RoutingOutcome {
            agent: catalog::lookup("mark"),
            source: RouteSource::Keyword,
        };
        let res = compose_reply("  Plan a campaign  ", &outcome, None);
        assert!(res.success);
        assert_eq!(
            res.reply.as_deref(),
            Some(
                "BLOX (UI-only mode): Routed to M.A.R.K. (Marketing Agent). Company: not configured\n\nNo company documents provided.\n\nUser message: \"Plan a campaign\""
            )
        );
        let tools = res.tools_used.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].agent_name, "M.A.R.K. (Marketing Agent)");
        assert_eq!(tools[0].tool_key, "ui");
        assert_eq!(tools[0].summary, "Allowed tools: campaigns, email, crm");
    }

    #[test]
    fn reply_with_profile_quotes_three_truncated_docs() {
        let mut profile = CompanyProfile::default();
        profile.company_name = "Acme".into();
        profile.services = "MDR".into();
        profile
            .agent_tools
            .insert("cyra".into(), vec!["wazuh".into(), "sentinelone".into()]);
        for i in 0..5 {
            profile.knowledge_docs.push(KnowledgeDoc {
                id: format!("d{i}"),
                title: format!("Doc {i}"),
                source: "upload".into(),
                url: String::new(),
                content: "x".repeat(500),
            });
        }
        let outcome = RoutingOutcome {
            agent: catalog::lookup("cyra"),
            source: RouteSource::Keyword,
        };
        let res = compose_reply("risk review", &outcome, Some(&profile));
        let reply = res.reply.unwrap();
        assert!(reply.contains("Company: Acme | Industry: n/a | Services: MDR | ICP: n/a"));
        assert_eq!(reply.matches("Doc: ").count(), 3);
        assert!(reply.contains(&format!("Doc: Doc 0 (upload) - {}\n", "x".repeat(400))));
        assert!(!reply.contains("Doc 3"));
        assert_eq!(
            res.tools_used.unwrap()[0].summary,
            "Allowed tools: wazuh, sentinelone"
        );
    }

    #[test]
    fn unrouted_reply_names_the_ceo() {
        let outcome = RoutingOutcome {
            agent: None,
            source: RouteSource::Unrouted,
        };
        let res = compose_reply("hi", &outcome, None);
        let tool = &res.tools_used.unwrap()[0];
        assert_eq!(tool.agent_name, "BLOX AI CEO");
        assert_eq!(tool.summary, "CEO routed the request.");
    }
}

//! View models shared by the gateway and the terminal shell.
//!
//! Wire shapes follow the JSON the dashboard pages already consume: camelCase for
//! everything except [`ToolInvocation`], which keeps its snake_case record layout.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Presence;

/// Dashboard roster row (`GET /api/dashboard/agents`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub key: String,
    pub name: String,
    pub subtitle: String,
    pub color: String,
    pub status: Presence,
    pub tools: Vec<String>,
    pub last_activity: String,
    pub tasks_completed: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Blox,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsed {
    pub agent_name: String,
    pub tool_key: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<ToolUsed>>,
}

impl Message {
    /// Message typed by the user; id is `{millis}-user`.
    pub fn from_user(content: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-user", now.timestamp_millis()),
            content: content.trim().to_string(),
            sender: Sender::User,
            timestamp: now,
            tools_used: None,
        }
    }

    /// Assistant reply; id is `{millis}-blox`.
    pub fn from_blox(content: &str, tools_used: Option<Vec<ToolUsed>>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-blox", now.timestamp_millis()),
            content: content.to_string(),
            sender: Sender::Blox,
            timestamp: now,
            tools_used,
        }
    }

    /// Inline error shown in place of a reply; id is `{millis}-error`.
    pub fn error(content: &str) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-error", now.timestamp_millis()),
            content: content.to_string(),
            sender: Sender::Blox,
            timestamp: now,
            tools_used: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workstream {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub tenant_id: String,
    pub agent_name: String,
    pub tool_key: String,
    pub payload: serde_json::Value,
    pub result: serde_json::Value,
    pub run_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ToolInvocation {
    /// Human sentence for the activity page.
    pub fn describe(&self) -> String {
        let field = |v: &serde_json::Value, k: &str| {
            v.get(k)
                .and_then(|x| x.as_str())
                .unwrap_or("undefined")
                .to_string()
        };
        let status = self
            .result
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("");
        match self.tool_key.as_str() {
            "email" if status == "sent" => format!(
                "Email sent to {}: \"{}\"",
                field(&self.payload, "to"),
                field(&self.payload, "subject")
            ),
            "email" => format!("Email to {} failed", field(&self.payload, "to")),
            "sms" if status == "sent" => format!("SMS sent to {}", field(&self.payload, "to")),
            "sms" => format!("SMS to {} failed", field(&self.payload, "to")),
            "task" => {
                let title = self
                    .payload
                    .get("title")
                    .and_then(|t| t.as_str())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| field(&self.payload, "description"));
                format!("Task created: \"{}\"", title)
            }
            other => format!("Used {} tool", other),
        }
    }
}

/// Relative age used on the activity page (`Just now`, `5 min ago`, `2 hours ago`, ...).
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();
    let plural = |n: i64| if n > 1 { "s" } else { "" };
    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{} min ago", mins)
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else if days < 7 {
        format!("{} day{} ago", days, plural(days))
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeDoc {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub content: String,
}

fn default_tone() -> String {
    "Executive, concise, confident".to_string()
}

fn default_true() -> bool {
    true
}

pub const DEFAULT_IDE_PROVIDER: &str = "Workspace IDE";

/// Decodes any JSON value; null or a value of the wrong type becomes `T::default()`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_tone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_else(default_tone))
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(true))
}

fn lenient_agent_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let mut keys = catalog_key_slots();
    if let serde_json::Value::Object(map) = value {
        for (agent, key) in map {
            if let serde_json::Value::String(key) = key {
                keys.insert(agent, key);
            }
        }
    }
    Ok(keys)
}

fn catalog_key_slots() -> BTreeMap<String, String> {
    crate::catalog::CATALOG
        .iter()
        .map(|a| (a.key.to_string(), String::new()))
        .collect()
}

/// Free-form company settings. Stored client side only; the crew-run endpoint
/// receives it as request context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub industry: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub services: String,
    #[serde(default, deserialize_with = "lenient")]
    pub ideal_customer: String,
    #[serde(default, deserialize_with = "lenient")]
    pub regions: String,
    #[serde(default, deserialize_with = "lenient")]
    pub compliance: String,
    #[serde(default = "default_tone", deserialize_with = "lenient_tone")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient")]
    pub glossary: String,
    #[serde(default, deserialize_with = "lenient")]
    pub goals: String,
    #[serde(default, deserialize_with = "lenient")]
    pub openai_api_key: String,
    /// When false, each agent uses its own entry in `agent_keys`.
    #[serde(default = "default_true", deserialize_with = "lenient_flag")]
    pub shared_agent_key: bool,
    #[serde(default = "catalog_key_slots", deserialize_with = "lenient_agent_keys")]
    pub agent_keys: BTreeMap<String, String>,
    /// Per-agent tool permissions. A present entry replaces the catalog defaults, even when empty.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "BTreeMap::is_empty")]
    pub agent_tools: BTreeMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Vec::is_empty")]
    pub knowledge_docs: Vec<KnowledgeDoc>,
    /// D.A.S.H workspace IDE endpoint embedded on the IDE page.
    #[serde(default, deserialize_with = "lenient")]
    pub dash_ide_url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub dash_ide_token: String,
    #[serde(default, deserialize_with = "lenient")]
    pub dash_ide_provider: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            industry: String::new(),
            description: String::new(),
            services: String::new(),
            ideal_customer: String::new(),
            regions: String::new(),
            compliance: String::new(),
            tone: default_tone(),
            glossary: String::new(),
            goals: String::new(),
            openai_api_key: String::new(),
            shared_agent_key: true,
            agent_keys: catalog_key_slots(),
            agent_tools: BTreeMap::new(),
            knowledge_docs: Vec::new(),
            dash_ide_url: String::new(),
            dash_ide_token: String::new(),
            dash_ide_provider: String::new(),
        }
    }
}

impl CompanyProfile {
    /// Names accepted by [`CompanyProfile::set_field`].
    pub const TEXT_FIELDS: [&'static str; 14] = [
        "companyName",
        "industry",
        "description",
        "services",
        "idealCustomer",
        "regions",
        "compliance",
        "tone",
        "glossary",
        "goals",
        "openaiApiKey",
        "dashIdeUrl",
        "dashIdeToken",
        "dashIdeProvider",
    ];

    /// Sets one field by its wire name. Besides [`Self::TEXT_FIELDS`] this accepts
    /// `sharedAgentKey` (`true`/`false`) and `agentKeys.<agent>` for a catalog agent.
    pub fn set_field(&mut self, name: &str, value: &str) -> crate::Result<()> {
        if name == "sharedAgentKey" {
            self.shared_agent_key = match value.trim() {
                "true" | "on" | "yes" => true,
                "false" | "off" | "no" => false,
                _ => return Err(crate::BloxError::InvalidField(format!("{}={}", name, value))),
            };
            return Ok(());
        }
        if let Some(agent) = name.strip_prefix("agentKeys.") {
            let agent = crate::catalog::lookup(agent)
                .ok_or_else(|| crate::BloxError::UnknownAgent(agent.to_string()))?;
            self.agent_keys.insert(agent.key.to_string(), value.to_string());
            return Ok(());
        }
        let slot = match name {
            "companyName" => &mut self.company_name,
            "industry" => &mut self.industry,
            "description" => &mut self.description,
            "services" => &mut self.services,
            "idealCustomer" => &mut self.ideal_customer,
            "regions" => &mut self.regions,
            "compliance" => &mut self.compliance,
            "tone" => &mut self.tone,
            "glossary" => &mut self.glossary,
            "goals" => &mut self.goals,
            "openaiApiKey" => &mut self.openai_api_key,
            "dashIdeUrl" => &mut self.dash_ide_url,
            "dashIdeToken" => &mut self.dash_ide_token,
            "dashIdeProvider" => &mut self.dash_ide_provider,
            other => return Err(crate::BloxError::InvalidField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }

    /// IDE iframe source: the trimmed endpoint, with `token` appended (URL-encoded) when set.
    pub fn ide_embed_url(&self) -> Option<String> {
        let url = self.dash_ide_url.trim();
        if url.is_empty() {
            return None;
        }
        if self.dash_ide_token.is_empty() {
            return Some(url.to_string());
        }
        let delimiter = if url.contains('?') { '&' } else { '?' };
        Some(format!(
            "{}{}token={}",
            url,
            delimiter,
            urlencoding::encode(&self.dash_ide_token)
        ))
    }

    pub fn ide_provider(&self) -> &str {
        match self.dash_ide_provider.trim() {
            "" => DEFAULT_IDE_PROVIDER,
            p => p,
        }
    }

    /// API key for the classification call, if one was entered.
    pub fn classification_key(&self) -> Option<&str> {
        Some(self.openai_api_key.trim()).filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sparse_profile_fills_defaults() {
        let p: CompanyProfile =
            serde_json::from_str(r#"{"companyName":"Acme","agentTools":{"mark":[]}}"#).unwrap();
        assert_eq!(p.company_name, "Acme");
        assert_eq!(p.tone, "Executive, concise, confident");
        assert!(p.shared_agent_key);
        assert_eq!(p.agent_tools.get("mark"), Some(&Vec::new()));
        assert!(p.classification_key().is_none());
    }

    #[test]
    fn set_field_rejects_unknown_names() {
        let mut p = CompanyProfile::default();
        p.set_field("industry", "MSSP").unwrap();
        assert_eq!(p.industry, "MSSP");
        assert!(p.set_field("website", "acme.io").is_err());
    }

    #[test]
    fn set_field_edits_agent_keys() {
        let mut p = CompanyProfile::default();
        p.set_field("sharedAgentKey", "false").unwrap();
        assert!(!p.shared_agent_key);
        p.set_field("agentKeys.cyra", "sk-cyra").unwrap();
        assert_eq!(p.agent_keys["cyra"], "sk-cyra");
        assert!(p.set_field("sharedAgentKey", "maybe").is_err());
        assert!(matches!(
            p.set_field("agentKeys.zed", "sk"),
            Err(crate::BloxError::UnknownAgent(_))
        ));
    }

    #[test]
    fn malformed_profile_fields_fall_back() {
        let p: CompanyProfile = serde_json::from_str(
            r#"{"companyName":null,"industry":7,"tone":null,"sharedAgentKey":"no",
                "agentKeys":{"mark":"sk-m","sage":null},"agentTools":"all","knowledgeDocs":{}}"#,
        )
        .unwrap();
        assert_eq!(p.company_name, "");
        assert_eq!(p.industry, "");
        assert_eq!(p.tone, "Executive, concise, confident");
        assert!(p.shared_agent_key);
        assert_eq!(p.agent_keys["mark"], "sk-m");
        assert_eq!(p.agent_keys["sage"], "");
        assert!(p.agent_tools.is_empty());
        assert!(p.knowledge_docs.is_empty());
    }

    #[test]
    fn ide_embed_url_appends_token() {
        let mut p = CompanyProfile::default();
        assert_eq!(p.ide_embed_url(), None);
        assert_eq!(p.ide_provider(), "Workspace IDE");

        p.dash_ide_url = "  https://ide.blox.dev/ws  ".into();
        assert_eq!(p.ide_embed_url().as_deref(), Some("https://ide.blox.dev/ws"));

        p.dash_ide_token = "a b&c".into();
        assert_eq!(
            p.ide_embed_url().as_deref(),
            Some("https://ide.blox.dev/ws?token=a%20b%26c")
        );

        p.dash_ide_url = "https://ide.blox.dev/ws?folder=/repo".into();
        p.dash_ide_provider = "Coder".into();
        assert_eq!(
            p.ide_embed_url().as_deref(),
            Some("https://ide.blox.dev/ws?folder=/repo&token=a%20b%26c")
        );
        assert_eq!(p.ide_provider(), "Coder");
    }

    #[test]
    fn describe_invocations() {
        let inv = ToolInvocation {
            id: "inv-1".into(),
            tenant_id: "blox-ui".into(),
            agent_name: "M.A.R.K.".into(),
            tool_key: "email".into(),
            payload: serde_json::json!({"to": "lead@company.com", "subject": "Q1 Outreach"}),
            result: serde_json::json!({"status": "sent"}),
            run_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(inv.describe(), "Email sent to lead@company.com: \"Q1 Outreach\"");

        let task = ToolInvocation {
            tool_key: "task".into(),
            payload: serde_json::json!({"title": "Security review"}),
            ..inv.clone()
        };
        assert_eq!(task.describe(), "Task created: \"Security review\"");

        let other = ToolInvocation { tool_key: "crm".into(), ..inv };
        assert_eq!(other.describe(), "Used crm tool");
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "Just now");
        assert_eq!(time_ago(now - Duration::minutes(15), now), "15 min ago");
        assert_eq!(time_ago(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(2), now), "2 days ago");
    }

    #[test]
    fn message_sender_serializes_lowercase() {
        let m = Message::from_user("  hi  ");
        assert_eq!(m.content, "hi");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["sender"], "user");
        assert!(v.get("toolsUsed").is_none());
    }
}

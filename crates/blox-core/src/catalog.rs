//! Fixed agent catalog.
//!
//! Declaration order matters: keyword routing walks [`CATALOG`] front to back and the
//! first agent with a matching keyword wins.
//!
//! | Key | Name | Role | Keywords |
//! |-----|------|------|----------|
//! | mark | M.A.R.K. | Marketing Agent | marketing, campaign, email, lead, pipeline, growth |
//! | cory | C.O.R.Y. | Creative Agent | creative, design, brand, visual, copy |
//! | alex | A.L.E.X. | Operations Agent | operations, process, workflow, logistics, ops |
//! | hali | H.A.L.I. | HR Agent | hr, hiring, onboarding, people, recruit |
//! | fint | F.I.N.T. | Finance Agent | finance, budget, forecast, pricing, revenue |
//! | cyra | C.Y.R.A. | Security Agent | security, incident, risk, vulnerability, compliance |
//! | tony | T.O.N.Y. | DevOps Agent | devops, deploy, infra, cloud, monitoring |
//! | sage | S.A.G.E. | Social Agent | social, community, content, engagement |

use serde::{Deserialize, Serialize};

/// Catalog entry. Static data only; per-request tool overrides come from the company profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub default_tools: &'static [&'static str],
    pub keywords: &'static [&'static str],
    /// Status shown on the agent chat page header.
    pub presence: Presence,
    /// Prompt hint for the agent chat input.
    pub placeholder: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
        }
    }
}

pub const CATALOG: [AgentProfile; 8] = [
    AgentProfile {
        key: "mark",
        name: "M.A.R.K.",
        role: "Marketing Agent",
        default_tools: &["campaigns", "email", "crm"],
        keywords: &["marketing", "campaign", "email", "lead", "pipeline", "growth"],
        presence: Presence::Online,
        placeholder: "Draft a campaign brief for Q2 demand gen...",
    },
    AgentProfile {
        key: "cory",
        name: "C.O.R.Y.",
        role: "Creative Agent",
        default_tools: &["design", "copy", "assets"],
        keywords: &["creative", "design", "brand", "visual", "copy"],
        presence: Presence::Offline,
        placeholder: "Create a landing page concept with 3 visuals...",
    },
    AgentProfile {
        key: "alex",
        name: "A.L.E.X.",
        role: "Operations Agent",
        default_tools: &["ops", "workflows", "status"],
        keywords: &["operations", "process", "workflow", "logistics", "ops"],
        presence: Presence::Online,
        placeholder: "Summarize today's operational blockers...",
    },
    AgentProfile {
        key: "hali",
        name: "H.A.L.I.",
        role: "HR Agent",
        default_tools: &["people", "hiring", "onboarding"],
        keywords: &["hr", "hiring", "onboarding", "people", "recruit"],
        presence: Presence::Online,
        placeholder: "Draft an onboarding checklist for new hires...",
    },
    AgentProfile {
        key: "fint",
        name: "F.I.N.T.",
        role: "Finance Agent",
        default_tools: &["finance", "budgets", "forecast"],
        keywords: &["finance", "budget", "forecast", "pricing", "revenue"],
        presence: Presence::Offline,
        placeholder: "Provide a cash flow snapshot for this month...",
    },
    AgentProfile {
        key: "cyra",
        name: "C.Y.R.A.",
        role: "Security Agent",
        default_tools: &["security", "incidents", "alerts"],
        keywords: &["security", "incident", "risk", "vulnerability", "compliance"],
        presence: Presence::Online,
        placeholder: "Assess current security risks in the pipeline...",
    },
    AgentProfile {
        key: "tony",
        name: "T.O.N.Y.",
        role: "DevOps Agent",
        default_tools: &["devops", "deploys", "infra"],
        keywords: &["devops", "deploy", "infra", "cloud", "monitoring"],
        presence: Presence::Online,
        placeholder: "Summarize deploy status across environments...",
    },
    AgentProfile {
        key: "sage",
        name: "S.A.G.E.",
        role: "Social Agent",
        default_tools: &["social", "content", "community"],
        keywords: &["social", "community", "content", "engagement"],
        presence: Presence::Offline,
        placeholder: "Outline next week's social content calendar...",
    },
];

/// Display label used when no catalog agent handles a request.
pub const CEO_LABEL: &str = "BLOX AI CEO";

/// Exact (case-sensitive) catalog lookup, as used for explicit agent keys.
pub fn lookup(key: &str) -> Option<&'static AgentProfile> {
    CATALOG.iter().find(|a| a.key == key)
}

/// First agent in declaration order whose keyword list hits the lowercased message.
pub fn match_keywords(message: &str) -> Option<&'static AgentProfile> {
    let text = message.to_lowercase();
    CATALOG
        .iter()
        .find(|agent| agent.keywords.iter().any(|k| text.contains(k)))
}

/// `key: role` lines for the classification prompt.
pub fn render_options() -> String {
    CATALOG
        .iter()
        .map(|a| format!("{}: {}", a.key, a.role))
        .collect::<Vec<_>>()
        .join("\n")
}

impl AgentProfile {
    /// `M.A.R.K. (Marketing Agent)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }
}

//! Third-party integration catalog shown on the integrations page.

use serde::{Deserialize, Serialize};

use crate::error::{BloxError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Connected,
    Disconnected,
    Attention,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Connected => "connected",
            LinkStatus::Disconnected => "disconnected",
            LinkStatus::Attention => "attention",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "connected" => Some(LinkStatus::Connected),
            "disconnected" => Some(LinkStatus::Disconnected),
            "attention" => Some(LinkStatus::Attention),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub key: String,
    pub name: String,
    pub emoji: String,
    pub desc: String,
    pub category: String,
    pub status: LinkStatus,
    pub account: Option<String>,
    pub last_sync: Option<String>,
    pub health: u8,
}

pub const CATEGORIES: [&str; 9] = [
    "all",
    "communication",
    "storage",
    "devops",
    "security",
    "finance",
    "marketing",
    "hr",
    "social",
];

/// Health at which a toggle knocks the score back down.
pub const FULL_HEALTH: u8 = 100;
pub const HEALTH_STEP: u8 = 5;
pub const HEALTH_DROP: u8 = 20;

type Seed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    LinkStatus,
    Option<&'static str>,
    Option<&'static str>,
    u8,
);

use LinkStatus::{Attention, Connected, Disconnected};

const SEEDS: [Seed; 19] = [
    ("gmail", "Gmail", "✉️", "Send and receive email via BLOX.", "communication", Connected, Some("blox@barlowholdings.io"), Some("2m ago"), 99),
    ("gcal", "Google Calendar", "📅", "Schedule and read events.", "communication", Connected, Some("BLOX Primary"), Some("5m ago"), 98),
    ("slack", "Slack", "💬", "Post updates and read channels.", "communication", Attention, Some("One Circle Workspace"), Some("1h ago"), 72),
    ("gdrive", "Google Drive", "📁", "Search and manage files.", "storage", Connected, Some("BLOX Shared"), Some("1m ago"), 99),
    ("notion", "Notion", "📚", "Read/write workspace docs.", "storage", Disconnected, None, None, 0),
    ("github", "GitHub", "🐙", "PRs, issues, releases.", "devops", Connected, Some("github.com/ebarlowjr2"), Some("8m ago"), 96),
    ("aws", "AWS", "☁️", "Deployments and logs.", "devops", Connected, Some("prod-us-east-1"), Some("12m ago"), 94),
    ("docker", "Docker", "🐳", "Images and registry.", "devops", Disconnected, None, None, 0),
    ("sentinelone", "SentinelOne", "🛡️", "Endpoint security ops.", "security", Connected, Some("One Circle MSSP"), Some("3m ago"), 97),
    ("wazuh", "Wazuh", "🧩", "SIEM & agent telemetry.", "security", Connected, Some("SOC-LAB"), Some("7m ago"), 93),
    ("cloudflare", "Cloudflare", "🌐", "DNS & WAF automation.", "security", Attention, Some("onecs.net"), Some("2h ago"), 68),
    ("stripe", "Stripe", "💳", "Payments & billing.", "finance", Connected, Some("BLOX SaaS"), Some("10m ago"), 98),
    ("quickbooks", "QuickBooks", "📒", "Invoices & ledger.", "finance", Disconnected, None, None, 0),
    ("paypal", "PayPal", "💰", "Payouts & balances.", "finance", Disconnected, None, None, 0),
    ("hubspot", "HubSpot", "📣", "CRM & sequences.", "marketing", Connected, Some("MARK-CRM"), Some("4m ago"), 95),
    ("twilio", "Twilio", "📲", "SMS & voice actions.", "marketing", Connected, Some("+1 (555) 555-0123"), Some("1m ago"), 99),
    ("meta", "Meta Business", "📱", "Ads & pages.", "social", Disconnected, None, None, 0),
    ("x", "X (Twitter)", "🐦", "Post & analytics.", "social", Disconnected, None, None, 0),
    ("bamboohr", "BambooHR", "🧑‍💼", "Directory & PTO.", "hr", Disconnected, None, None, 0),
];

/// Fresh copy of the initial catalog.
pub fn catalog() -> Vec<Integration> {
    SEEDS
        .iter()
        .map(
            |&(key, name, emoji, desc, category, status, account, last_sync, health)| Integration {
                key: key.to_string(),
                name: name.to_string(),
                emoji: emoji.to_string(),
                desc: desc.to_string(),
                category: category.to_string(),
                status,
                account: account.map(str::to_string),
                last_sync: last_sync.map(str::to_string),
                health,
            },
        )
        .collect()
}

/// Filter criteria. `None` (or category `all`) disables the corresponding filter.
#[derive(Debug, Clone, Default)]
pub struct IntegrationFilter {
    pub category: Option<String>,
    pub query: Option<String>,
    pub status: Option<LinkStatus>,
}

impl IntegrationFilter {
    pub fn matches(&self, item: &Integration) -> bool {
        let category_ok = match self.category.as_deref() {
            None | Some("all") => true,
            Some(c) => item.category == c,
        };
        let query_ok = match self.query.as_deref() {
            None => true,
            Some(q) => format!("{} {}", item.name, item.desc)
                .to_lowercase()
                .contains(&q.to_lowercase()),
        };
        let status_ok = self.status.map_or(true, |s| item.status == s);
        category_ok && query_ok && status_ok
    }

    pub fn apply<'a>(&self, items: &'a [Integration]) -> Vec<&'a Integration> {
        items.iter().filter(|i| self.matches(i)).collect()
    }

    /// Group counts for the entries this filter shows.
    pub fn summarize(&self, items: &[Integration]) -> IntegrationSummary {
        summarize(items.iter().filter(|i| self.matches(i)))
    }
}

/// Toggle on a connected card: health rises by 5, or drops by 20 once it reaches 100.
/// Status is never changed; only connected integrations expose the toggle.
pub fn toggle<'a>(items: &'a mut [Integration], key: &str) -> Result<&'a Integration> {
    let item = items
        .iter_mut()
        .find(|i| i.key == key)
        .ok_or_else(|| BloxError::UnknownIntegration(key.to_string()))?;
    if item.status != LinkStatus::Connected {
        return Err(BloxError::NotConnected(key.to_string()));
    }
    item.health = if item.health >= FULL_HEALTH {
        item.health.saturating_sub(HEALTH_DROP)
    } else {
        item.health.saturating_add(HEALTH_STEP)
    };
    Ok(item)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSummary {
    pub connected: usize,
    pub attention: usize,
    pub available: usize,
    /// Mean health of connected entries, 0 when none are connected.
    pub average_health: u8,
}

pub fn summarize<'a, I>(items: I) -> IntegrationSummary
where
    I: IntoIterator<Item = &'a Integration>,
{
    let mut connected = 0usize;
    let mut attention = 0usize;
    let mut available = 0usize;
    let mut health_sum = 0u32;
    for item in items {
        match item.status {
            LinkStatus::Connected => {
                connected += 1;
                health_sum += u32::from(item.health);
            }
            LinkStatus::Attention => attention += 1,
            LinkStatus::Disconnected => available += 1,
        }
    }
    let average_health = if connected == 0 {
        0
    } else {
        (health_sum / connected as u32) as u8
    };
    IntegrationSummary {
        connected,
        attention,
        available,
        average_health,
    }
}

//! Randomized dashboard payloads and the static tool-invocation fallback list.
//!
//! Nothing here is authoritative. Every call draws fresh values; no state survives between calls.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Presence;
use crate::models::{Agent, ToolInvocation};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub agents_online: u32,
    pub tools_connected: u32,
    pub system_health: u32,
    pub tasks_in_queue: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthSignals {
    pub incidents: u32,
    pub latency: String,
    pub integrations: u32,
    pub throughput: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub uptime: String,
    pub api_server: String,
    pub database: String,
    pub sms_service: String,
    pub ai_engine: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatus {
    pub kpis: Kpis,
    pub health_signals: HealthSignals,
    pub system_status: SystemStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRoster {
    pub agents: Vec<Agent>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityItem {
    pub id: u32,
    pub title: String,
    pub time: String,
    pub icon: String,
    pub status: String,
    pub agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeed {
    pub recent_activity: Vec<ActivityItem>,
    pub timestamp: String,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn dashboard_status<R: Rng>(rng: &mut R) -> DashboardStatus {
    let kpis = Kpis {
        agents_online: rng.gen_range(5..=7),
        tools_connected: rng.gen_range(27..=31),
        system_health: rng.gen_range(95..=99),
        tasks_in_queue: rng.gen_range(10..=19),
    };
    let health_signals = HealthSignals {
        incidents: rng.gen_range(0..=2),
        latency: format!("{}ms", rng.gen_range(80..=129)),
        integrations: kpis.tools_connected,
        throughput: format!("{:.1}k/min", rng.gen_range(2.0..4.0)),
    };
    let system_status = SystemStatus {
        uptime: format!("{:.2}", 99.9 + rng.gen_range(0.0..0.09)),
        api_server: "online".to_string(),
        database: "connected".to_string(),
        sms_service: "active".to_string(),
        ai_engine: "ready".to_string(),
    };
    DashboardStatus {
        kpis,
        health_signals,
        system_status,
        timestamp: now_iso(),
    }
}

struct RosterSeed {
    key: &'static str,
    name: &'static str,
    subtitle: &'static str,
    color: &'static str,
    tools: [&'static str; 5],
    /// Agent reports online when a uniform draw exceeds this.
    offline_threshold: f64,
    /// Last activity is 1..=window minutes ago.
    activity_window: u32,
    tasks_base: u32,
    tasks_spread: u32,
}

const ROSTER: [RosterSeed; 8] = [
    RosterSeed {
        key: "MARK",
        name: "M.A.R.K.",
        subtitle: "Marketing, Automation, Research & Knowledge",
        color: "bg-sky-500",
        tools: ["Gmail", "Google Drive", "Google Search", "Twilio SMS", "HubSpot"],
        offline_threshold: 0.3,
        activity_window: 30,
        tasks_base: 5,
        tasks_spread: 10,
    },
    RosterSeed {
        key: "CORY",
        name: "C.O.R.Y.",
        subtitle: "Creative Output & Rendering Yield",
        color: "bg-violet-500",
        tools: ["Canva", "Adobe", "YouTube", "Figma", "Unsplash"],
        offline_threshold: 0.4,
        activity_window: 60,
        tasks_base: 3,
        tasks_spread: 8,
    },
    RosterSeed {
        key: "ALEX",
        name: "A.L.E.X.",
        subtitle: "Administrative Logistics Executive",
        color: "bg-emerald-500",
        tools: ["Google Calendar", "Slack", "Notion", "DocuSign", "Zoom"],
        offline_threshold: 0.2,
        activity_window: 45,
        tasks_base: 8,
        tasks_spread: 12,
    },
    RosterSeed {
        key: "HALI",
        name: "H.A.L.I.",
        subtitle: "Human Assistance & Labor Intelligence",
        color: "bg-orange-500",
        tools: ["LinkedIn", "BambooHR", "Workday", "Indeed", "Glassdoor"],
        offline_threshold: 0.5,
        activity_window: 90,
        tasks_base: 2,
        tasks_spread: 6,
    },
    RosterSeed {
        key: "FINT",
        name: "F.I.N.T.",
        subtitle: "Financial Insights & Transactions",
        color: "bg-green-600",
        tools: ["QuickBooks", "Stripe", "PayPal", "Excel", "Mint"],
        offline_threshold: 0.3,
        activity_window: 120,
        tasks_base: 10,
        tasks_spread: 15,
    },
    RosterSeed {
        key: "CYRA",
        name: "C.Y.R.A.",
        subtitle: "Cybersecurity Response & Analysis",
        color: "bg-rose-500",
        tools: ["LastPass", "Norton", "Cloudflare", "VPN", "Firewall"],
        offline_threshold: 0.2,
        activity_window: 20,
        tasks_base: 4,
        tasks_spread: 8,
    },
    RosterSeed {
        key: "TONY",
        name: "T.O.N.Y.",
        subtitle: "Technical Operations & Network Yield",
        color: "bg-indigo-500",
        tools: ["GitHub", "AWS", "Docker", "Jenkins", "Monitoring"],
        offline_threshold: 0.1,
        activity_window: 15,
        tasks_base: 15,
        tasks_spread: 20,
    },
    RosterSeed {
        key: "SAGE",
        name: "S.A.G.E.",
        subtitle: "Social Automation & Growth Engine",
        color: "bg-pink-500",
        tools: ["Twitter", "Instagram", "Facebook", "TikTok", "Buffer"],
        offline_threshold: 0.6,
        activity_window: 180,
        tasks_base: 1,
        tasks_spread: 5,
    },
];

pub fn agent_roster<R: Rng>(rng: &mut R) -> AgentRoster {
    let agents = ROSTER
        .iter()
        .map(|seed| Agent {
            key: seed.key.to_string(),
            name: seed.name.to_string(),
            subtitle: seed.subtitle.to_string(),
            color: seed.color.to_string(),
            status: if rng.gen::<f64>() > seed.offline_threshold {
                Presence::Online
            } else {
                Presence::Offline
            },
            tools: seed.tools.iter().map(|t| t.to_string()).collect(),
            last_activity: format!("{}m ago", rng.gen_range(1..=seed.activity_window)),
            tasks_completed: seed.tasks_base + rng.gen_range(0..seed.tasks_spread),
        })
        .collect();
    AgentRoster {
        agents,
        timestamp: now_iso(),
    }
}

const ACTIVITIES: [(&str, &str, &str); 8] = [
    ("M.A.R.K.", "sent outreach emails", "Mail"),
    ("C.Y.R.A.", "closed security incident", "ShieldCheck"),
    ("A.L.E.X.", "scheduled team meeting", "Calendar"),
    ("T.O.N.Y.", "merged PR", "Github"),
    ("F.I.N.T.", "processed financial data", "DollarSign"),
    ("C.O.R.Y.", "generated creative assets", "Image"),
    ("H.A.L.I.", "updated HR records", "Users"),
    ("S.A.G.E.", "posted social media content", "Share"),
];

/// Minutes under an hour render as `Nm ago`, the rest as whole hours `Nh ago`.
pub fn format_age(minutes: u32) -> String {
    if minutes < 60 {
        format!("{}m ago", minutes)
    } else {
        format!("{}h ago", minutes / 60)
    }
}

fn age_minutes(time: &str) -> u32 {
    let digits: String = time.chars().take_while(|c| c.is_ascii_digit()).collect();
    let n = digits.parse::<u32>().unwrap_or(0);
    if time.contains('h') {
        n * 60
    } else {
        n
    }
}

pub fn activity_feed<R: Rng>(rng: &mut R) -> ActivityFeed {
    let mut recent_activity: Vec<ActivityItem> = (0..4u32)
        .map(|index| {
            let (agent, action, icon) = *ACTIVITIES.choose(rng).unwrap_or(&ACTIVITIES[0]);
            ActivityItem {
                id: index + 1,
                title: format!("{} {}", agent, action),
                time: format_age(rng.gen_range(1..=120)),
                icon: icon.to_string(),
                status: "success".to_string(),
                agent: agent.to_string(),
            }
        })
        .collect();
    // stable: equal ages keep generation order
    recent_activity.sort_by_key(|item| age_minutes(&item.time));
    ActivityFeed {
        recent_activity,
        timestamp: now_iso(),
    }
}

/// Default page size of the tool-invocations endpoint.
pub const DEFAULT_INVOCATION_LIMIT: i64 = 20;

/// The three static invocation records, timestamped relative to now.
pub fn fallback_invocations() -> Vec<ToolInvocation> {
    let now = Utc::now();
    let record = |n: u32, agent: &str, tool: &str, payload: serde_json::Value, mins: i64| {
        ToolInvocation {
            id: format!("inv-{}", n),
            tenant_id: "blox-ui".to_string(),
            agent_name: agent.to_string(),
            tool_key: tool.to_string(),
            payload,
            result: serde_json::json!({ "status": "sent" }),
            run_id: Some(format!("run-{}", n)),
            created_at: now - Duration::minutes(mins),
        }
    };
    vec![
        record(
            1,
            "M.A.R.K.",
            "email",
            serde_json::json!({ "to": "lead@company.com", "subject": "Q1 Outreach" }),
            2,
        ),
        record(
            2,
            "C.Y.R.A.",
            "task",
            serde_json::json!({ "title": "Security review" }),
            15,
        ),
        record(
            3,
            "A.L.E.X.",
            "sms",
            serde_json::json!({ "to": "+1 (555) 555-0123" }),
            45,
        ),
    ]
}

/// `Array.prototype.slice(0, limit)` semantics: negative limits drop from the end.
pub fn take_limit<T>(mut items: Vec<T>, limit: i64) -> Vec<T> {
    let len = items.len() as i64;
    let end = if limit < 0 { (len + limit).max(0) } else { limit.min(len) };
    items.truncate(end as usize);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn status_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let s = dashboard_status(&mut rng);
            assert!((5..=7).contains(&s.kpis.agents_online));
            assert!((27..=31).contains(&s.kpis.tools_connected));
            assert!((95..=99).contains(&s.kpis.system_health));
            assert!((10..=19).contains(&s.kpis.tasks_in_queue));
            assert!(s.health_signals.incidents <= 2);
            assert_eq!(s.health_signals.integrations, s.kpis.tools_connected);
            let latency: u32 = s.health_signals.latency.trim_end_matches("ms").parse().unwrap();
            assert!((80..=129).contains(&latency));
            let uptime: f64 = s.system_status.uptime.parse().unwrap();
            assert!((99.9..=99.99).contains(&uptime));
        }
    }

    #[test]
    fn roster_has_eight_agents_with_bounded_counts() {
        let mut rng = StdRng::seed_from_u64(11);
        let roster = agent_roster(&mut rng);
        assert_eq!(roster.agents.len(), 8);
        let tony = roster.agents.iter().find(|a| a.key == "TONY").unwrap();
        assert!((15..35).contains(&tony.tasks_completed));
        assert_eq!(tony.tools.len(), 5);
        let v = serde_json::to_value(&roster.agents[0]).unwrap();
        assert!(v.get("lastActivity").is_some());
        assert!(v.get("tasksCompleted").is_some());
    }

    #[test]
    fn activity_is_sorted_youngest_first() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let feed = activity_feed(&mut rng);
            assert_eq!(feed.recent_activity.len(), 4);
            let ages: Vec<u32> = feed.recent_activity.iter().map(|i| age_minutes(&i.time)).collect();
            assert!(ages.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn age_formatting() {
        assert_eq!(format_age(1), "1m ago");
        assert_eq!(format_age(59), "59m ago");
        assert_eq!(format_age(60), "1h ago");
        assert_eq!(format_age(119), "1h ago");
        assert_eq!(age_minutes("2h ago"), 120);
    }

    #[test]
    fn limit_slices_like_js() {
        let ids = |v: Vec<ToolInvocation>| v.into_iter().map(|i| i.id).collect::<Vec<_>>();
        assert_eq!(ids(take_limit(fallback_invocations(), 2)), vec!["inv-1", "inv-2"]);
        assert_eq!(ids(take_limit(fallback_invocations(), 20)).len(), 3);
        assert!(take_limit(fallback_invocations(), 0).is_empty());
        assert_eq!(ids(take_limit(fallback_invocations(), -1)), vec!["inv-1", "inv-2"]);
        assert!(take_limit(fallback_invocations(), -9).is_empty());
    }
}

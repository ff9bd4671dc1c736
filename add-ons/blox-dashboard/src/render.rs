//! Table rendering for the terminal pages.

use blox_core::integrations::{Integration, IntegrationSummary, LinkStatus};
use blox_core::mock_data::{ActivityFeed, AgentRoster, DashboardStatus};
use blox_core::{time_ago, CompanyProfile, FeedState, Presence, Sender, ToolInvocation, Workstream};
use chrono::Utc;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn table_with_header(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| {
                    Cell::new(c)
                        .set_alignment(CellAlignment::Center)
                        .add_attribute(Attribute::Bold)
                })
                .collect::<Vec<_>>(),
        );
    table
}

pub fn banner(app_name: &str, page: &str) {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!();
    println!("  {} v{}  |  {}  |  {}", app_name, VERSION, page, now);
    println!("  {}", "─".repeat(68));
    println!();
}

pub fn section(title: &str) {
    println!("  ┌─ {} ─", title.to_uppercase());
    println!();
}

pub fn status(status: &DashboardStatus) {
    section("System status");
    let k = &status.kpis;
    let mut table = table_with_header(&["Agents online", "Tools connected", "System health", "Tasks in queue"]);
    let health_color = if k.system_health >= 97 { Color::Green } else { Color::DarkYellow };
    table.add_row(vec![
        Cell::new(k.agents_online).set_alignment(CellAlignment::Center),
        Cell::new(k.tools_connected).set_alignment(CellAlignment::Center),
        Cell::new(format!("{}%", k.system_health))
            .set_alignment(CellAlignment::Center)
            .fg(health_color),
        Cell::new(k.tasks_in_queue).set_alignment(CellAlignment::Center),
    ]);
    println!("{table}");

    let h = &status.health_signals;
    let s = &status.system_status;
    println!(
        "  Incidents: {}  |  Latency: {}  |  Throughput: {}  |  Uptime: {}%",
        h.incidents, h.latency, h.throughput, s.uptime
    );
    println!(
        "  API: {}  |  Database: {}  |  SMS: {}  |  AI engine: {}",
        s.api_server, s.database, s.sms_service, s.ai_engine
    );
    println!();
}

pub fn roster(roster: &AgentRoster) {
    section("Agents");
    let mut table = table_with_header(&["Agent", "Focus", "Status", "Last activity", "Tasks", "Tools"]);
    for a in &roster.agents {
        let (text, color) = match a.status {
            Presence::Online => ("● online", Color::Green),
            Presence::Offline => ("○ offline", Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&a.name).add_attribute(Attribute::Bold),
            Cell::new(&a.subtitle),
            Cell::new(text).fg(color),
            Cell::new(&a.last_activity).set_alignment(CellAlignment::Right),
            Cell::new(a.tasks_completed).set_alignment(CellAlignment::Right),
            Cell::new(a.tools.join(", ")),
        ]);
    }
    println!("{table}");
    let online = roster
        .agents
        .iter()
        .filter(|a| a.status == Presence::Online)
        .count();
    println!("  Online: {}/{}", online, roster.agents.len());
    println!();
}

pub fn activity(feed: &ActivityFeed) {
    section("Recent activity");
    let mut table = table_with_header(&["", "Activity", "When"]);
    for item in &feed.recent_activity {
        table.add_row(vec![
            Cell::new("✓").fg(Color::Green),
            Cell::new(&item.title),
            Cell::new(&item.time).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!();
}

/// Renders one polled feed: data when present, plus its loading or error line.
pub fn feed<T>(title: &str, state: &FeedState<T>, draw: impl Fn(&T)) {
    match (&state.data, state.loading) {
        (Some(data), _) => draw(data),
        (None, true) => println!("  {}: loading...\n", title),
        (None, false) => {}
    }
    if let Some(err) = &state.error {
        println!("  ⚠ {}: {} (press Ctrl+C to quit, data refreshes automatically)\n", title, err);
    }
}

pub fn invocations(items: &[ToolInvocation]) {
    section("Tool invocations");
    let now = Utc::now();
    let mut table = table_with_header(&["Agent", "Action", "Status", "When", "Run"]);
    for inv in items {
        let status = inv
            .result
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");
        let color = if status == "sent" { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(&inv.agent_name),
            Cell::new(inv.describe()),
            Cell::new(status).fg(color),
            Cell::new(time_ago(inv.created_at, now)).set_alignment(CellAlignment::Right),
            Cell::new(inv.run_id.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
    if items.is_empty() {
        println!("  No tool invocations.");
    }
    println!();
}

pub fn integrations(items: &[&Integration], summary: &IntegrationSummary) {
    section("Integrations");
    let mut table = table_with_header(&["", "Integration", "Category", "Status", "Account", "Last sync", "Health"]);
    for i in items {
        let color = match i.status {
            LinkStatus::Connected => Color::Green,
            LinkStatus::Attention => Color::Yellow,
            LinkStatus::Disconnected => Color::DarkGrey,
        };
        table.add_row(vec![
            Cell::new(&i.emoji),
            Cell::new(format!("{} ({})", i.name, i.key)),
            Cell::new(&i.category),
            Cell::new(i.status.as_str()).fg(color),
            Cell::new(i.account.as_deref().unwrap_or("-")),
            Cell::new(i.last_sync.as_deref().unwrap_or("-")),
            Cell::new(format!("{}%", i.health)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!(
        "  Connected: {}  |  Needs attention: {}  |  Available: {}  |  Avg health: {}%",
        summary.connected, summary.attention, summary.available, summary.average_health
    );
    println!();
}

pub fn conversation(ws: &Workstream) {
    section(&format!("Workstream: {}", ws.title));
    for m in &ws.messages {
        let who = match m.sender {
            Sender::User => "You",
            Sender::Blox => "BLOX",
        };
        println!("  [{}] {}:", m.timestamp.format("%H:%M"), who);
        for line in m.content.lines() {
            println!("    {}", line);
        }
        if let Some(tools) = &m.tools_used {
            for t in tools {
                println!("    ↳ {} [{}] {}", t.agent_name, t.tool_key, t.summary);
            }
        }
        println!();
    }
}

pub fn workstreams(list: &[Workstream], active: Option<&str>) {
    section("Workstreams");
    let mut table = table_with_header(&["", "Id", "Title", "Messages", "Updated"]);
    let now = Utc::now();
    for ws in list {
        let marker = if Some(ws.id.as_str()) == active { "▶" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&ws.id),
            Cell::new(&ws.title),
            Cell::new(ws.messages.len()).set_alignment(CellAlignment::Right),
            Cell::new(time_ago(ws.updated_at, now)),
        ]);
    }
    println!("{table}");
    println!();
}

pub fn profile(profile: &CompanyProfile) {
    section("Company profile");
    let mut table = table_with_header(&["Field", "Value"]);
    let masked = mask_key(&profile.openai_api_key);
    let masked_token = mask_key(&profile.dash_ide_token);
    let rows: [(&str, &str); 14] = [
        ("companyName", &profile.company_name),
        ("industry", &profile.industry),
        ("description", &profile.description),
        ("services", &profile.services),
        ("idealCustomer", &profile.ideal_customer),
        ("regions", &profile.regions),
        ("compliance", &profile.compliance),
        ("tone", &profile.tone),
        ("glossary", &profile.glossary),
        ("goals", &profile.goals),
        ("openaiApiKey", &masked),
        ("dashIdeUrl", &profile.dash_ide_url),
        ("dashIdeToken", &masked_token),
        ("dashIdeProvider", &profile.dash_ide_provider),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(if value.is_empty() { "-" } else { value })]);
    }
    println!("{table}");
    println!(
        "  Shared agent key: {}  |  Knowledge docs: {}  |  Tool overrides: {}",
        profile.shared_agent_key,
        profile.knowledge_docs.len(),
        profile.agent_tools.len()
    );
    if !profile.shared_agent_key {
        for (agent, key) in &profile.agent_keys {
            let shown = if key.is_empty() { "-".to_string() } else { mask_key(key) };
            println!("    {}: {}", agent, shown);
        }
    }
    for doc in &profile.knowledge_docs {
        println!("    • {} ({}) {} chars", doc.title, doc.source, doc.content.chars().count());
    }
    println!();
}

pub fn ide(profile: &CompanyProfile) {
    section("D.A.S.H workspace");
    let Some(embed) = profile.ide_embed_url() else {
        println!("  No workspace connected");
        println!("  Configure your IDE endpoint with: blox settings set dashIdeUrl URL");
        println!();
        return;
    };
    let mut table = table_with_header(&["Provider", "Endpoint", "Embed URL"]);
    // the token stays off the terminal
    let masked_embed = match embed.rsplit_once("token=") {
        Some((head, _)) if !profile.dash_ide_token.is_empty() => format!("{}token=****", head),
        _ => embed,
    };
    table.add_row(vec![
        Cell::new(profile.ide_provider()),
        Cell::new(profile.dash_ide_url.trim()),
        Cell::new(masked_embed),
    ]);
    println!("{table}");
    println!("  Capabilities: Terminal + SSH, Git + GitHub");
    println!();
}

/// Keeps the last four characters visible.
pub fn mask_key(key: &str) -> String {
    let n = key.chars().count();
    if n == 0 {
        return String::new();
    }
    if n <= 4 {
        return "*".repeat(n);
    }
    let tail: String = key.chars().skip(n - 4).collect();
    format!("{}{}", "*".repeat(n - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_masked() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key("sk-12345678"), "*******5678");
    }
}

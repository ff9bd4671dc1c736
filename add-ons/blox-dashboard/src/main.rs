//! **BLOX terminal shell**: `blox dash` prints the CEO dashboard from the gateway's mock
//! endpoints; the other pages cover chat, activity, integrations and settings.
//!
//! Local state (company profile, workstreams, integration toggles) lives in a Sled blob store,
//! by default at `{storage_path}/blox_local`.
//!
//! ## Usage
//!
//! ```text
//! blox dash [--watch]                      dashboard (default); --watch keeps polling
//! blox agents                              agent roster
//! blox activity [--limit N]                recent tool invocations
//! blox integrations [CATEGORY] [--search Q] [--status S] [--toggle KEY]
//! blox chat [--new | --list | --select ID] [MESSAGE...]
//! blox agent KEY [MESSAGE...]
//! blox ide                                 D.A.S.H workspace IDE endpoint
//! blox settings [show]
//! blox settings set FIELD VALUE
//! blox settings add-doc TITLE SOURCE FILE
//! ```

mod render;

use std::time::Duration;

use blox_core::integrations::{self, IntegrationFilter, LinkStatus, CATEGORIES};
use blox_core::mock_data::{ActivityFeed, AgentRoster, DashboardStatus};
use blox_core::store::{load_json, save_json, INTEGRATIONS_KEY};
use blox_core::{
    catalog, fetch_envelope, BlobStore, BloxError, CoreConfig, CrewRunRequest, CrewRunResponse,
    FeedState, Message, PollingFeed, ProfileStore, Role, SledBlobStore, ToolInvocation,
    WorkstreamBook, CATALOG, CEO_LABEL, CONNECT_ERROR_TEXT,
};
use serde::Deserialize;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAIN_SURFACE: &str = "blox";
const STATUS_EVERY: Duration = Duration::from_secs(30);
const AGENTS_EVERY: Duration = Duration::from_secs(15);
const ACTIVITY_EVERY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Dash { watch: bool },
    Agents,
    Activity { limit: Option<String> },
    Integrations {
        category: Option<String>,
        search: Option<String>,
        status: Option<LinkStatus>,
        toggle: Option<String>,
    },
    Chat { action: ChatAction, message: Option<String> },
    Agent { key: String, message: Option<String> },
    Ide,
    Settings(SettingsAction),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatAction {
    Continue,
    New,
    List,
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SettingsAction {
    Show,
    Set { field: String, value: String },
    AddDoc { title: String, source: String, file: String },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let sub = args.first().map(|s| s.as_str()).unwrap_or("dash").to_string();

    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}. Use: blox --help", e);
            std::process::exit(1);
        }
    };

    let outcome = match command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Dash { watch } => run_dash(watch).await,
        Command::Agents => run_agents().await,
        Command::Activity { limit } => run_activity(limit).await,
        Command::Integrations {
            category,
            search,
            status,
            toggle,
        } => run_integrations(category, search, status, toggle),
        Command::Chat { action, message } => run_chat(action, message).await,
        Command::Agent { key, message } => run_agent(&key, message).await,
        Command::Ide => run_ide(),
        Command::Settings(action) => run_settings(action),
    };

    if let Err(e) = outcome {
        eprintln!("blox {}: {}", sub, e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("{} terminal shell v{}", CEO_LABEL, render::VERSION);
    println!();
    println!("Usage: blox [COMMAND]");
    println!();
    println!("Commands:");
    println!("  dash [--watch]                 Dashboard: KPIs, agents, recent activity (default)");
    println!("  agents                         Agent roster");
    println!("  activity [--limit N]           Recent tool invocations (default limit 20)");
    println!("  integrations [CATEGORY]        Integrations; --search Q, --status S, --toggle KEY");
    println!("  chat [MESSAGE...]              Talk to BLOX; --new, --list, --select ID");
    println!("  agent KEY [MESSAGE...]         Talk to one agent directly");
    println!("  ide                            D.A.S.H workspace IDE details and embed URL");
    println!("  settings [show]                Company profile");
    println!("  settings set FIELD VALUE       Update one profile field (also sharedAgentKey true|false,");
    println!("                                 agentKeys.AGENT KEY)");
    println!("  settings add-doc TITLE SOURCE FILE");
    println!("  help                           Print this help message");
    println!();
    println!("Agents: {}", CATALOG.iter().map(|a| a.key).collect::<Vec<_>>().join(", "));
    println!("Categories: {}", CATEGORIES.join(", "));
    println!();
    println!("The gateway is read from BLOX_GATEWAY_URL, else the configured host and port.");
    println!("Local state is kept at BLOX_LOCAL_STORE, else {{storage_path}}/blox_local.");
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(sub) = args.first() else {
        return Ok(Command::Dash { watch: false });
    };
    let rest = &args[1..];
    match sub.as_str() {
        "dash" | "status" => Ok(Command::Dash {
            watch: rest.iter().any(|a| a == "--watch" || a == "-w"),
        }),
        "agents" => Ok(Command::Agents),
        "ide" => Ok(Command::Ide),
        "activity" => {
            let mut limit = None;
            let mut it = rest.iter();
            while let Some(a) = it.next() {
                match a.as_str() {
                    "--limit" | "-n" => limit = Some(flag_value(&mut it, a)?),
                    other => return Err(format!("Unknown option '{}' for activity", other)),
                }
            }
            Ok(Command::Activity { limit })
        }
        "integrations" => {
            let (mut category, mut search, mut status, mut toggle) = (None, None, None, None);
            let mut it = rest.iter();
            while let Some(a) = it.next() {
                match a.as_str() {
                    "--search" | "-s" => search = Some(flag_value(&mut it, a)?),
                    "--toggle" | "-t" => toggle = Some(flag_value(&mut it, a)?),
                    "--status" => {
                        let raw = flag_value(&mut it, a)?;
                        status = Some(
                            LinkStatus::parse(&raw)
                                .ok_or_else(|| format!("Unknown status '{}'", raw))?,
                        );
                    }
                    c if !c.starts_with('-') && category.is_none() => {
                        let c = c.to_lowercase();
                        if !CATEGORIES.contains(&c.as_str()) {
                            return Err(format!("Unknown category '{}'", c));
                        }
                        category = Some(c);
                    }
                    other => return Err(format!("Unknown option '{}' for integrations", other)),
                }
            }
            Ok(Command::Integrations {
                category,
                search,
                status,
                toggle,
            })
        }
        "chat" => {
            let mut action = ChatAction::Continue;
            let mut words = Vec::new();
            let mut it = rest.iter();
            while let Some(a) = it.next() {
                match a.as_str() {
                    "--new" => action = ChatAction::New,
                    "--list" => action = ChatAction::List,
                    "--select" => action = ChatAction::Select(flag_value(&mut it, a)?),
                    w => words.push(w),
                }
            }
            Ok(Command::Chat {
                action,
                message: join_message(&words),
            })
        }
        "agent" => {
            let key = rest
                .first()
                .ok_or_else(|| "Missing agent key".to_string())?
                .to_lowercase();
            let words: Vec<&str> = rest[1..].iter().map(|s| s.as_str()).collect();
            Ok(Command::Agent {
                key,
                message: join_message(&words),
            })
        }
        "settings" => match rest.first().map(|s| s.as_str()) {
            None | Some("show") => Ok(Command::Settings(SettingsAction::Show)),
            Some("set") => match rest {
                [_, field, value @ ..] if !value.is_empty() => {
                    Ok(Command::Settings(SettingsAction::Set {
                        field: field.clone(),
                        value: value.join(" "),
                    }))
                }
                _ => Err("Usage: blox settings set FIELD VALUE".to_string()),
            },
            Some("add-doc") => match rest {
                [_, title, source, file] => Ok(Command::Settings(SettingsAction::AddDoc {
                    title: title.clone(),
                    source: source.clone(),
                    file: file.clone(),
                })),
                _ => Err("Usage: blox settings add-doc TITLE SOURCE FILE".to_string()),
            },
            Some(other) => Err(format!("Unknown settings action '{}'", other)),
        },
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("Unknown subcommand '{}'", other)),
    }
}

fn flag_value<'a>(it: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    it.next()
        .cloned()
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn join_message(words: &[&str]) -> Option<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn load_config() -> Result<CoreConfig, String> {
    CoreConfig::load().map_err(|e| format!("Config: {}", e))
}

/// Gateway base URL without a trailing slash.
fn gateway_url(config: &CoreConfig) -> String {
    if let Some(url) = blox_core::env_opt_string("BLOX_GATEWAY_URL") {
        return url.trim_end_matches('/').to_string();
    }
    let host = match config.host.as_str() {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        h => h,
    };
    format!("http://{}:{}", host, config.port)
}

fn open_store(config: &CoreConfig) -> Result<SledBlobStore, String> {
    let path = blox_core::env_opt_string("BLOX_LOCAL_STORE")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| config.local_store_path());
    SledBlobStore::open(&path)
        .map_err(|e| format!("Cannot open local store at {}: {}", path.display(), e))
}

fn http_client() -> reqwest::Client {
    reqwest::Client::new()
}

// ----------------------------------------------------------------------------
// Dashboard
// ----------------------------------------------------------------------------

async fn run_dash(watch: bool) -> Result<(), String> {
    let config = load_config()?;
    let base = gateway_url(&config);
    let client = http_client();

    if !watch {
        let status_url = format!("{}/api/dashboard/status", base);
        let agents_url = format!("{}/api/dashboard/agents", base);
        let activity_url = format!("{}/api/dashboard/activity", base);
        let (status, agents, activity) = tokio::join!(
            fetch_envelope::<DashboardStatus>(&client, &status_url),
            fetch_envelope::<AgentRoster>(&client, &agents_url),
            fetch_envelope::<ActivityFeed>(&client, &activity_url),
        );
        draw_dashboard(
            &config.app_name,
            &once(status),
            &once(agents),
            &once(activity),
        );
        return Ok(());
    }

    let mut status: PollingFeed<DashboardStatus> =
        PollingFeed::spawn(client.clone(), format!("{}/api/dashboard/status", base), STATUS_EVERY);
    let mut agents: PollingFeed<AgentRoster> =
        PollingFeed::spawn(client.clone(), format!("{}/api/dashboard/agents", base), AGENTS_EVERY);
    let mut activity: PollingFeed<ActivityFeed> =
        PollingFeed::spawn(client, format!("{}/api/dashboard/activity", base), ACTIVITY_EVERY);

    loop {
        print!("\x1B[2J\x1B[H");
        draw_dashboard(
            &config.app_name,
            &status.snapshot(),
            &agents.snapshot(),
            &activity.snapshot(),
        );
        let alive = tokio::select! {
            alive = status.changed() => alive,
            alive = agents.changed() => alive,
            alive = activity.changed() => alive,
            _ = tokio::signal::ctrl_c() => break,
        };
        if !alive {
            return Err("polling stopped".to_string());
        }
    }
    debug!(target: "blox::polling", "dashboard watch ended");
    Ok(())
}

/// Feed state for a single fetch.
fn once<T>(outcome: Result<T, String>) -> FeedState<T> {
    match outcome {
        Ok(data) => FeedState {
            data: Some(data),
            loading: false,
            error: None,
        },
        Err(e) => FeedState {
            data: None,
            loading: false,
            error: Some(e),
        },
    }
}

fn draw_dashboard(
    app_name: &str,
    status: &FeedState<DashboardStatus>,
    agents: &FeedState<AgentRoster>,
    activity: &FeedState<ActivityFeed>,
) {
    render::banner(app_name, "Dashboard");
    render::feed("Status", status, render::status);
    render::feed("Agents", agents, render::roster);
    render::feed("Activity", activity, render::activity);
}

async fn run_agents() -> Result<(), String> {
    let config = load_config()?;
    let url = format!("{}/api/dashboard/agents", gateway_url(&config));
    let roster = fetch_envelope::<AgentRoster>(&http_client(), &url).await?;
    render::banner(&config.app_name, "Agents");
    render::roster(&roster);
    Ok(())
}

// ----------------------------------------------------------------------------
// Activity
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InvocationsBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    invocations: Vec<ToolInvocation>,
    #[serde(default)]
    error: Option<blox_core::ErrorBody>,
}

impl InvocationsBody {
    fn into_result(self) -> Result<Vec<ToolInvocation>, String> {
        if self.success {
            Ok(self.invocations)
        } else {
            Err(self
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Failed to load activity".to_string()))
        }
    }
}

async fn run_activity(limit: Option<String>) -> Result<(), String> {
    let config = load_config()?;
    let mut url = format!("{}/api/tools/invocations", gateway_url(&config));
    if let Some(limit) = limit {
        url.push_str(&format!("?limit={}", limit));
    }
    let body: InvocationsBody = http_client()
        .get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;
    let items = body.into_result()?;
    render::banner(&config.app_name, "Activity");
    render::invocations(&items);
    Ok(())
}

// ----------------------------------------------------------------------------
// Integrations
// ----------------------------------------------------------------------------

fn run_integrations(
    category: Option<String>,
    search: Option<String>,
    status: Option<LinkStatus>,
    toggle: Option<String>,
) -> Result<(), String> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let mut items = load_integrations(&store).map_err(|e| e.to_string())?;

    if let Some(key) = toggle {
        let changed = integrations::toggle(&mut items, &key).map_err(|e| e.to_string())?;
        println!("  {} {} health is now {}%.", changed.emoji, changed.name, changed.health);
        save_json(&store, INTEGRATIONS_KEY, &items).map_err(|e| e.to_string())?;
    }

    let filter = IntegrationFilter {
        category,
        query: search,
        status,
    };
    let shown = filter.apply(&items);
    let summary = filter.summarize(&items);
    render::banner(&config.app_name, "Integrations");
    render::integrations(&shown, &summary);
    Ok(())
}

fn load_integrations(store: &dyn BlobStore) -> blox_core::Result<Vec<integrations::Integration>> {
    Ok(load_json(store, INTEGRATIONS_KEY)?.unwrap_or_else(integrations::catalog))
}

// ----------------------------------------------------------------------------
// Chat
// ----------------------------------------------------------------------------

async fn run_chat(action: ChatAction, message: Option<String>) -> Result<(), String> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let mut book = WorkstreamBook::load(&store, MAIN_SURFACE).map_err(|e| e.to_string())?;

    match action {
        ChatAction::Continue => {}
        ChatAction::New => {
            book.create();
            // newest first, so later runs continue it
            book.save(&store).map_err(|e| e.to_string())?;
        }
        ChatAction::List => {
            render::banner(&config.app_name, "Workstreams");
            render::workstreams(book.list(), book.active().map(|w| w.id.as_str()));
            return Ok(());
        }
        ChatAction::Select(id) => {
            // applies to this run only; the newest workstream is active on load
            if !book.select(&id) {
                return Err(format!("No workstream '{}'", id));
            }
        }
    }

    let request = |text: &str, profile| CrewRunRequest {
        role: Role::Ceo,
        company_profile: Some(profile),
        ..CrewRunRequest::new(text)
    };
    converse(&config, &store, &mut book, message, request).await?;
    render::banner(&config.app_name, CEO_LABEL);
    if let Some(ws) = book.active() {
        render::conversation(ws);
    }
    Ok(())
}

async fn run_agent(key: &str, message: Option<String>) -> Result<(), String> {
    let agent = catalog::lookup(key).ok_or_else(|| BloxError::UnknownAgent(key.to_string()).to_string())?;
    let config = load_config()?;
    let store = open_store(&config)?;
    let mut book = WorkstreamBook::load(&store, agent.key).map_err(|e| e.to_string())?;

    let request = |text: &str, profile| CrewRunRequest {
        agent: Some(agent.key.to_string()),
        company_profile: Some(profile),
        ..CrewRunRequest::new(text)
    };
    converse(&config, &store, &mut book, message, request).await?;
    render::banner(&config.app_name, &format!("{} ({}) {}", agent.name, agent.role, agent.presence.as_str()));
    match book.active() {
        Some(ws) => render::conversation(ws),
        None => println!("  {}\n", agent.placeholder),
    }
    Ok(())
}

/// Appends the user message, sends one crew run, and appends the reply. History is saved
/// after each append so a failed request still keeps what the user typed.
async fn converse<F>(
    config: &CoreConfig,
    store: &SledBlobStore,
    book: &mut WorkstreamBook,
    message: Option<String>,
    request: F,
) -> Result<(), String>
where
    F: Fn(&str, blox_core::CompanyProfile) -> CrewRunRequest,
{
    let Some(text) = message else {
        return Ok(());
    };
    let profile = ProfileStore::new(store).load().map_err(|e| e.to_string())?;

    book.append(Message::from_user(&text));
    book.save(store).map_err(|e| e.to_string())?;

    let url = format!("{}/api/crew/run", gateway_url(config));
    let reply = send_crew_run(&http_client(), &url, &request(&text, profile)).await;
    book.append(reply);
    book.save(store).map_err(|e| e.to_string())?;
    Ok(())
}

/// Any transport or decode failure becomes the connectivity message.
async fn send_crew_run(client: &reqwest::Client, url: &str, body: &CrewRunRequest) -> Message {
    let outcome = async {
        client
            .post(url)
            .json(body)
            .send()
            .await?
            .json::<CrewRunResponse>()
            .await
    }
    .await;
    match outcome {
        Ok(res) => res.into_message(),
        Err(e) => {
            warn!(target: "blox::gateway", url = %url, error = %e, "crew run failed");
            Message::error(CONNECT_ERROR_TEXT)
        }
    }
}

// ----------------------------------------------------------------------------
// IDE
// ----------------------------------------------------------------------------

fn run_ide() -> Result<(), String> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let profile = ProfileStore::new(&store).load().map_err(|e| e.to_string())?;
    render::banner(&config.app_name, "IDE Workspace");
    render::ide(&profile);
    Ok(())
}

// ----------------------------------------------------------------------------
// Settings
// ----------------------------------------------------------------------------

fn run_settings(action: SettingsAction) -> Result<(), String> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let profiles = ProfileStore::new(&store);

    let profile = match action {
        SettingsAction::Show => profiles.load().map_err(|e| e.to_string())?,
        SettingsAction::Set { field, value } => {
            let profile = profiles.set_field(&field, &value).map_err(|e| e.to_string())?;
            println!("  Saved {}.", field);
            profile
        }
        SettingsAction::AddDoc { title, source, file } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|e| format!("Cannot read {}: {}", file, e))?;
            let doc = profiles
                .add_doc(&title, &source, &content)
                .map_err(|e| e.to_string())?;
            println!("  Added knowledge doc {} ({}).", doc.title, doc.id);
            profiles.load().map_err(|e| e.to_string())?
        }
    };
    render::banner(&config.app_name, "Settings");
    render::profile(&profile);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_core::MemoryBlobStore;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn no_args_is_dashboard() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Dash { watch: false });
        assert_eq!(parse_args(&args("dash --watch")).unwrap(), Command::Dash { watch: true });
    }

    #[test]
    fn chat_words_are_joined() {
        let cmd = parse_args(&args("chat --new plan the q3 campaign")).unwrap();
        assert_eq!(
            cmd,
            Command::Chat {
                action: ChatAction::New,
                message: Some("plan the q3 campaign".to_string()),
            }
        );
        assert_eq!(
            parse_args(&args("chat --list")).unwrap(),
            Command::Chat { action: ChatAction::List, message: None }
        );
    }

    #[test]
    fn agent_key_is_lowercased() {
        let cmd = parse_args(&args("agent CYRA check the firewall")).unwrap();
        assert_eq!(
            cmd,
            Command::Agent {
                key: "cyra".to_string(),
                message: Some("check the firewall".to_string()),
            }
        );
        assert!(parse_args(&args("agent")).is_err());
    }

    #[test]
    fn integration_options() {
        let cmd = parse_args(&args("integrations Security --search waf --status connected")).unwrap();
        assert_eq!(
            cmd,
            Command::Integrations {
                category: Some("security".to_string()),
                search: Some("waf".to_string()),
                status: Some(LinkStatus::Connected),
                toggle: None,
            }
        );
        assert!(parse_args(&args("integrations nope")).is_err());
        assert!(parse_args(&args("integrations --status sleepy")).is_err());
        assert!(parse_args(&args("integrations --toggle")).is_err());
    }

    #[test]
    fn settings_actions() {
        assert_eq!(
            parse_args(&args("settings set companyName Acme Robotics")).unwrap(),
            Command::Settings(SettingsAction::Set {
                field: "companyName".to_string(),
                value: "Acme Robotics".to_string(),
            })
        );
        assert_eq!(
            parse_args(&args("settings set agentKeys.cyra sk-cyra")).unwrap(),
            Command::Settings(SettingsAction::Set {
                field: "agentKeys.cyra".to_string(),
                value: "sk-cyra".to_string(),
            })
        );
        assert_eq!(parse_args(&args("ide")).unwrap(), Command::Ide);
        assert!(parse_args(&args("settings set tone")).is_err());
        assert!(parse_args(&args("settings add-doc Title web")).is_err());
        assert!(parse_args(&args("settings purge")).is_err());
    }

    #[test]
    fn activity_limit_is_passed_through() {
        assert_eq!(
            parse_args(&args("activity --limit 5")).unwrap(),
            Command::Activity { limit: Some("5".to_string()) }
        );
        assert!(parse_args(&args("bogus")).is_err());
    }

    #[test]
    fn integrations_default_to_catalog_then_persist() {
        let store = MemoryBlobStore::new();
        let mut items = load_integrations(&store).unwrap();
        assert_eq!(items.len(), integrations::catalog().len());
        let before = items[0].health;
        integrations::toggle(&mut items, "gmail").unwrap();
        save_json(&store, INTEGRATIONS_KEY, &items).unwrap();
        let reloaded = load_integrations(&store).unwrap();
        assert_eq!(reloaded[0].key, "gmail");
        assert_ne!(reloaded[0].health, before);
    }

    #[test]
    fn failed_invocation_body_shows_message() {
        let body: InvocationsBody = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": { "code": "UNAUTHORIZED", "message": "Login required." }
        }))
        .unwrap();
        assert_eq!(body.into_result().unwrap_err(), "Login required.");
    }

    #[tokio::test]
    async fn unreachable_gateway_gives_connect_error() {
        let msg = send_crew_run(
            &http_client(),
            "http://127.0.0.1:9/api/crew/run",
            &CrewRunRequest::new("hello"),
        )
        .await;
        assert_eq!(msg.content, CONNECT_ERROR_TEXT);
    }
}

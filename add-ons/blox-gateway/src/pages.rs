//! Server-rendered app shell: sidebar navigation plus one page per section.
//!
//! Chat and settings keep their state in the browser (`localStorage`), under the same keys the
//! terminal shell uses in its blob store.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use blox_core::integrations::{self, IntegrationFilter, LinkStatus};
use blox_core::mock_data::{self, fallback_invocations};
use blox_core::store::{workstreams_key, PROFILE_KEY};
use blox_core::models::DEFAULT_IDE_PROVIDER;
use blox_core::{catalog, time_ago, workstreams, CompanyProfile, Presence, CONNECT_ERROR_TEXT};
use serde::Deserialize;

use crate::AppState;

pub const NAV: [(&str, &str); 7] = [
    ("Dashboard", "/app"),
    ("Chat", "/app/chat"),
    ("Activity", "/app/activity"),
    ("Integrations", "/app/integrations"),
    ("IDE", "/app/ide"),
    ("Settings", "/app/settings"),
    ("Agent", "/app/agent"),
];

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn shell(app_name: &str, active: &str, title: &str, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(name, href)| {
            let class = if *href == active { "nav active" } else { "nav" };
            format!(r#"<a class="{}" href="{}">{}</a>"#, class, href, name)
        })
        .collect();
    format!(
        r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>{title} - {app}</title>
<style>
body{{margin:0;font-family:system-ui,sans-serif;display:flex;min-height:100vh;background:#f8fafc;color:#0f172a}}
aside{{width:220px;background:#0f172a;color:#e2e8f0;padding:16px;display:flex;flex-direction:column;gap:4px}}
aside .brand{{font-weight:700;margin-bottom:16px}}
.nav{{color:#cbd5e1;text-decoration:none;padding:8px 10px;border-radius:8px}}
.nav.active{{background:#1e293b;color:#fff}}
main{{flex:1;padding:24px}}
table{{border-collapse:collapse;width:100%}}td,th{{border-bottom:1px solid #e2e8f0;padding:6px 8px;text-align:left}}
.kpis{{display:grid;grid-template-columns:repeat(4,1fr);gap:12px;margin-bottom:24px}}
.card{{background:#fff;border:1px solid #e2e8f0;border-radius:12px;padding:12px}}
</style></head>
<body><aside><div class="brand">{app}</div>{nav}</aside>
<main><h1>{title}</h1>{body}</main></body></html>"#,
        title = html_escape(title),
        app = html_escape(app_name),
        nav = nav,
        body = body,
    )
}

pub async fn root() -> Redirect {
    Redirect::temporary("/app")
}

pub async fn login(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<!doctype html><html lang="en"><head><meta charset="utf-8"><title>Login Required - {app}</title></head>
<body style="font-family:system-ui,sans-serif;display:grid;place-items:center;min-height:100vh;margin:0;background:#f8fafc">
<div style="max-width:420px;background:#fff;border:1px solid #e2e8f0;border-radius:16px;padding:24px">
<h1>Login required</h1>
<p>This app shell is UI-only right now. Enable access by setting <code>BYPASS_AUTH=true</code> in your environment.</p>
</div></body></html>"#,
        app = html_escape(&state.config.app_name)
    ))
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let (status, roster, activity) = {
        let mut rng = rand::thread_rng();
        (
            mock_data::dashboard_status(&mut rng),
            mock_data::agent_roster(&mut rng),
            mock_data::activity_feed(&mut rng),
        )
    };
    let k = &status.kpis;
    let kpis = format!(
        r#"<div class="kpis"><div class="card"><b>{}</b><br>Agents online</div><div class="card"><b>{}</b><br>Tools connected</div><div class="card"><b>{}%</b><br>System health</div><div class="card"><b>{}</b><br>Tasks in queue</div></div>"#,
        k.agents_online, k.tools_connected, k.system_health, k.tasks_in_queue
    );
    let agents: String = roster
        .agents
        .iter()
        .map(|a| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&a.name),
                html_escape(&a.subtitle),
                a.status.as_str(),
                html_escape(&a.last_activity),
                a.tasks_completed
            )
        })
        .collect();
    let feed: String = activity
        .recent_activity
        .iter()
        .map(|i| format!("<li>{} <small>{}</small></li>", html_escape(&i.title), i.time))
        .collect();
    let body = format!(
        r#"<meta http-equiv="refresh" content="30">{kpis}
<p>Uptime {uptime}% | latency {latency} | throughput {throughput} | incidents {incidents}</p>
<h2>Agents</h2><table><tr><th>Agent</th><th>Focus</th><th>Status</th><th>Last activity</th><th>Tasks</th></tr>{agents}</table>
<h2>Recent activity</h2><ul>{feed}</ul>"#,
        kpis = kpis,
        uptime = status.system_status.uptime,
        latency = status.health_signals.latency,
        throughput = status.health_signals.throughput,
        incidents = status.health_signals.incidents,
        agents = agents,
        feed = feed,
    );
    Html(shell(&state.config.app_name, "/app", "Dashboard", &body))
}

/// Browser-side chat loop: POST to crew-run, keep workstreams in localStorage.
/// The sidebar lists workstreams newest first; the first one is active on load.
fn chat_widget(surface: &str, agent: Option<&str>, placeholder: &str) -> String {
    let agent_field = match agent {
        Some(key) => format!(r#"agent:"{}","#, key),
        None => r#"role:"ceo","#.to_string(),
    };
    format!(
        r#"<div style="display:flex;gap:12px">
<div class="card" style="width:220px"><button id="new-ws">+ New workstream</button><ul id="ws-list" style="list-style:none;padding:0"></ul></div>
<div style="flex:1"><div id="log" class="card" style="min-height:240px"></div>
<form id="chat" style="margin-top:12px;display:flex;gap:8px"><input id="msg" style="flex:1" placeholder="{placeholder}"><button>Send</button></form></div></div>
<script>
const KEY="{ws_key}";
const load=()=>JSON.parse(localStorage.getItem(KEY)||"[]");
const save=(all)=>localStorage.setItem(KEY,JSON.stringify(all));
let active=(load()[0]||{{}}).id||null;
const fresh=()=>{{const now=new Date().toISOString();return {{id:"ws-"+Date.now(),title:"{untitled}",createdAt:now,updatedAt:now,messages:[]}};}};
const render=()=>{{const all=load();const ws=all.find(w=>w.id===active);
document.getElementById("ws-list").innerHTML=all.map(w=>"<li><a href='#' data-id='"+w.id+"'"+(w.id===active?" style='font-weight:700'":"")+">"+w.title.replace(/</g,"&lt;")+"</a></li>").join("");
document.getElementById("log").innerHTML=(ws?ws.messages:[]).map(m=>"<p><b>"+m.sender+":</b> "+m.content.replace(/</g,"&lt;")+"</p>").join("");}};
document.getElementById("ws-list").onclick=(e)=>{{const id=e.target.dataset&&e.target.dataset.id;if(id){{e.preventDefault();active=id;render();}}}};
document.getElementById("new-ws").onclick=()=>{{const all=load();const ws=fresh();all.unshift(ws);save(all);active=ws.id;render();}};
document.getElementById("chat").onsubmit=async(e)=>{{e.preventDefault();const input=document.getElementById("msg");const text=input.value.trim();if(!text)return;input.value="";
let all=load();let ws=all.find(w=>w.id===active);if(!ws){{ws=fresh();all.unshift(ws);active=ws.id;}}
ws.messages.push({{id:Date.now()+"-user",content:text,sender:"user",timestamp:new Date().toISOString()}});save(all);render();
const profile=JSON.parse(localStorage.getItem("{profile_key}")||"null");
let reply;try{{const r=await fetch("/api/crew/run",{{method:"POST",headers:{{"Content-Type":"application/json"}},body:JSON.stringify({{message:text,channel:"web",{agent_field}companyProfile:profile}})}});const d=await r.json();
reply=(r.ok&&d.success)?{{id:Date.now()+"-blox",content:d.reply||"I processed your request.",sender:"blox",toolsUsed:d.toolsUsed}}:{{id:Date.now()+"-error",content:(d.error&&d.error.message)||"Sorry, I encountered an issue processing your request.",sender:"blox"}};}}
catch(err){{reply={{id:Date.now()+"-error",content:"{connect_error}",sender:"blox"}};}}
all=load();ws=all.find(w=>w.id===active)||ws;
reply.timestamp=new Date().toISOString();ws.messages.push(reply);ws.updatedAt=reply.timestamp;if(ws.title==="{untitled}")ws.title=ws.messages[0].content.slice(0,{title_chars});
save(all);render();}};
render();
</script>"#,
        placeholder = html_escape(placeholder),
        ws_key = workstreams_key(surface),
        profile_key = PROFILE_KEY,
        agent_field = agent_field,
        connect_error = CONNECT_ERROR_TEXT,
        untitled = workstreams::UNTITLED,
        title_chars = workstreams::TITLE_CHARS,
    )
}

pub async fn chat(State(state): State<AppState>) -> Html<String> {
    let body = chat_widget("blox", None, "Ask BLOX anything...");
    Html(shell(&state.config.app_name, "/app/chat", "Chat with BLOX", &body))
}

pub async fn agent_directory(State(state): State<AppState>) -> Html<String> {
    let rows: String = catalog::CATALOG
        .iter()
        .map(|a| {
            format!(
                r#"<tr><td><a href="/app/agents/{key}">{name}</a></td><td>{role}</td><td>{presence}</td><td>{tools}</td></tr>"#,
                key = a.key,
                name = a.name,
                role = a.role,
                presence = a.presence.as_str(),
                tools = a.default_tools.join(", "),
            )
        })
        .collect();
    let body = format!(
        "<table><tr><th>Agent</th><th>Role</th><th>Status</th><th>Default tools</th></tr>{}</table>",
        rows
    );
    Html(shell(&state.config.app_name, "/app/agent", "Agents", &body))
}

pub async fn agent_chat(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let Some(agent) = catalog::lookup(&key) else {
        return not_found(State(state)).await.into_response();
    };
    let presence = match agent.presence {
        Presence::Online => "Online",
        Presence::Offline => "Offline",
    };
    let body = format!(
        "<p>{} | {}</p>{}",
        agent.role,
        presence,
        chat_widget(agent.key, Some(agent.key), agent.placeholder)
    );
    Html(shell(&state.config.app_name, "/app/agent", &agent.label(), &body)).into_response()
}

pub async fn activity(State(state): State<AppState>) -> Html<String> {
    let now = chrono::Utc::now();
    let rows: String = fallback_invocations()
        .iter()
        .map(|inv| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&inv.agent_name),
                html_escape(&inv.describe()),
                html_escape(inv.result.get("status").and_then(|s| s.as_str()).unwrap_or("unknown")),
                time_ago(inv.created_at, now)
            )
        })
        .collect();
    let body = format!(
        "<table><tr><th>Agent</th><th>Action</th><th>Status</th><th>When</th></tr>{}</table>",
        rows
    );
    Html(shell(&state.config.app_name, "/app/activity", "Activity", &body))
}

#[derive(Debug, Default, Deserialize)]
pub struct IntegrationQuery {
    category: Option<String>,
    q: Option<String>,
    status: Option<String>,
}

pub async fn integrations(
    State(state): State<AppState>,
    Query(query): Query<IntegrationQuery>,
) -> Html<String> {
    let items = integrations::catalog();
    let filter = IntegrationFilter {
        category: query.category.filter(|c| !c.is_empty()),
        query: query.q.filter(|q| !q.is_empty()),
        status: query.status.as_deref().and_then(LinkStatus::parse),
    };
    let shown = filter.apply(&items);
    let summary = filter.summarize(&items);
    let tabs: String = integrations::CATEGORIES
        .iter()
        .map(|c| format!(r#"<a href="/app/integrations?category={c}">{c}</a> "#, c = c))
        .collect();
    let rows: String = shown
        .iter()
        .map(|i| {
            // health toggle is only offered on connected cards
            let toggle = if i.status == LinkStatus::Connected {
                format!(r#"<input type="checkbox" checked onchange="bump('{}')">"#, i.key)
            } else {
                String::new()
            };
            format!(
                r#"<tr><td>{} {}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td id="health-{}" data-health="{}">{}%</td><td>{}</td></tr>"#,
                i.emoji,
                html_escape(&i.name),
                html_escape(&i.desc),
                i.status.as_str(),
                html_escape(i.account.as_deref().unwrap_or("-")),
                html_escape(i.last_sync.as_deref().unwrap_or("-")),
                i.key,
                i.health,
                i.health,
                toggle
            )
        })
        .collect();
    let body = format!(
        r#"<p>{tabs}</p><p>Connected {c} | Needs attention {a} | Available {v} | Avg health {h}%</p>
<table><tr><th>Integration</th><th>Description</th><th>Status</th><th>Account</th><th>Last sync</th><th>Health</th><th></th></tr>{rows}</table>
<script>
function bump(key){{const cell=document.getElementById("health-"+key);let h=Number(cell.dataset.health);
h=Math.max(0,h+(h>={full}?-{drop}:{step}));cell.dataset.health=h;cell.textContent=h+"%";}}
</script>"#,
        tabs = tabs,
        c = summary.connected,
        a = summary.attention,
        v = summary.available,
        h = summary.average_health,
        rows = rows,
        full = integrations::FULL_HEALTH,
        drop = integrations::HEALTH_DROP,
        step = integrations::HEALTH_STEP,
    );
    Html(shell(&state.config.app_name, "/app/integrations", "Integrations", &body))
}

pub async fn settings(State(state): State<AppState>) -> Html<String> {
    let defaults = CompanyProfile::default();
    let fields: String = CompanyProfile::TEXT_FIELDS
        .iter()
        .map(|f| {
            let input_type = if f.ends_with("Key") || f.ends_with("Token") { "password" } else { "text" };
            format!(
                r#"<label style="display:block;margin:6px 0">{f}<br><input type="{t}" name="{f}" style="width:100%"></label>"#,
                f = f,
                t = input_type
            )
        })
        .collect();
    let agent_keys: String = catalog::CATALOG
        .iter()
        .map(|a| {
            format!(
                r#"<label style="display:block;margin:6px 0">{label}<br><input type="password" name="agentKeys.{key}" style="width:100%"></label>"#,
                label = html_escape(&a.label()),
                key = a.key
            )
        })
        .collect();
    let body = format!(
        r#"<form id="profile" class="card">{fields}
<label style="display:block;margin:12px 0"><input type="checkbox" name="sharedAgentKey"> Use the shared key for every agent</label>
<fieldset id="agent-keys">{agent_keys}</fieldset>
<button>Save</button> <span id="saved"></span></form>
<script>
const KEY="{key}";
const form=document.getElementById("profile");
const stored=Object.assign({{tone:"{tone}",sharedAgentKey:true,agentKeys:{{}}}},JSON.parse(localStorage.getItem(KEY)||"{{}}"));
const keys=document.getElementById("agent-keys");
const sync=()=>{{keys.style.display=form.elements.sharedAgentKey.checked?"none":"block";}};
for(const el of form.elements){{if(!el.name)continue;
if(el.type==="checkbox")el.checked=stored[el.name]!==false;
else if(el.name.startsWith("agentKeys."))el.value=stored.agentKeys[el.name.slice(10)]||"";
else if(stored[el.name]!==undefined&&stored[el.name]!==null)el.value=stored[el.name];}}
form.elements.sharedAgentKey.onchange=sync;sync();
form.onsubmit=(e)=>{{e.preventDefault();for(const el of form.elements){{if(!el.name)continue;
if(el.type==="checkbox")stored[el.name]=el.checked;
else if(el.name.startsWith("agentKeys."))stored.agentKeys[el.name.slice(10)]=el.value;
else stored[el.name]=el.value;}}
localStorage.setItem(KEY,JSON.stringify(stored));document.getElementById("saved").textContent="Saved";}};
</script>"#,
        fields = fields,
        agent_keys = agent_keys,
        key = PROFILE_KEY,
        tone = html_escape(&defaults.tone),
    );
    Html(shell(&state.config.app_name, "/app/settings", "Settings", &body))
}

/// D.A.S.H workspace IDE. The endpoint lives in the browser's saved profile, so the page
/// renders the empty state and the script swaps in the iframe when one is configured.
pub async fn ide(State(state): State<AppState>) -> Html<String> {
    let body = format!(
        r#"<p>Launch a secure workspace for D.A.S.H to run terminals, Git, and SSH tasks.</p>
<div style="display:flex;gap:12px">
<div id="ide" class="card" style="flex:1;min-height:560px">
<div id="ide-empty" style="text-align:center;padding-top:200px"><b>No workspace connected</b>
<p>Configure your IDE endpoint in <a href="/app/settings">Settings</a> to embed the workspace here.</p></div></div>
<div class="card" style="width:300px"><b>Workspace Details</b>
<p>Provider<br><span id="ide-provider">{provider}</span></p>
<p>Endpoint<br><span id="ide-endpoint" style="word-break:break-all">Not configured</span></p>
<p id="ide-open"></p>
<b>Capabilities</b><p>Terminal + SSH<br>Git + GitHub</p>
<small>D.A.S.H will operate inside this environment once keys are configured.</small></div></div>
<script>
const p=JSON.parse(localStorage.getItem("{key}")||"{{}}")||{{}};
const url=(typeof p.dashIdeUrl==="string"?p.dashIdeUrl:"").trim();
const provider=(typeof p.dashIdeProvider==="string"?p.dashIdeProvider:"").trim();
if(provider)document.getElementById("ide-provider").textContent=provider;
if(url){{
const token=typeof p.dashIdeToken==="string"?p.dashIdeToken:"";
const src=token?url+(url.includes("?")?"&":"?")+"token="+encodeURIComponent(token):url;
document.getElementById("ide-endpoint").textContent=url;
const a=document.createElement("a");a.href=url;a.target="_blank";a.rel="noreferrer";a.textContent="Open in new tab";document.getElementById("ide-open").appendChild(a);
const f=document.createElement("iframe");f.title="D.A.S.H IDE";f.src=src;f.style.cssText="width:100%;height:560px;border:0";
const box=document.getElementById("ide");box.innerHTML="";box.appendChild(f);}}
</script>"#,
        provider = DEFAULT_IDE_PROVIDER,
        key = PROFILE_KEY,
    );
    Html(shell(&state.config.app_name, "/app/ide", "IDE Workspace", &body))
}

pub async fn not_found(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(shell(
            &state.config.app_name,
            "",
            "Not found",
            r#"<p>This page does not exist. <a href="/app">Back to the dashboard</a>.</p>"#,
        )),
    )
}

//! Gateway configuration (`config/gateway.toml` + `BLOX__*` env) and the plain env toggles.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_ROUTER_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// File + environment configuration.
///
/// | Key | Default | Description |
/// |-----|---------|-------------|
/// | app_name | BLOX AI CEO | Name shown in the shell and `/health`. |
/// | host | 127.0.0.1 | Bind address. |
/// | port | 3000 | HTTP port. |
/// | storage_path | ./data | Base directory for the terminal shell's local store. |
/// | llm_api_base | https://api.openai.com/v1 | OpenAI-compatible API root. |
/// | router_model | gpt-4o-mini | Model for the one-shot agent classification. |
/// | chat_model | gpt-4o | Model for `/api/chat`. |
/// | llm_timeout_secs | 60 | Client timeout for outbound LLM calls. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub storage_path: String,
    pub llm_api_base: String,
    pub router_model: String,
    pub chat_model: String,
    pub llm_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "BLOX AI CEO".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            storage_path: "./data".to_string(),
            llm_api_base: DEFAULT_LLM_API_BASE.to_string(),
            router_model: DEFAULT_ROUTER_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            llm_timeout_secs: 60,
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: `BLOX__*` env > `BLOX_CONFIG` path
    /// (or `config/gateway.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("BLOX_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", d.app_name)?
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("storage_path", d.storage_path)?
            .set_default("llm_api_base", d.llm_api_base)?
            .set_default("router_model", d.router_model)?
            .set_default("chat_model", d.chat_model)?
            .set_default("llm_timeout_secs", d.llm_timeout_secs as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        builder
            .add_source(config::Environment::with_prefix("BLOX").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default location of the terminal shell's blob store.
    pub fn local_store_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("blox_local")
    }
}

/// Process-level toggles read from plain env names.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | BYPASS_AUTH | false | Exactly `true` opens the app shell and the protected API routes. |
/// | OPENAI_API_KEY | unset | Key for `/api/chat`; crew-run fallback when the profile has none. |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSettings {
    pub bypass_auth: bool,
    pub openai_api_key: Option<String>,
}

impl AccessSettings {
    pub fn from_env() -> Self {
        Self {
            bypass_auth: env_flag("BYPASS_AUTH"),
            openai_api_key: env_opt_string("OPENAI_API_KEY"),
        }
    }
}

/// `"true"` (after trim) enables; any other value, or unset, disables.
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

pub fn parse_flag(raw: &str) -> bool {
    raw.trim() == "true"
}

pub fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

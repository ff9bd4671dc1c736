//! blox-core: shared library for the BLOX AI CEO gateway and terminal shell.
//!
//! Agent catalog and crew-run routing, the LLM bridge, mock dashboard data, the integrations
//! catalog, and the client-side store (profile, workstreams) with its polling feed.

pub mod catalog;
mod config;
mod error;
pub mod integrations;
mod llm;
pub mod mock_data;
pub mod models;
pub mod polling;
mod profile;
pub mod router;
pub mod store;
pub mod workstreams;

pub use catalog::{AgentProfile, Presence, CATALOG, CEO_LABEL};
pub use config::{
    env_flag, env_opt_string, parse_flag, AccessSettings, CoreConfig, DEFAULT_CHAT_MODEL,
    DEFAULT_LLM_API_BASE, DEFAULT_ROUTER_MODEL,
};
pub use error::{BloxError, Result};
pub use llm::{classification_prompt, LlmBridge, BLOX_CEO_PROMPT, EMPTY_REPLY_FALLBACK};
pub use models::{
    time_ago, Agent, CompanyProfile, KnowledgeDoc, Message, Sender, ToolInvocation, ToolUsed,
    Workstream,
};
pub use polling::{fetch_envelope, FeedState, PollingFeed, DEFAULT_POLL_INTERVAL};
pub use profile::ProfileStore;
pub use router::{
    compose_reply, AgentRouter, Channel, CrewRunRequest, CrewRunResponse, ErrorBody, Role,
    RouteSource, RoutingOutcome, CONNECT_ERROR_TEXT,
};
pub use store::{BlobStore, MemoryBlobStore, SledBlobStore};
pub use workstreams::WorkstreamBook;

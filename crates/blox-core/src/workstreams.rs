//! Per-surface chat history, persisted as one JSON array per surface.

use chrono::Utc;

use crate::error::Result;
use crate::models::{Message, Workstream};
use crate::store::{load_json, save_json, workstreams_key, BlobStore};

pub const UNTITLED: &str = "New Workstream";
/// Characters of the first message used as the workstream title.
pub const TITLE_CHARS: usize = 32;

pub struct WorkstreamBook {
    key: String,
    /// Most recently created first.
    workstreams: Vec<Workstream>,
    active: Option<String>,
}

impl WorkstreamBook {
    /// Loads the surface's history; the first stored workstream becomes active.
    pub fn load(store: &dyn BlobStore, surface: &str) -> Result<Self> {
        let key = workstreams_key(surface);
        let workstreams: Vec<Workstream> = load_json(store, &key)?.unwrap_or_default();
        let active = workstreams.first().map(|w| w.id.clone());
        Ok(Self {
            key,
            workstreams,
            active,
        })
    }

    pub fn save(&self, store: &dyn BlobStore) -> Result<()> {
        save_json(store, &self.key, &self.workstreams)
    }

    pub fn list(&self) -> &[Workstream] {
        &self.workstreams
    }

    pub fn active(&self) -> Option<&Workstream> {
        let id = self.active.as_deref()?;
        self.workstreams.iter().find(|w| w.id == id)
    }

    /// Prepends an empty workstream and makes it active. Returns its id.
    pub fn create(&mut self) -> String {
        let now = Utc::now();
        let mut id = format!("ws-{}", now.timestamp_millis());
        // two creates inside one millisecond
        while self.workstreams.iter().any(|w| w.id == id) {
            id.push('_');
        }
        self.workstreams.insert(
            0,
            Workstream {
                id: id.clone(),
                title: UNTITLED.to_string(),
                created_at: now,
                updated_at: now,
                messages: Vec::new(),
            },
        );
        self.active = Some(id.clone());
        id
    }

    pub fn ensure_active(&mut self) -> String {
        let current = self.active().map(|w| w.id.clone());
        current.unwrap_or_else(|| self.create())
    }

    /// Switches the active workstream. Returns false for an unknown id.
    pub fn select(&mut self, id: &str) -> bool {
        if self.workstreams.iter().any(|w| w.id == id) {
            self.active = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Appends to the active workstream (creating one if needed).
    pub fn append(&mut self, message: Message) -> &Workstream {
        let id = self.ensure_active();
        let idx = self
            .workstreams
            .iter()
            .position(|w| w.id == id)
            .unwrap_or(0);
        let ws = &mut self.workstreams[idx];
        ws.messages.push(message);
        ws.updated_at = Utc::now();
        if ws.title == UNTITLED {
            if let Some(first) = ws.messages.first() {
                ws.title = first.content.chars().take(TITLE_CHARS).collect();
            }
        }
        &self.workstreams[idx]
    }
}

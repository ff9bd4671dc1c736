//! Key-value blob storage for client-side state: a Sled tree behind a DashMap hot cache,
//! plus an in-memory variant for tests and throwaway sessions.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::error::{BloxError, Result};

pub const PROFILE_KEY: &str = "blox_company_profile";
/// Integration connection state edited from the terminal shell.
pub const INTEGRATIONS_KEY: &str = "blox_integrations";

/// Workstream history key for a chat surface (`blox` for the main chat, agent key otherwise).
pub fn workstreams_key(surface: &str) -> String {
    format!("blox_workstreams_{}", surface)
}

pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Sled-backed store. Reads check the hot cache first; writes go to both.
pub struct SledBlobStore {
    db: Db,
    cache: Arc<DashMap<String, Vec<u8>>>,
}

impl SledBlobStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            db,
            cache: Arc::new(DashMap::new()),
        })
    }
}

impl BlobStore for SledBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(v) = self.cache.get(key) {
            return Ok(Some(v.clone()));
        }
        let out = self.db.get(key.as_bytes())?.map(|iv| iv.to_vec());
        if let Some(ref bytes) = out {
            self.cache.insert(key.to_string(), bytes.clone());
        }
        Ok(out)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        self.cache.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        self.cache.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for entry in self.db.iter() {
            let (k, _) = entry?;
            out.push(String::from_utf8_lossy(&k).into_owned());
        }
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.clone()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}

pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| BloxError::Decode {
                key: key.to_string(),
                source,
            }),
    }
}

pub fn save_json<T: Serialize>(store: &dyn BlobStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(BloxError::Encode)?;
    store.put(key, &bytes)
}

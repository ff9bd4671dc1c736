//! Company profile persistence for the settings page.

use chrono::Utc;

use crate::error::Result;
use crate::models::{CompanyProfile, KnowledgeDoc};
use crate::store::{load_json, save_json, BlobStore, PROFILE_KEY};

pub struct ProfileStore<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> ProfileStore<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Stored profile, or the default one when nothing was saved yet.
    pub fn load(&self) -> Result<CompanyProfile> {
        Ok(load_json(self.store, PROFILE_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, profile: &CompanyProfile) -> Result<()> {
        save_json(self.store, PROFILE_KEY, profile)
    }

    pub fn set_field(&self, name: &str, value: &str) -> Result<CompanyProfile> {
        let mut profile = self.load()?;
        profile.set_field(name, value)?;
        self.save(&profile)?;
        Ok(profile)
    }

    /// Appends a knowledge document; its id is `doc-{millis}`.
    pub fn add_doc(&self, title: &str, source: &str, content: &str) -> Result<KnowledgeDoc> {
        let mut profile = self.load()?;
        let doc = KnowledgeDoc {
            id: format!("doc-{}", Utc::now().timestamp_millis()),
            title: title.to_string(),
            source: source.to_string(),
            url: String::new(),
            content: content.to_string(),
        };
        profile.knowledge_docs.push(doc.clone());
        self.save(&profile)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;
    use crate::BloxError;

    #[test]
    fn absent_profile_loads_defaults() {
        let store = MemoryBlobStore::new();
        let profile = ProfileStore::new(&store).load().unwrap();
        assert_eq!(profile, CompanyProfile::default());
        assert_eq!(profile.agent_keys.len(), 8);
    }

    #[test]
    fn edits_persist() {
        let store = MemoryBlobStore::new();
        let profiles = ProfileStore::new(&store);
        profiles.set_field("companyName", "Barlow Holdings").unwrap();
        profiles.add_doc("Pricing", "upload", "Tier A is $99").unwrap();

        let loaded = profiles.load().unwrap();
        assert_eq!(loaded.company_name, "Barlow Holdings");
        assert_eq!(loaded.knowledge_docs.len(), 1);
        assert!(loaded.knowledge_docs[0].id.starts_with("doc-"));

        let err = profiles.set_field("nope", "x").unwrap_err();
        assert!(matches!(err, BloxError::InvalidField(_)));
    }
}

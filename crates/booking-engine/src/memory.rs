//! In-process repositories backed by maps of stored documents.
//!
//! Useful for tests and for running the engine without a backend. Records are
//! kept in their document shape so reads go through the same conversion a
//! real store would need.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BookingError, Result};
use crate::event::{EventDocument, EventRecord};
use crate::profile::{MasterProfile, ProfileDocument};
use crate::repository::{EventRepository, ProfileRepository};

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    docs: RwLock<BTreeMap<String, EventDocument>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events across all owners.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<EventRecord>> {
        let docs = self.docs.read().await;
        let mut records: Vec<EventRecord> = docs
            .iter()
            .filter(|(_, doc)| doc.owner_id == owner_id)
            .map(|(id, doc)| doc.clone().into_record(id.clone()))
            .collect();
        records.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn create(&self, record: &EventRecord, owner_id: &str) -> Result<String> {
        let id = new_id();
        let doc = EventDocument::from_record(record, owner_id);
        self.docs.write().await.insert(id.clone(), doc);
        Ok(id)
    }

    async fn update(&self, id: &str, record: &EventRecord, owner_id: &str) -> Result<()> {
        let mut docs = self.docs.write().await;
        let slot = docs
            .get_mut(id)
            .ok_or_else(|| BookingError::NotFound(format!("event '{id}'")))?;
        *slot = EventDocument::from_record(record, owner_id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.docs.write().await.remove(id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    docs: RwLock<BTreeMap<String, ProfileDocument>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileStore {
    async fn get(&self, id: &str) -> Result<Option<MasterProfile>> {
        let docs = self.docs.read().await;
        docs.get(id).cloned().map(MasterProfile::try_from).transpose()
    }

    async fn create(&self, profile: &MasterProfile) -> Result<String> {
        let id = new_id();
        self.docs
            .write()
            .await
            .insert(id.clone(), ProfileDocument::from(profile));
        Ok(id)
    }

    async fn update(&self, id: &str, profile: &MasterProfile) -> Result<()> {
        let mut docs = self.docs.write().await;
        let slot = docs
            .get_mut(id)
            .ok_or_else(|| BookingError::NotFound(format!("master '{id}'")))?;
        *slot = ProfileDocument::from(profile);
        Ok(())
    }

    async fn search_by_phone(&self, fragment: &str) -> Result<Vec<(String, MasterProfile)>> {
        let docs = self.docs.read().await;
        docs.iter()
            .filter(|(_, doc)| doc.phone_number.contains(fragment))
            .map(|(id, doc)| Ok((id.clone(), MasterProfile::try_from(doc.clone())?)))
            .collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

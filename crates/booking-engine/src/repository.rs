//! Storage contracts the engine calls.
//!
//! The engine never talks to a concrete database. Everything it needs from the
//! backing store goes through these traits, and every call may fail. No
//! ordering is guaranteed between calls issued by different sessions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::event::EventRecord;
use crate::profile::MasterProfile;

/// CRUD plus query-by-owner over stored events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// All events whose `owner_id` equals `owner_id`.
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<EventRecord>>;

    /// Store a new event for `owner_id` and return its assigned id.
    async fn create(&self, record: &EventRecord, owner_id: &str) -> Result<String>;

    /// Overwrite the stored event `id`.
    async fn update(&self, id: &str, record: &EventRecord, owner_id: &str) -> Result<()>;

    /// Remove the event `id`. Deletion is final.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Lookup and maintenance of master profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<MasterProfile>>;

    async fn create(&self, profile: &MasterProfile) -> Result<String>;

    async fn update(&self, id: &str, profile: &MasterProfile) -> Result<()>;

    /// Profiles whose phone number contains `fragment`, with their ids.
    async fn search_by_phone(&self, fragment: &str) -> Result<Vec<(String, MasterProfile)>>;
}

#[async_trait]
impl<T: EventRepository + ?Sized> EventRepository for Arc<T> {
    async fn query_by_owner(&self, owner_id: &str) -> Result<Vec<EventRecord>> {
        (**self).query_by_owner(owner_id).await
    }

    async fn create(&self, record: &EventRecord, owner_id: &str) -> Result<String> {
        (**self).create(record, owner_id).await
    }

    async fn update(&self, id: &str, record: &EventRecord, owner_id: &str) -> Result<()> {
        (**self).update(id, record, owner_id).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<T: ProfileRepository + ?Sized> ProfileRepository for Arc<T> {
    async fn get(&self, id: &str) -> Result<Option<MasterProfile>> {
        (**self).get(id).await
    }

    async fn create(&self, profile: &MasterProfile) -> Result<String> {
        (**self).create(profile).await
    }

    async fn update(&self, id: &str, profile: &MasterProfile) -> Result<()> {
        (**self).update(id, profile).await
    }

    async fn search_by_phone(&self, fragment: &str) -> Result<Vec<(String, MasterProfile)>> {
        (**self).search_by_phone(fragment).await
    }
}

//! Master profiles: registration, editing and lookup by phone.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{BookingError, Result};
use crate::repository::ProfileRepository;
use crate::schedule::ScheduleProfile;

/// A service provider whose calendar clients can book into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterProfile {
    pub username: String,
    pub phone: String,
    #[serde(flatten)]
    pub schedule: ScheduleProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_duration_minutes: Option<u32>,
}

impl MasterProfile {
    /// A fresh registration carrying the configured default schedule.
    pub fn with_defaults(
        config: &EngineConfig,
        username: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            phone: phone.into(),
            schedule: config.default_schedule(),
            created_at: None,
            service_duration_minutes: None,
        }
    }

    /// Check the fields required to save a profile.
    ///
    /// # Errors
    ///
    /// [`BookingError::Validation`] for a blank username or phone,
    /// [`BookingError::ProfileParse`] for unusable working hours.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(BookingError::Validation("username is required".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(BookingError::Validation("phone is required".to_string()));
        }
        self.schedule.working_window()?;
        Ok(())
    }
}

// ── Stored document ─────────────────────────────────────────────────────────

/// The shape a profile takes in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub username: String,
    pub phone_number: String,
    #[serde(default)]
    pub work_schedule: Vec<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub service_duration: Option<u32>,
}

impl From<&MasterProfile> for ProfileDocument {
    fn from(profile: &MasterProfile) -> Self {
        Self {
            username: profile.username.clone(),
            phone_number: profile.phone.clone(),
            work_schedule: profile.schedule.working_day_tokens(),
            start_time: profile.schedule.start_time.clone(),
            end_time: profile.schedule.end_time.clone(),
            created_at: profile.created_at,
            service_duration: profile.service_duration_minutes,
        }
    }
}

impl TryFrom<ProfileDocument> for MasterProfile {
    type Error = BookingError;

    fn try_from(doc: ProfileDocument) -> Result<Self> {
        let schedule =
            ScheduleProfile::from_tokens(&doc.work_schedule, doc.start_time, doc.end_time)?;
        Ok(Self {
            username: doc.username,
            phone: doc.phone_number,
            schedule,
            created_at: doc.created_at,
            service_duration_minutes: doc.service_duration,
        })
    }
}

// ── Operations ──────────────────────────────────────────────────────────────

/// Validate and store a new master, stamping `created_at` with `now`.
///
/// # Errors
///
/// Validation errors as for [`MasterProfile::validate`]; repository errors
/// are passed through.
pub async fn register_master<R: ProfileRepository + ?Sized>(
    repo: &R,
    mut profile: MasterProfile,
    now: NaiveDateTime,
) -> Result<String> {
    profile.validate()?;
    profile.created_at = Some(now);

    let id = repo.create(&profile).await.inspect_err(|e| {
        tracing::error!(error = %e, username = %profile.username, "master registration failed");
    })?;
    tracing::info!(master_id = %id, "master registered");
    Ok(id)
}

/// Replace an existing master's editable fields.
///
/// `created_at` always keeps the stored value.
///
/// # Errors
///
/// [`BookingError::NotFound`] if `id` is unknown, plus the validation and
/// repository errors of [`register_master`].
pub async fn update_master<R: ProfileRepository + ?Sized>(
    repo: &R,
    id: &str,
    mut profile: MasterProfile,
) -> Result<()> {
    profile.validate()?;

    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("master '{id}'")))?;
    profile.created_at = existing.created_at;

    repo.update(id, &profile).await.inspect_err(|e| {
        tracing::error!(error = %e, master_id = %id, "master update failed");
    })?;
    tracing::info!(master_id = %id, "master profile updated");
    Ok(())
}

/// Masters whose phone number contains `fragment`. An empty fragment lists
/// everyone.
pub async fn find_masters<R: ProfileRepository + ?Sized>(
    repo: &R,
    fragment: &str,
) -> Result<Vec<(String, MasterProfile)>> {
    repo.search_by_phone(fragment.trim()).await
}

// ── Tests ───────────────────────────────────────────────────────────────────

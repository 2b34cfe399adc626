use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::status::StatusRef;

/// The action an audit entry records.
#[derive(
    serde::Serialize,
    serde::Deserialize,
    Eq,
    PartialEq,
    Debug,
    Clone,
    Copy,
    utoipa::ToSchema,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// The observation was created.
    Created,
    /// The lifecycle status changed.
    StatusChanged,
    /// A file was attached.
    AttachmentAdded,
    /// A file was removed. The matching `AttachmentAdded` entry stays.
    AttachmentRemoved,
}

/// One immutable fact about an observation's history. Entries are only ever
/// appended; nothing updates or deletes them.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct AuditEntry {
    /// The entry's id.
    pub id: Uuid,
    /// The observation the entry belongs to.
    pub observation_id: Uuid,
    /// Who performed the action.
    pub actor_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Free-text note accompanying the action.
    pub comment: Option<String>,
    /// Status before the change; only set for [`AuditAction::StatusChanged`].
    pub previous_status: Option<StatusRef>,
    /// Status after the change; only set for [`AuditAction::StatusChanged`].
    pub new_status: Option<StatusRef>,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// A new entry for `action` with the given comment, stamped now.
    pub fn new(
        observation_id: Uuid,
        actor_id: Uuid,
        action: AuditAction,
        comment: Option<String>,
    ) -> Self {
        AuditEntry {
            id: Uuid::new_v4(),
            observation_id,
            actor_id,
            action,
            comment,
            previous_status: None,
            new_status: None,
            created_at: Utc::now(),
        }
    }

    /// A `StatusChanged` entry carrying the before/after pair.
    pub fn status_changed(
        observation_id: Uuid,
        actor_id: Uuid,
        previous: StatusRef,
        new: StatusRef,
        comment: Option<String>,
    ) -> Self {
        AuditEntry {
            previous_status: Some(previous),
            new_status: Some(new),
            ..AuditEntry::new(observation_id, actor_id, AuditAction::StatusChanged, comment)
        }
    }
}

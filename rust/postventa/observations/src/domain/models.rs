use models_observations::{AttachmentRecord, Category, Observation, Priority};
use thiserror::Error;
use uuid::Uuid;

/// Input for reporting a new observation.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct NewObservation {
    /// The dwelling the defect was found in.
    pub dwelling_id: Uuid,
    /// The dwelling's project. A mismatch with the dwelling's own project
    /// is a validation error.
    pub project_id: Uuid,
    /// Room within the dwelling, optional.
    pub room_id: Option<Uuid>,
    /// The affected element, free text.
    pub element: String,
    /// Defect category.
    pub category: Category,
    /// Description of the defect.
    pub description: String,
    /// Urgency flag; synchronized with `priority` before persisting.
    #[serde(default)]
    pub is_urgent: bool,
    /// Priority; synchronized with `is_urgent` before persisting.
    pub priority: Priority,
}

/// One file in an attachment submission batch, already read into memory.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    /// Filename as uploaded.
    pub original_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Filters for the observation list. All present filters are AND-combined.
#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
pub struct ObservationFilters {
    /// Limit to one project.
    pub project_id: Option<Uuid>,
    /// Substring match on the dwelling code.
    pub dwelling_code: Option<String>,
    /// Limit to one catalog status.
    pub status_id: Option<Uuid>,
    /// Limit to one category.
    pub category: Option<Category>,
    /// Case-insensitive substring match over element, description and room
    /// name.
    pub free_text: Option<String>,
}

/// Outcome of one attachment submission batch.
///
/// A batch over the size cap is rejected whole (`rejected_reason` set,
/// nothing accepted). Within budget, files ingest independently: a per-file
/// storage fault lands in `skipped` without affecting the rest.
#[derive(Debug, Default, serde::Serialize, utoipa::ToSchema)]
pub struct AttachmentIngest {
    /// Records created for the files that stored successfully.
    pub accepted: Vec<AttachmentRecord>,
    /// Files skipped by a per-file fault, with the reason.
    pub skipped: Vec<SkippedAttachment>,
    /// Set when the whole batch was rejected, naming the total size.
    pub rejected_reason: Option<String>,
}

/// A file from an otherwise-valid batch that could not be stored.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct SkippedAttachment {
    /// Filename as uploaded.
    pub original_name: String,
    /// Why it was skipped.
    pub reason: String,
}

/// A freshly created observation together with its attachment outcome.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct CreatedObservation {
    /// The persisted observation.
    pub observation: Observation,
    /// What happened to the files submitted with it.
    pub attachments: AttachmentIngest,
}

/// Errors surfaced by the observation service.
#[derive(Debug, Error)]
pub enum ObservationErr {
    /// Bad input shape; nothing was persisted.
    #[error("{0}")]
    Validation(String),
    /// The actor lacks the required capability; nothing was persisted.
    #[error("permission denied")]
    PermissionDenied,
    /// The system is missing required master data (e.g. an empty status
    /// catalog); blocks only the specific attempt.
    #[error("{0}")]
    Configuration(String),
    /// A referenced entity does not exist.
    #[error("not found")]
    NotFound,
    /// The storage layer failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

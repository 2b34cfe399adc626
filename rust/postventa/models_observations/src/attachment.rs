use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum total byte size of one attachment submission batch. A batch over
/// this limit is rejected whole; nothing from it is ingested.
pub const MAX_ATTACHMENT_BATCH_BYTES: i64 = 10 * 1024 * 1024;

/// One uploaded file tied to an observation. Created on successful
/// validation, never mutated afterwards; removal is a separate audited
/// action.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct AttachmentRecord {
    /// The attachment's id.
    pub id: Uuid,
    /// The owning observation.
    pub observation_id: Uuid,
    /// Opaque reference into the storage backend.
    pub content_ref: String,
    /// Filename as uploaded.
    pub original_name: String,
    /// Who uploaded it.
    pub uploaded_by: Uuid,
    /// When it was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Byte size of the stored file.
    pub size_bytes: i64,
}

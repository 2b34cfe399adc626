#![deny(missing_docs)]
//! Models for post-sale housing defect reports ("observations"): the report
//! itself, its attachments, its audit trail and the on-time/late
//! classification reporting reads from them.

mod attachment;
mod audit;
mod compliance;
mod observation;
pub mod status;

pub use attachment::{AttachmentRecord, MAX_ATTACHMENT_BATCH_BYTES};
pub use audit::{AuditAction, AuditEntry};
pub use compliance::{Compliance, ComplianceSummary, compliance_summary};
pub use observation::{Category, Observation, Priority};
pub use status::StatusRef;

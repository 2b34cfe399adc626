use model_actor::Actor;
use models_housing::{Dwelling, ObservationStatus, Project};
use models_observations::{AttachmentRecord, AuditEntry, ComplianceSummary, Observation};
use sla_config::SlaConfig;
use uuid::Uuid;

use crate::domain::models::{
    AttachmentIngest, CreatedObservation, NewAttachment, NewObservation, ObservationErr,
    ObservationFilters,
};

/// Storage port for observations and everything they own, plus the
/// read-only master-data lookups the engine needs.
///
/// The `*_with_audit` methods are the transactional boundary: the entity
/// write and its audit entry commit together or not at all.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait ObservationRepo: Send + Sync + 'static {
    /// Storage error type.
    type Err: Send;

    fn observation_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Observation>, Self::Err>> + Send;

    /// Active observations matching the AND-combined filters, newest first.
    fn list_observations(
        &self,
        filters: ObservationFilters,
    ) -> impl Future<Output = Result<Vec<Observation>, Self::Err>> + Send;

    fn dwelling_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Dwelling>, Self::Err>> + Send;

    fn dwellings_by_ids(
        &self,
        ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<Vec<Dwelling>, Self::Err>> + Send;

    fn project_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Project>, Self::Err>> + Send;

    fn projects_by_ids(
        &self,
        ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<Vec<Project>, Self::Err>> + Send;

    fn status_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<ObservationStatus>, Self::Err>> + Send;

    /// The status new observations start in: the well-known code-1 entry,
    /// or the first active entry when that code is absent. `None` only when
    /// the catalog is empty.
    fn initial_status(
        &self,
    ) -> impl Future<Output = Result<Option<ObservationStatus>, Self::Err>> + Send;

    fn insert_observation_with_audit(
        &self,
        observation: Observation,
        audit: AuditEntry,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;

    fn update_status_with_audit(
        &self,
        observation: Observation,
        audit: AuditEntry,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;

    fn insert_attachment_with_audit(
        &self,
        record: AttachmentRecord,
        audit: AuditEntry,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;

    fn delete_attachment_with_audit(
        &self,
        attachment_id: Uuid,
        audit: AuditEntry,
    ) -> impl Future<Output = Result<(), Self::Err>> + Send;

    fn attachment_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<AttachmentRecord>, Self::Err>> + Send;

    /// Audit entries for one observation, oldest first.
    fn audit_trail(
        &self,
        observation_id: Uuid,
    ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Err>> + Send;
}

/// Storage port for the singleton SLA configuration record.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait SlaConfigRepo: Send + Sync + 'static {
    /// Storage error type.
    type Err: Send;

    /// The live record, creating the default one when none exists yet.
    fn get_or_default(&self) -> impl Future<Output = Result<SlaConfig, Self::Err>> + Send;

    fn update(&self, config: SlaConfig) -> impl Future<Output = Result<SlaConfig, Self::Err>> + Send;
}

/// Storage backend for attachment bytes. Where the bytes land is opaque to
/// the engine; a failure here rejects only the file it happened on.
#[cfg_attr(test, mockall::automock(type Err = anyhow::Error;))]
pub trait FileStore: Send + Sync + 'static {
    /// Storage error type.
    type Err: Send;

    /// Stores the file and returns an opaque content reference.
    fn store(
        &self,
        name: String,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<String, Self::Err>> + Send;

    fn delete(&self, content_ref: String) -> impl Future<Output = Result<(), Self::Err>> + Send;
}

/// The operations the web layer invokes.
pub trait ObservationService: Send + Sync + 'static {
    fn create_observation(
        &self,
        actor: Actor,
        input: NewObservation,
        files: Vec<NewAttachment>,
    ) -> impl Future<Output = Result<CreatedObservation, ObservationErr>> + Send;

    fn change_status(
        &self,
        actor: Actor,
        observation_id: Uuid,
        new_status_id: Uuid,
        comment: Option<String>,
    ) -> impl Future<Output = Result<Observation, ObservationErr>> + Send;

    fn list_observations(
        &self,
        actor: Actor,
        filters: ObservationFilters,
    ) -> impl Future<Output = Result<Vec<Observation>, ObservationErr>> + Send;

    fn get_observation(
        &self,
        actor: Actor,
        observation_id: Uuid,
    ) -> impl Future<Output = Result<Observation, ObservationErr>> + Send;

    fn attach_files(
        &self,
        actor: Actor,
        observation_id: Uuid,
        files: Vec<NewAttachment>,
    ) -> impl Future<Output = Result<AttachmentIngest, ObservationErr>> + Send;

    fn remove_attachment(
        &self,
        actor: Actor,
        attachment_id: Uuid,
    ) -> impl Future<Output = Result<(), ObservationErr>> + Send;

    fn audit_trail(
        &self,
        actor: Actor,
        observation_id: Uuid,
    ) -> impl Future<Output = Result<Vec<AuditEntry>, ObservationErr>> + Send;

    fn get_config(&self) -> impl Future<Output = Result<SlaConfig, ObservationErr>> + Send;

    fn set_config(
        &self,
        actor: Actor,
        normal_days: u32,
        urgent_hours: u32,
    ) -> impl Future<Output = Result<SlaConfig, ObservationErr>> + Send;

    /// On-time/late tally over the observations the actor may see,
    /// recomputed on read.
    fn compliance_summary(
        &self,
        actor: Actor,
        filters: ObservationFilters,
    ) -> impl Future<Output = Result<ComplianceSummary, ObservationErr>> + Send;
}

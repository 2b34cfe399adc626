use std::collections::HashMap;

use chrono::Utc;
use model_actor::{Actor, Role};
use models_housing::{Dwelling, Project};
use models_observations::{
    AttachmentRecord, AuditAction, AuditEntry, ComplianceSummary, MAX_ATTACHMENT_BATCH_BYTES,
    Observation, StatusRef, compliance_summary, status,
};
use sla_config::SlaConfig;
use uuid::Uuid;

use crate::domain::{
    models::{
        AttachmentIngest, CreatedObservation, NewAttachment, NewObservation, ObservationErr,
        ObservationFilters, SkippedAttachment,
    },
    ports::{FileStore, ObservationRepo, ObservationService, SlaConfigRepo},
};


/// The observation lifecycle service, generic over its storage ports so the
/// domain logic tests against mocks.
pub struct ObservationServiceImpl<R, C, F> {
    /// Observation, audit and master-data storage.
    repo: R,
    /// The SLA configuration record.
    sla: C,
    /// Attachment byte storage.
    files: F,
}

impl<R, C, F> ObservationServiceImpl<R, C, F>
where
    R: ObservationRepo,
    anyhow::Error: From<R::Err>,
    C: SlaConfigRepo,
    anyhow::Error: From<C::Err>,
    F: FileStore,
    F::Err: std::fmt::Display,
{
    pub fn new(repo: R, sla: C, files: F) -> Self {
        ObservationServiceImpl { repo, sla, files }
    }

    async fn load_dwelling(&self, id: Uuid) -> Result<Dwelling, ObservationErr> {
        self.repo
            .dwelling_by_id(id)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(ObservationErr::NotFound)
    }

    async fn load_project(&self, id: Uuid) -> Result<Project, ObservationErr> {
        self.repo
            .project_by_id(id)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(ObservationErr::NotFound)
    }

    async fn load_observation(&self, id: Uuid) -> Result<Observation, ObservationErr> {
        self.repo
            .observation_by_id(id)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(ObservationErr::NotFound)
    }

    /// The current SLA config, degrading to the defaults rather than
    /// blocking the caller when the record cannot be read.
    async fn sla_config_or_default(&self) -> SlaConfig {
        match self.sla.get_or_default().await {
            Ok(config) => config,
            Err(err) => {
                let err = anyhow::Error::from(err);
                tracing::warn!(error = %err, "could not read SLA config, using defaults");
                SlaConfig::default()
            }
        }
    }

    /// Ingests one validated batch of files for an observation the actor
    /// already passed the permission check for.
    async fn ingest_batch(
        &self,
        actor: &Actor,
        observation_id: Uuid,
        files: Vec<NewAttachment>,
    ) -> Result<AttachmentIngest, ObservationErr> {
        let mut outcome = AttachmentIngest::default();
        if files.is_empty() {
            return Ok(outcome);
        }

        let total_bytes: i64 = files.iter().map(|f| f.bytes.len() as i64).sum();
        if total_bytes > MAX_ATTACHMENT_BATCH_BYTES {
            let reason = format!(
                "total attachment size {:.2} MB exceeds the 10 MB batch limit",
                total_bytes as f64 / (1024.0 * 1024.0)
            );
            tracing::warn!(observation_id = %observation_id, %reason, "attachment batch rejected");
            outcome.rejected_reason = Some(reason);
            return Ok(outcome);
        }

        for file in files {
            let size_bytes = file.bytes.len() as i64;
            let content_ref = match self.files.store(file.original_name.clone(), file.bytes).await {
                Ok(content_ref) => content_ref,
                Err(err) => {
                    tracing::warn!(
                        name = %file.original_name,
                        error = %err,
                        "could not store attachment, skipping it"
                    );
                    outcome.skipped.push(SkippedAttachment {
                        original_name: file.original_name,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let record = AttachmentRecord {
                id: Uuid::new_v4(),
                observation_id,
                content_ref,
                original_name: file.original_name.clone(),
                uploaded_by: actor.id,
                uploaded_at: Utc::now(),
                size_bytes,
            };
            let audit = AuditEntry::new(
                observation_id,
                actor.id,
                AuditAction::AttachmentAdded,
                Some(format!("Attached file: {}", record.original_name)),
            );
            match self
                .repo
                .insert_attachment_with_audit(record.clone(), audit)
                .await
            {
                Ok(()) => outcome.accepted.push(record),
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    tracing::warn!(
                        name = %record.original_name,
                        error = %err,
                        "could not record attachment, skipping it"
                    );
                    if let Err(err) = self.files.delete(record.content_ref.clone()).await {
                        tracing::warn!(
                            content_ref = %record.content_ref,
                            error = %err,
                            "orphaned attachment blob left behind"
                        );
                    }
                    outcome.skipped.push(SkippedAttachment {
                        original_name: record.original_name,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Loads the dwelling/project context maps for a set of observations.
    async fn load_context_maps(
        &self,
        observations: &[Observation],
    ) -> Result<(HashMap<Uuid, Dwelling>, HashMap<Uuid, Project>), ObservationErr> {
        let mut dwelling_ids: Vec<Uuid> = observations.iter().map(|o| o.dwelling_id).collect();
        dwelling_ids.sort_unstable();
        dwelling_ids.dedup();
        let mut project_ids: Vec<Uuid> = observations.iter().map(|o| o.project_id).collect();
        project_ids.sort_unstable();
        project_ids.dedup();

        let dwellings = self
            .repo
            .dwellings_by_ids(dwelling_ids)
            .await
            .map_err(anyhow::Error::from)?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        let projects = self
            .repo
            .projects_by_ids(project_ids)
            .await
            .map_err(anyhow::Error::from)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok((dwellings, projects))
    }

    async fn list_visible(
        &self,
        actor: &Actor,
        filters: ObservationFilters,
    ) -> Result<Vec<Observation>, ObservationErr> {
        let observations = self
            .repo
            .list_observations(filters)
            .await
            .map_err(anyhow::Error::from)?;
        let (dwellings, projects) = self.load_context_maps(&observations).await?;
        let visible: Vec<Uuid> =
            permission::filter_by_role(actor, &observations, &dwellings, &projects)
                .into_iter()
                .map(|obs| obs.id)
                .collect();
        Ok(observations
            .into_iter()
            .filter(|obs| visible.contains(&obs.id))
            .collect())
    }

    /// Loads an observation together with its dwelling and project, checking
    /// the actor may see it.
    async fn load_visible_observation(
        &self,
        actor: &Actor,
        observation_id: Uuid,
    ) -> Result<(Observation, Dwelling, Project), ObservationErr> {
        let observation = self.load_observation(observation_id).await?;
        let dwelling = self.load_dwelling(observation.dwelling_id).await?;
        let project = self.load_project(observation.project_id).await?;
        if !permission::can_view(actor, &observation, &dwelling, &project) {
            return Err(ObservationErr::PermissionDenied);
        }
        Ok((observation, dwelling, project))
    }
}

impl<R, C, F> ObservationService for ObservationServiceImpl<R, C, F>
where
    R: ObservationRepo,
    anyhow::Error: From<R::Err>,
    C: SlaConfigRepo,
    anyhow::Error: From<C::Err>,
    F: FileStore,
    F::Err: std::fmt::Display,
{
    async fn create_observation(
        &self,
        actor: Actor,
        input: NewObservation,
        files: Vec<NewAttachment>,
    ) -> Result<CreatedObservation, ObservationErr> {
        if input.element.trim().is_empty() || input.description.trim().is_empty() {
            return Err(ObservationErr::Validation(
                "element and description are required".to_string(),
            ));
        }

        let dwelling = self.load_dwelling(input.dwelling_id).await?;
        if dwelling.project_id != input.project_id {
            return Err(ObservationErr::Validation(
                "dwelling does not belong to the submitted project".to_string(),
            ));
        }
        let project = self.load_project(dwelling.project_id).await?;

        if !permission::can_create(&actor, &dwelling, &project) {
            return Err(ObservationErr::PermissionDenied);
        }

        let initial_status = self
            .repo
            .initial_status()
            .await
            .map_err(anyhow::Error::from)?
            .ok_or_else(|| {
                ObservationErr::Configuration(
                    "no observation statuses are configured; contact an administrator".to_string(),
                )
            })?;

        let now = Utc::now();
        let config = self.sla_config_or_default().await;

        let mut observation = Observation {
            id: Uuid::new_v4(),
            dwelling_id: dwelling.id,
            project_id: project.id,
            room_id: input.room_id,
            element: input.element,
            category: input.category,
            description: input.description,
            is_urgent: input.is_urgent,
            priority: input.priority,
            status: StatusRef {
                id: initial_status.id,
                name: initial_status.name,
            },
            created_at: now,
            due_date: sla_config::compute_due_date(now.date_naive(), input.is_urgent, &config),
            closed_at: None,
            created_by: actor.id,
            follow_up_notes: String::new(),
            active: true,
        };
        observation.sync_priority();
        // an urgent priority may have flipped the flag after the first pass
        observation.due_date =
            sla_config::compute_due_date(now.date_naive(), observation.is_urgent, &config);

        let audit = AuditEntry::new(
            observation.id,
            actor.id,
            AuditAction::Created,
            Some("Observation created".to_string()),
        );
        self.repo
            .insert_observation_with_audit(observation.clone(), audit)
            .await
            .map_err(anyhow::Error::from)?;
        tracing::info!(observation_id = %observation.id, urgent = observation.is_urgent, "observation created");

        // attachment faults never roll the creation back
        let attachments = self.ingest_batch(&actor, observation.id, files).await?;

        Ok(CreatedObservation {
            observation,
            attachments,
        })
    }

    async fn change_status(
        &self,
        actor: Actor,
        observation_id: Uuid,
        new_status_id: Uuid,
        comment: Option<String>,
    ) -> Result<Observation, ObservationErr> {
        let mut observation = self.load_observation(observation_id).await?;
        let project = self.load_project(observation.project_id).await?;
        let new_status = self
            .repo
            .status_by_id(new_status_id)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or_else(|| ObservationErr::Validation("unknown status".to_string()))?;

        if !permission::can_change_status(&actor, &observation, &project) {
            return Err(ObservationErr::PermissionDenied);
        }
        if !status::allowed_transition(&observation.status.name, &new_status.name) {
            return Err(ObservationErr::Validation(format!(
                "cannot move an observation from {} to {}",
                observation.status.name, new_status.name
            )));
        }
        if !permission::can_transition(&actor, &observation, &project, &new_status.name) {
            return Err(ObservationErr::PermissionDenied);
        }

        let previous = observation.status.clone();
        observation.status = StatusRef {
            id: new_status.id,
            name: new_status.name,
        };
        // set exactly once: a reopen followed by a second closure keeps the
        // original closing timestamp
        if observation.is_closed() && observation.closed_at.is_none() {
            observation.closed_at = Some(Utc::now());
        }

        let audit = AuditEntry::status_changed(
            observation.id,
            actor.id,
            previous,
            observation.status.clone(),
            comment,
        );
        self.repo
            .update_status_with_audit(observation.clone(), audit)
            .await
            .map_err(anyhow::Error::from)?;
        tracing::info!(
            observation_id = %observation.id,
            status = %observation.status.name,
            "observation status changed"
        );
        Ok(observation)
    }

    async fn list_observations(
        &self,
        actor: Actor,
        filters: ObservationFilters,
    ) -> Result<Vec<Observation>, ObservationErr> {
        self.list_visible(&actor, filters).await
    }

    async fn get_observation(
        &self,
        actor: Actor,
        observation_id: Uuid,
    ) -> Result<Observation, ObservationErr> {
        let (observation, _, _) = self.load_visible_observation(&actor, observation_id).await?;
        Ok(observation)
    }

    async fn attach_files(
        &self,
        actor: Actor,
        observation_id: Uuid,
        files: Vec<NewAttachment>,
    ) -> Result<AttachmentIngest, ObservationErr> {
        let observation = self.load_observation(observation_id).await?;
        let dwelling = self.load_dwelling(observation.dwelling_id).await?;
        let project = self.load_project(observation.project_id).await?;
        if !permission::can_attach(&actor, &observation, &dwelling, &project) {
            return Err(ObservationErr::PermissionDenied);
        }
        self.ingest_batch(&actor, observation.id, files).await
    }

    async fn remove_attachment(
        &self,
        actor: Actor,
        attachment_id: Uuid,
    ) -> Result<(), ObservationErr> {
        let record = self
            .repo
            .attachment_by_id(attachment_id)
            .await
            .map_err(anyhow::Error::from)?
            .ok_or(ObservationErr::NotFound)?;
        if !permission::can_remove_attachment(&actor, &record) {
            return Err(ObservationErr::PermissionDenied);
        }

        let audit = AuditEntry::new(
            record.observation_id,
            actor.id,
            AuditAction::AttachmentRemoved,
            Some(format!("Removed file: {}", record.original_name)),
        );
        self.repo
            .delete_attachment_with_audit(record.id, audit)
            .await
            .map_err(anyhow::Error::from)?;

        if let Err(err) = self.files.delete(record.content_ref.clone()).await {
            tracing::warn!(
                content_ref = %record.content_ref,
                error = %err,
                "attachment record removed but blob deletion failed"
            );
        }
        Ok(())
    }

    async fn audit_trail(
        &self,
        actor: Actor,
        observation_id: Uuid,
    ) -> Result<Vec<AuditEntry>, ObservationErr> {
        self.load_visible_observation(&actor, observation_id).await?;
        Ok(self
            .repo
            .audit_trail(observation_id)
            .await
            .map_err(anyhow::Error::from)?)
    }

    async fn get_config(&self) -> Result<SlaConfig, ObservationErr> {
        Ok(self
            .sla
            .get_or_default()
            .await
            .map_err(anyhow::Error::from)?)
    }

    async fn set_config(
        &self,
        actor: Actor,
        normal_days: u32,
        urgent_hours: u32,
    ) -> Result<SlaConfig, ObservationErr> {
        if actor.role != Role::Administrator {
            return Err(ObservationErr::PermissionDenied);
        }
        let config = SlaConfig::validated(normal_days, urgent_hours, actor.id)
            .map_err(|err| ObservationErr::Validation(err.to_string()))?;
        Ok(self
            .sla
            .update(config)
            .await
            .map_err(anyhow::Error::from)?)
    }

    async fn compliance_summary(
        &self,
        actor: Actor,
        filters: ObservationFilters,
    ) -> Result<ComplianceSummary, ObservationErr> {
        let visible = self.list_visible(&actor, filters).await?;
        Ok(compliance_summary(&visible, Utc::now().date_naive()))
    }
}

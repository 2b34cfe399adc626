use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use models_housing::{Dwelling, ObservationStatus, Project};
use models_observations::{
    AttachmentRecord, AuditAction, AuditEntry, Category, Observation, Priority, StatusRef,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{models::ObservationFilters, ports::ObservationRepo};

/// Postgres-backed observation storage.
#[derive(Debug, Clone)]
pub struct ObservationPgRepo {
    pool: PgPool,
}

impl ObservationPgRepo {
    pub fn new(pool: PgPool) -> Self {
        ObservationPgRepo { pool }
    }
}

/// Observation row with the status name joined in. Category and priority are
/// stored as text and parsed on the way out.
#[derive(sqlx::FromRow)]
struct ObservationRow {
    id: Uuid,
    dwelling_id: Uuid,
    project_id: Uuid,
    room_id: Option<Uuid>,
    element: String,
    category: String,
    description: String,
    is_urgent: bool,
    priority: String,
    status_id: Uuid,
    status_name: String,
    created_at: DateTime<Utc>,
    due_date: NaiveDate,
    closed_at: Option<DateTime<Utc>>,
    created_by: Uuid,
    follow_up_notes: String,
    active: bool,
}

impl TryFrom<ObservationRow> for Observation {
    type Error = anyhow::Error;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        Ok(Observation {
            id: row.id,
            dwelling_id: row.dwelling_id,
            project_id: row.project_id,
            room_id: row.room_id,
            element: row.element,
            category: Category::from_str(&row.category)
                .with_context(|| format!("bad category in row {}: {}", row.id, row.category))?,
            description: row.description,
            is_urgent: row.is_urgent,
            priority: Priority::from_str(&row.priority)
                .with_context(|| format!("bad priority in row {}: {}", row.id, row.priority))?,
            status: StatusRef {
                id: row.status_id,
                name: row.status_name,
            },
            created_at: row.created_at,
            due_date: row.due_date,
            closed_at: row.closed_at,
            created_by: row.created_by,
            follow_up_notes: row.follow_up_notes,
            active: row.active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: Uuid,
    observation_id: Uuid,
    content_ref: String,
    original_name: String,
    uploaded_by: Uuid,
    uploaded_at: DateTime<Utc>,
    size_bytes: i64,
}

impl From<AttachmentRow> for AttachmentRecord {
    fn from(row: AttachmentRow) -> Self {
        AttachmentRecord {
            id: row.id,
            observation_id: row.observation_id,
            content_ref: row.content_ref,
            original_name: row.original_name,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
            size_bytes: row.size_bytes,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    observation_id: Uuid,
    actor_id: Uuid,
    action: String,
    comment: Option<String>,
    previous_status_id: Option<Uuid>,
    previous_status_name: Option<String>,
    new_status_id: Option<Uuid>,
    new_status_name: Option<String>,
    created_at: DateTime<Utc>,
}

fn status_ref(id: Option<Uuid>, name: Option<String>) -> Option<StatusRef> {
    Some(StatusRef {
        id: id?,
        name: name?,
    })
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = anyhow::Error;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: row.id,
            observation_id: row.observation_id,
            actor_id: row.actor_id,
            action: AuditAction::from_str(&row.action)
                .with_context(|| format!("bad audit action in row {}: {}", row.id, row.action))?,
            comment: row.comment,
            previous_status: status_ref(row.previous_status_id, row.previous_status_name),
            new_status: status_ref(row.new_status_id, row.new_status_name),
            created_at: row.created_at,
        })
    }
}

const SELECT_OBSERVATION: &str = "\
    SELECT o.id, o.dwelling_id, o.project_id, o.room_id, o.element, o.category, \
           o.description, o.is_urgent, o.priority, o.status_id, s.name AS status_name, \
           o.created_at, o.due_date, o.closed_at, o.created_by, o.follow_up_notes, o.active \
    FROM observations o \
    JOIN observation_statuses s ON s.id = o.status_id";

async fn insert_audit(
    tx: &mut Transaction<'_, Postgres>,
    entry: &AuditEntry,
) -> Result<(), anyhow::Error> {
    sqlx::query(
        "INSERT INTO observation_audit \
         (id, observation_id, actor_id, action, comment, \
          previous_status_id, previous_status_name, new_status_id, new_status_name, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(entry.id)
    .bind(entry.observation_id)
    .bind(entry.actor_id)
    .bind(entry.action.to_string())
    .bind(&entry.comment)
    .bind(entry.previous_status.as_ref().map(|s| s.id))
    .bind(entry.previous_status.as_ref().map(|s| s.name.as_str()))
    .bind(entry.new_status.as_ref().map(|s| s.id))
    .bind(entry.new_status.as_ref().map(|s| s.name.as_str()))
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .context("inserting audit entry")?;
    Ok(())
}

impl ObservationRepo for ObservationPgRepo {
    type Err = anyhow::Error;

    async fn observation_by_id(&self, id: Uuid) -> Result<Option<Observation>, Self::Err> {
        let row = sqlx::query_as::<_, ObservationRow>(&format!(
            "{SELECT_OBSERVATION} WHERE o.id = $1 AND o.active"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading observation")?;
        row.map(Observation::try_from).transpose()
    }

    async fn list_observations(
        &self,
        filters: ObservationFilters,
    ) -> Result<Vec<Observation>, Self::Err> {
        let rows = sqlx::query_as::<_, ObservationRow>(&format!(
            "{SELECT_OBSERVATION} \
             JOIN dwellings d ON d.id = o.dwelling_id \
             LEFT JOIN rooms r ON r.id = o.room_id \
             WHERE o.active \
               AND ($1::uuid IS NULL OR o.project_id = $1) \
               AND ($2::text IS NULL OR d.code ILIKE '%' || $2 || '%') \
               AND ($3::uuid IS NULL OR o.status_id = $3) \
               AND ($4::text IS NULL OR o.category = $4) \
               AND ($5::text IS NULL \
                    OR o.element ILIKE '%' || $5 || '%' \
                    OR o.description ILIKE '%' || $5 || '%' \
                    OR r.name ILIKE '%' || $5 || '%') \
             ORDER BY o.created_at DESC"
        ))
        .bind(filters.project_id)
        .bind(filters.dwelling_code)
        .bind(filters.status_id)
        .bind(filters.category.map(|c| c.to_string()))
        .bind(filters.free_text)
        .fetch_all(&self.pool)
        .await
        .context("listing observations")?;
        rows.into_iter().map(Observation::try_from).collect()
    }

    async fn dwelling_by_id(&self, id: Uuid) -> Result<Option<Dwelling>, Self::Err> {
        Ok(sqlx::query_as::<_, Dwelling>(
            "SELECT id, project_id, code, family_name, beneficiary_national_id, \
                    beneficiary_name, active \
             FROM dwellings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading dwelling")?)
    }

    async fn dwellings_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Dwelling>, Self::Err> {
        Ok(sqlx::query_as::<_, Dwelling>(
            "SELECT id, project_id, code, family_name, beneficiary_national_id, \
                    beneficiary_name, active \
             FROM dwellings WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("loading dwellings")?)
    }

    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, Self::Err> {
        Ok(sqlx::query_as::<_, Project>(
            "SELECT id, code, name, constructor, region_id, active \
             FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading project")?)
    }

    async fn projects_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<Project>, Self::Err> {
        Ok(sqlx::query_as::<_, Project>(
            "SELECT id, code, name, constructor, region_id, active \
             FROM projects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("loading projects")?)
    }

    async fn status_by_id(&self, id: Uuid) -> Result<Option<ObservationStatus>, Self::Err> {
        Ok(sqlx::query_as::<_, ObservationStatus>(
            "SELECT id, code, name, active FROM observation_statuses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading status")?)
    }

    async fn initial_status(&self) -> Result<Option<ObservationStatus>, Self::Err> {
        // the well-known code-1 entry wins; any other active entry is the
        // fallback when the catalog was seeded without it
        Ok(sqlx::query_as::<_, ObservationStatus>(
            "SELECT id, code, name, active FROM observation_statuses \
             WHERE active ORDER BY (code = 1) DESC, code ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("loading initial status")?)
    }

    async fn insert_observation_with_audit(
        &self,
        observation: Observation,
        audit: AuditEntry,
    ) -> Result<(), Self::Err> {
        let mut tx = self.pool.begin().await.context("opening transaction")?;
        sqlx::query(
            "INSERT INTO observations \
             (id, dwelling_id, project_id, room_id, element, category, description, \
              is_urgent, priority, status_id, created_at, due_date, closed_at, \
              created_by, follow_up_notes, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(observation.id)
        .bind(observation.dwelling_id)
        .bind(observation.project_id)
        .bind(observation.room_id)
        .bind(&observation.element)
        .bind(observation.category.to_string())
        .bind(&observation.description)
        .bind(observation.is_urgent)
        .bind(observation.priority.to_string())
        .bind(observation.status.id)
        .bind(observation.created_at)
        .bind(observation.due_date)
        .bind(observation.closed_at)
        .bind(observation.created_by)
        .bind(&observation.follow_up_notes)
        .bind(observation.active)
        .execute(&mut *tx)
        .await
        .context("inserting observation")?;
        insert_audit(&mut tx, &audit).await?;
        tx.commit().await.context("committing observation insert")
    }

    async fn update_status_with_audit(
        &self,
        observation: Observation,
        audit: AuditEntry,
    ) -> Result<(), Self::Err> {
        let mut tx = self.pool.begin().await.context("opening transaction")?;
        sqlx::query(
            "UPDATE observations SET status_id = $2, closed_at = $3 WHERE id = $1",
        )
        .bind(observation.id)
        .bind(observation.status.id)
        .bind(observation.closed_at)
        .execute(&mut *tx)
        .await
        .context("updating observation status")?;
        insert_audit(&mut tx, &audit).await?;
        tx.commit().await.context("committing status update")
    }

    async fn insert_attachment_with_audit(
        &self,
        record: AttachmentRecord,
        audit: AuditEntry,
    ) -> Result<(), Self::Err> {
        let mut tx = self.pool.begin().await.context("opening transaction")?;
        sqlx::query(
            "INSERT INTO observation_attachments \
             (id, observation_id, content_ref, original_name, uploaded_by, uploaded_at, size_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(record.observation_id)
        .bind(&record.content_ref)
        .bind(&record.original_name)
        .bind(record.uploaded_by)
        .bind(record.uploaded_at)
        .bind(record.size_bytes)
        .execute(&mut *tx)
        .await
        .context("inserting attachment")?;
        insert_audit(&mut tx, &audit).await?;
        tx.commit().await.context("committing attachment insert")
    }

    async fn delete_attachment_with_audit(
        &self,
        attachment_id: Uuid,
        audit: AuditEntry,
    ) -> Result<(), Self::Err> {
        let mut tx = self.pool.begin().await.context("opening transaction")?;
        sqlx::query("DELETE FROM observation_attachments WHERE id = $1")
            .bind(attachment_id)
            .execute(&mut *tx)
            .await
            .context("deleting attachment")?;
        insert_audit(&mut tx, &audit).await?;
        tx.commit().await.context("committing attachment delete")
    }

    async fn attachment_by_id(&self, id: Uuid) -> Result<Option<AttachmentRecord>, Self::Err> {
        let row = sqlx::query_as::<_, AttachmentRow>(
            "SELECT id, observation_id, content_ref, original_name, uploaded_by, \
                    uploaded_at, size_bytes \
             FROM observation_attachments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("loading attachment")?;
        Ok(row.map(AttachmentRecord::from))
    }

    async fn audit_trail(&self, observation_id: Uuid) -> Result<Vec<AuditEntry>, Self::Err> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, observation_id, actor_id, action, comment, \
                    previous_status_id, previous_status_name, new_status_id, new_status_name, \
                    created_at \
             FROM observation_audit WHERE observation_id = $1 ORDER BY created_at ASC",
        )
        .bind(observation_id)
        .fetch_all(&self.pool)
        .await
        .context("loading audit trail")?;
        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}

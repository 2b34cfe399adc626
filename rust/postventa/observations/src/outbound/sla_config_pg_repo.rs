use anyhow::Context;
use sla_config::SlaConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::ports::SlaConfigRepo;

/// Postgres-backed storage for the singleton SLA configuration row.
#[derive(Debug, Clone)]
pub struct SlaConfigPgRepo {
    pool: PgPool,
}

impl SlaConfigPgRepo {
    pub fn new(pool: PgPool) -> Self {
        SlaConfigPgRepo { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SlaConfigRow {
    normal_days: i32,
    urgent_hours: i32,
    updated_by: Option<Uuid>,
}

impl From<SlaConfigRow> for SlaConfig {
    fn from(row: SlaConfigRow) -> Self {
        SlaConfig {
            normal_days: row.normal_days.max(0) as u32,
            urgent_hours: row.urgent_hours.max(0) as u32,
            updated_by: row.updated_by,
        }
    }
}

impl SlaConfigRepo for SlaConfigPgRepo {
    type Err = anyhow::Error;

    async fn get_or_default(&self) -> Result<SlaConfig, Self::Err> {
        let defaults = SlaConfig::default();
        // the singleton column is always true; the conflict path makes the
        // seed idempotent under concurrent first reads
        let row = sqlx::query_as::<_, SlaConfigRow>(
            "INSERT INTO sla_config (singleton, normal_days, urgent_hours, updated_by, updated_at) \
             VALUES (TRUE, $1, $2, NULL, now()) \
             ON CONFLICT (singleton) DO UPDATE SET singleton = TRUE \
             RETURNING normal_days, urgent_hours, updated_by",
        )
        .bind(defaults.normal_days as i32)
        .bind(defaults.urgent_hours as i32)
        .fetch_one(&self.pool)
        .await
        .context("loading SLA config")?;
        Ok(row.into())
    }

    async fn update(&self, config: SlaConfig) -> Result<SlaConfig, Self::Err> {
        let row = sqlx::query_as::<_, SlaConfigRow>(
            "INSERT INTO sla_config (singleton, normal_days, urgent_hours, updated_by, updated_at) \
             VALUES (TRUE, $1, $2, $3, now()) \
             ON CONFLICT (singleton) DO UPDATE \
             SET normal_days = EXCLUDED.normal_days, \
                 urgent_hours = EXCLUDED.urgent_hours, \
                 updated_by = EXCLUDED.updated_by, \
                 updated_at = now() \
             RETURNING normal_days, urgent_hours, updated_by",
        )
        .bind(config.normal_days as i32)
        .bind(config.urgent_hours as i32)
        .bind(config.updated_by)
        .fetch_one(&self.pool)
        .await
        .context("updating SLA config")?;
        Ok(row.into())
    }
}

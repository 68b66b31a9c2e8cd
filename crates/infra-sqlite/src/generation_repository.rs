// SQLite GenerationRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use openreel_core::domain::{
    AspectRatio, GenerationConfig, GenerationId, GenerationJob, JobStatus,
};
use openreel_core::error::{AppError, Result};
use openreel_core::port::GenerationRepository;
use sqlx::SqlitePool;

const FALLBACK_FAILURE_REASON: &str = "Generation failed.";

pub struct SqliteGenerationRepository {
    pool: SqlitePool,
}

impl SqliteGenerationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Flattened status columns: (status, progress, remote_url)
fn status_columns(status: &JobStatus) -> (&'static str, Option<f64>, Option<&str>) {
    match status {
        JobStatus::Queued => (status.label(), None, None),
        JobStatus::Processing { progress } => (status.label(), *progress, None),
        JobStatus::Completed { remote_url } => (status.label(), Some(1.0), Some(remote_url)),
        JobStatus::Failed { .. } => (status.label(), None, None),
    }
}

#[async_trait]
impl GenerationRepository for SqliteGenerationRepository {
    async fn insert(&self, job: &GenerationJob) -> Result<()> {
        let (status, progress, remote_url) = status_columns(&job.status);

        sqlx::query(
            r#"
            INSERT INTO generations (
                id, prompt, aspect_ratio, duration_seconds, provider_id,
                status, progress, remote_url, error_message, created_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.prompt)
        .bind(job.config.aspect_ratio.as_str())
        .bind(i64::from(job.config.duration_seconds))
        .bind(&job.provider_id)
        .bind(status)
        .bind(progress)
        .bind(remote_url)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.finished_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn save(&self, job: &GenerationJob) -> Result<()> {
        let (status, progress, remote_url) = status_columns(&job.status);

        // Snapshot write: creates the row if the initial insert never landed
        sqlx::query(
            r#"
            INSERT INTO generations (
                id, prompt, aspect_ratio, duration_seconds, provider_id,
                status, progress, remote_url, error_message, created_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                progress = excluded.progress,
                remote_url = excluded.remote_url,
                error_message = excluded.error_message,
                finished_at = excluded.finished_at
            "#,
        )
        .bind(&job.id)
        .bind(&job.prompt)
        .bind(job.config.aspect_ratio.as_str())
        .bind(i64::from(job.config.duration_seconds))
        .bind(&job.provider_id)
        .bind(status)
        .bind(progress)
        .bind(remote_url)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.finished_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &GenerationId) -> Result<Option<GenerationJob>> {
        let row = sqlx::query_as::<_, GenerationRow>("SELECT * FROM generations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(GenerationRow::into_job).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<GenerationJob>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<GenerationRow> = sqlx::query_as(
            r#"
            SELECT * FROM generations
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(GenerationRow::into_job).collect()
    }

    async fn delete(&self, id: &GenerationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM generations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct GenerationRow {
    id: String,
    prompt: String,
    aspect_ratio: String,
    duration_seconds: i64,
    provider_id: String,
    status: String,
    progress: Option<f64>,
    remote_url: Option<String>,
    error_message: Option<String>,
    created_at: i64,
    finished_at: Option<i64>,
}

impl GenerationRow {
    fn into_job(self) -> Result<GenerationJob> {
        let aspect_ratio: AspectRatio = self.aspect_ratio.parse().map_err(|e| {
            AppError::Database(format!("Generation {} has bad aspect ratio: {}", self.id, e))
        })?;
        let duration_seconds = u8::try_from(self.duration_seconds).map_err(|_| {
            AppError::Database(format!(
                "Generation {} has bad duration: {}",
                self.id, self.duration_seconds
            ))
        })?;

        let status = match self.status.as_str() {
            "QUEUED" => JobStatus::Queued,
            "PROCESSING" => JobStatus::Processing {
                progress: self.progress,
            },
            "COMPLETED" => JobStatus::Completed {
                remote_url: self.remote_url.ok_or_else(|| {
                    AppError::Database(format!("Generation {} completed without URL", self.id))
                })?,
            },
            "FAILED" => JobStatus::Failed {
                reason: self
                    .error_message
                    .clone()
                    .unwrap_or_else(|| FALLBACK_FAILURE_REASON.to_string()),
            },
            other => {
                return Err(AppError::Database(format!(
                    "Generation {} has unknown status: {}",
                    self.id, other
                )))
            }
        };

        Ok(GenerationJob {
            id: self.id,
            prompt: self.prompt,
            config: GenerationConfig::new(aspect_ratio, duration_seconds),
            provider_id: self.provider_id,
            status,
            created_at: self.created_at,
            finished_at: self.finished_at,
            error_message: self.error_message,
        })
    }
}

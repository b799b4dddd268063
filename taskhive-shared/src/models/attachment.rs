/// Attachment model and database operations
///
/// Attachments record file metadata only; the file bytes live in the storage
/// layer, which is out of scope here. Attachments are owned by exactly one
/// task and cascade with it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     uploaded_by UUID NOT NULL REFERENCES users(id),
///     file_name VARCHAR(500) NOT NULL,
///     file_size BIGINT NOT NULL,
///     content_type VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// File attachment metadata
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// Unique attachment ID
    pub id: Uuid,

    /// Task the attachment belongs to
    pub task_id: Uuid,

    /// Uploading user
    pub uploaded_by: Uuid,

    /// Original file name
    pub file_name: String,

    /// File size in bytes
    pub file_size: i64,

    /// MIME type, if known
    pub content_type: Option<String>,

    /// When the attachment was uploaded
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub task_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: Option<String>,
}

impl Attachment {
    /// Records a new attachment
    pub async fn create(pool: &PgPool, data: CreateAttachment) -> Result<Self, sqlx::Error> {
        let attachment = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO attachments (task_id, uploaded_by, file_name, file_size, content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, task_id, uploaded_by, file_name, file_size, content_type, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.uploaded_by)
        .bind(data.file_name)
        .bind(data.file_size)
        .bind(data.content_type)
        .fetch_one(pool)
        .await?;

        Ok(attachment)
    }

    /// Lists attachments for a task
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, task_id, uploaded_by, file_name, file_size, content_type, created_at
            FROM attachments
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(attachments)
    }

    /// Deletes an attachment record
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

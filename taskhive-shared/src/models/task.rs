/// Task model and database operations
///
/// Tasks are the core entity of Taskhive. A task optionally belongs to a
/// project; a task with no project is a personal task visible only to its
/// creator.
///
/// # Recurrence state machine
///
/// ```text
/// {todo, in_progress} → done → (sweep reset) → in_progress
/// ```
///
/// A completed recurring task is rolled forward by the recurrence worker once
/// its next occurrence date has passed.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID REFERENCES projects(id) ON DELETE CASCADE,
///     creator_id UUID NOT NULL REFERENCES users(id),
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     title VARCHAR(500) NOT NULL,
///     description TEXT,
///     status VARCHAR(100) NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     category VARCHAR(255),
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     due_date TIMESTAMPTZ,
///     is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
///     recurrence_pattern VARCHAR(32),
///     last_completed TIMESTAMPTZ,
///     position BIGINT NOT NULL DEFAULT 0,
///     version INTEGER NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The status column is free-form so boards can define custom columns.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Project this task belongs to (None = personal task)
    pub project_id: Option<Uuid>,

    /// User who created the task
    pub creator_id: Uuid,

    /// User the task is assigned to, if any
    pub assignee_id: Option<Uuid>,

    /// Task title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Board column ("todo", "in_progress", "done", or a custom column)
    pub status: String,

    /// Priority
    pub priority: TaskPriority,

    /// Optional category reference
    pub category: Option<String>,

    /// Tag list
    pub tags: Vec<String>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Whether the task recurs after completion
    pub is_recurring: bool,

    /// Symbolic recurrence interval (daily/weekly/monthly/yearly)
    pub recurrence_pattern: Option<String>,

    /// When the task was last completed (drives the recurrence roll-forward)
    pub last_completed: Option<DateTime<Utc>>,

    /// Ordering key for board position
    pub position: i64,

    /// Advisory version counter, incremented on every update
    pub version: i32,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Project (None = personal task)
    pub project_id: Option<Uuid>,

    /// Creator
    pub creator_id: Uuid,

    /// Assignee, if any
    pub assignee_id: Option<Uuid>,

    /// Title
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// Initial status (defaults to "todo")
    pub status: Option<String>,

    /// Priority (defaults to medium)
    pub priority: Option<TaskPriority>,

    /// Category
    pub category: Option<String>,

    /// Tags
    pub tags: Vec<String>,

    /// Due date
    pub due_date: Option<DateTime<Utc>>,

    /// Recurrence flag
    pub is_recurring: bool,

    /// Recurrence pattern
    pub recurrence_pattern: Option<String>,
}

/// Field-level patch applied to an existing task
///
/// Only non-None fields are written. `assignee_id` and `due_date` use a
/// double Option so a request can explicitly clear them: an absent field is
/// left untouched, an explicit null clears the column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<String>,
    pub position: Option<i64>,
}

/// Marks a field as present even when its value is null
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    /// Whether the patch changes the assignee
    pub fn changes_assignee(&self) -> bool {
        self.assignee_id.is_some()
    }
}

const TASK_COLUMNS: &str = "id, project_id, creator_id, assignee_id, title, description, \
     status, priority, category, tags, due_date, is_recurring, recurrence_pattern, \
     last_completed, position, version, created_at, updated_at";

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if referenced rows are missing or the database
    /// operation fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (project_id, creator_id, assignee_id, title, description,
                               status, priority, category, tags, due_date,
                               is_recurring, recurrence_pattern,
                               position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    COALESCE((SELECT MAX(position) + 1 FROM tasks WHERE project_id IS NOT DISTINCT FROM $1), 0))
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.creator_id)
            .bind(data.assignee_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status.unwrap_or_else(|| "todo".to_string()))
            .bind(data.priority.unwrap_or(TaskPriority::Medium))
            .bind(data.category)
            .bind(data.tags)
            .bind(data.due_date)
            .bind(data.is_recurring)
            .bind(data.recurrence_pattern)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Applies a patch to a task
    ///
    /// Increments the advisory version counter and refreshes `updated_at`.
    /// Setting status to "done" also records `last_completed`.
    pub async fn apply_patch(
        pool: &PgPool,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                category = COALESCE($6, category),
                tags = COALESCE($7, tags),
                assignee_id = CASE WHEN $8 THEN $9 ELSE assignee_id END,
                due_date = CASE WHEN $10 THEN $11 ELSE due_date END,
                is_recurring = COALESCE($12, is_recurring),
                recurrence_pattern = COALESCE($13, recurrence_pattern),
                position = COALESCE($14, position),
                last_completed = CASE WHEN $4 = 'done' THEN NOW() ELSE last_completed END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.status)
            .bind(patch.priority)
            .bind(patch.category)
            .bind(patch.tags)
            .bind(patch.assignee_id.is_some())
            .bind(patch.assignee_id.flatten())
            .bind(patch.due_date.is_some())
            .bind(patch.due_date.flatten())
            .bind(patch.is_recurring)
            .bind(patch.recurrence_pattern)
            .bind(patch.position)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists all tasks in a project
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY position ASC"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists project tasks visible to a member: created by or assigned to them
    pub async fn list_by_project_for_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE project_id = $1 AND (creator_id = $2 OR assignee_id = $2)
            ORDER BY position ASC
            "#
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists a user's personal tasks (no project)
    pub async fn list_personal(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id IS NULL AND creator_id = $1 ORDER BY position ASC"
        );

        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(tasks)
    }

    /// Lists completed recurring tasks for the recurrence sweep
    pub async fn list_recurring_done(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE is_recurring = TRUE AND status = 'done'"
        );

        let tasks = sqlx::query_as::<_, Task>(&query).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Resets a completed recurring task for its next occurrence
    ///
    /// Conditional on the task still being done, so a concurrent user edit
    /// that reopened the task wins over the sweep.
    pub async fn reset_recurring(
        pool: &PgPool,
        id: Uuid,
        next_due: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET status = 'in_progress',
                due_date = $2,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND is_recurring = TRUE AND status = 'done'
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(next_due)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Attachments and comments are removed via CASCADE.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_priority_as_str() {
        assert_eq!(TaskPriority::Low.as_str(), "low");
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
        assert_eq!(TaskPriority::High.as_str(), "high");
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: TaskPatch = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(patch.assignee_id, Some(None));
        assert_eq!(patch.due_date, None);

        let patch: TaskPatch = serde_json::from_str(r#"{"due_date": "2025-06-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(patch.due_date, Some(Some(_))));
    }

    #[test]
    fn test_patch_changes_assignee() {
        let patch = TaskPatch::default();
        assert!(!patch.changes_assignee());

        let patch = TaskPatch {
            assignee_id: Some(None),
            ..Default::default()
        };
        assert!(patch.changes_assignee());

        let patch = TaskPatch {
            assignee_id: Some(Some(Uuid::new_v4())),
            ..Default::default()
        };
        assert!(patch.changes_assignee());
    }
}

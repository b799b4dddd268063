/// Project model and database operations
///
/// A project is owned by exactly one user and carries board-level metadata:
/// color, description, link records, a tag dictionary, and an archived flag.
/// Projects are archived rather than deleted in the common case.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     color VARCHAR(32),
///     archived BOOLEAN NOT NULL DEFAULT FALSE,
///     links JSONB NOT NULL DEFAULT '[]',
///     tags JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Atomicity
///
/// `Project::create` inserts the project row and the owner's membership row
/// in a single transaction: either both exist afterwards or neither does.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::ProjectRole;

/// Project model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Owning user
    pub owner_id: Uuid,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Display color
    pub color: Option<String>,

    /// Archived flag; archived projects are hidden from default listings
    pub archived: bool,

    /// Link records (JSON array of {title, url} objects)
    pub links: JsonValue,

    /// Tag dictionary (JSON object mapping tag name to color)
    pub tags: JsonValue,

    /// When the project was created
    pub created_at: DateTime<Utc>,

    /// When the project was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Owning user (also becomes the first member with the owner role)
    pub owner_id: Uuid,

    /// Project name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional display color
    pub color: Option<String>,
}

/// Input for updating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    /// New name
    pub name: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New color
    pub color: Option<String>,

    /// Replace the link records
    pub links: Option<JsonValue>,

    /// Replace the tag dictionary
    pub tags: Option<JsonValue>,
}

impl Project {
    /// Creates a project together with the owner's membership row
    ///
    /// Both inserts run in one transaction so a project can never exist
    /// without an owner membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the database
    /// operation fails; on failure neither row is persisted.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (owner_id, name, description, color)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, name, description, color, archived,
                      links, tags, created_at, updated_at
            "#,
        )
        .bind(data.owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.color)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project.id)
        .bind(data.owner_id)
        .bind(ProjectRole::Owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, name, description, color, archived,
                   links, tags, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Lists non-archived projects the user is a member of
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.owner_id, p.name, p.description, p.color, p.archived,
                   p.links, p.tags, p.created_at, p.updated_at
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1 AND p.archived = FALSE
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(projects)
    }

    /// Updates project fields; only non-None fields are changed
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                links = COALESCE($5, links),
                tags = COALESCE($6, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, description, color, archived,
                      links, tags, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.color)
        .bind(data.links)
        .bind(data.tags)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Sets the archived flag
    pub async fn set_archived(
        pool: &PgPool,
        id: Uuid,
        archived: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET archived = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, description, color, archived,
                      links, tags, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(archived)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes a project
    ///
    /// Cascades memberships, tasks, and task children via foreign keys.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    // Create/update/archive paths require a database and are covered by
    // integration tests.
}

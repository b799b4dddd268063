/// Project membership model and database operations
///
/// Implements the many-to-many relationship between users and projects with
/// role-based access control.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_role AS ENUM ('owner', 'collaborator', 'member', 'viewer');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role project_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Invariant
///
/// Every project has at least one member with the `owner` role at all times
/// outside a transaction. The guarded operations in this module
/// (`remove_guarded`, `change_role_guarded`, `transfer_ownership`) refuse any
/// change that would leave a project without an owner.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Roles a user can hold within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    /// Full control including delete, archive, and member management
    Owner,

    /// Full task control; cannot delete/archive the project or manage members
    Collaborator,

    /// Can work on own and assigned tasks only
    Member,

    /// Read-only access
    Viewer,
}

impl ProjectRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::Collaborator => "collaborator",
            ProjectRole::Member => "member",
            ProjectRole::Viewer => "viewer",
        }
    }
}

/// Membership row binding a user to a project with a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the project
    pub role: ProjectRole,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    /// Project ID
    pub project_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: ProjectRole,
}

fn default_role() -> ProjectRole {
    ProjectRole::Member
}

/// Outcome of a guarded membership mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOutcome {
    /// The change was applied
    Applied,

    /// The membership row was not found
    NotFound,

    /// The change was rejected because it would remove the last owner
    LastOwner,
}

impl ProjectMember {
    /// Creates a new membership (adds user to project)
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate membership, missing project/user, or
    /// database failure.
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Finds a specific membership by project and user
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Gets a user's role in a project, if any
    pub async fn get_role(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectRole>, sqlx::Error> {
        let role: Option<ProjectRole> = sqlx::query_scalar(
            r#"
            SELECT role FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(role)
    }

    /// Counts members holding the owner role in a project
    pub async fn owner_count(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM project_members WHERE project_id = $1 AND role = 'owner'",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Removes a member, refusing to remove the sole remaining owner
    ///
    /// The owner guard is evaluated inside the DELETE itself so the invariant
    /// holds even under concurrent removals: a row with the owner role is only
    /// deleted when another owner row exists for the same project.
    pub async fn remove_guarded(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<GuardedOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_members
            WHERE project_id = $1 AND user_id = $2
              AND (
                  role <> 'owner'
                  OR EXISTS (
                      SELECT 1 FROM project_members pm
                      WHERE pm.project_id = $1 AND pm.role = 'owner' AND pm.user_id <> $2
                  )
              )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(GuardedOutcome::Applied);
        }

        // Distinguish "not found" from "blocked by the last-owner guard".
        match Self::find(pool, project_id, user_id).await? {
            Some(_) => Ok(GuardedOutcome::LastOwner),
            None => Ok(GuardedOutcome::NotFound),
        }
    }

    /// Changes a member's role, refusing to demote the sole remaining owner
    pub async fn change_role_guarded(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
        new_role: ProjectRole,
    ) -> Result<GuardedOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE project_members
            SET role = $3
            WHERE project_id = $1 AND user_id = $2
              AND (
                  role <> 'owner'
                  OR $3 = 'owner'::project_role
                  OR EXISTS (
                      SELECT 1 FROM project_members pm
                      WHERE pm.project_id = $1 AND pm.role = 'owner' AND pm.user_id <> $2
                  )
              )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(new_role)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(GuardedOutcome::Applied);
        }

        match Self::find(pool, project_id, user_id).await? {
            Some(_) => Ok(GuardedOutcome::LastOwner),
            None => Ok(GuardedOutcome::NotFound),
        }
    }

    /// Transfers ownership to another member atomically
    ///
    /// Promotes `new_owner_id` to owner and demotes `current_owner_id` to
    /// collaborator in one transaction, so the project never lacks an owner.
    /// The new owner must already be a member.
    pub async fn transfer_ownership(
        pool: &PgPool,
        project_id: Uuid,
        current_owner_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<GuardedOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let promoted = sqlx::query(
            r#"
            UPDATE project_members
            SET role = 'owner'
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(new_owner_id)
        .execute(&mut *tx)
        .await?;

        if promoted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(GuardedOutcome::NotFound);
        }

        sqlx::query(
            r#"
            UPDATE project_members
            SET role = 'collaborator'
            WHERE project_id = $1 AND user_id = $2 AND role = 'owner'
            "#,
        )
        .bind(project_id)
        .bind(current_owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(GuardedOutcome::Applied)
    }

    /// Lists all members of a project
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists all projects a user belongs to
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, created_at
            FROM project_members
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_role_as_str() {
        assert_eq!(ProjectRole::Owner.as_str(), "owner");
        assert_eq!(ProjectRole::Collaborator.as_str(), "collaborator");
        assert_eq!(ProjectRole::Member.as_str(), "member");
        assert_eq!(ProjectRole::Viewer.as_str(), "viewer");
    }

    #[test]
    fn test_create_member_default_role() {
        assert_eq!(default_role(), ProjectRole::Member);
    }

    // Guarded operations are covered by the database-backed tests in
    // taskhive-api/tests/integration_test.rs.
}

/// Invitation model and database operations
///
/// Invitations bind an email address to a project and a proposed role. The
/// public identifier is always the opaque token, never the internal row id,
/// so invitation ids cannot be enumerated.
///
/// # Status machine
///
/// ```text
/// pending → accepted
///         → revoked
///         → expired   (lazily, when read past expires_at)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'expired', 'revoked');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token VARCHAR(64) NOT NULL UNIQUE,
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     email CITEXT NOT NULL,
///     role project_role NOT NULL DEFAULT 'member',
///     status invitation_status NOT NULL DEFAULT 'pending',
///     created_by UUID NOT NULL REFERENCES users(id),
///     expires_at TIMESTAMPTZ NOT NULL,
///     accepted_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// -- One pending invitation per (project, email); resolved invitations
/// -- do not block a re-invite.
/// CREATE UNIQUE INDEX invitations_pending_project_email_key
///     ON invitations (project_id, email)
///     WHERE status = 'pending';
/// ```
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::ProjectRole;

/// Default invitation lifetime
const DEFAULT_TTL_DAYS: i64 = 7;

/// Invitation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Waiting to be accepted
    Pending,

    /// Accepted; a membership row exists
    Accepted,

    /// Passed its expiry without being accepted
    Expired,

    /// Withdrawn by a project owner
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

/// Invitation record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    /// Internal row id; never exposed to clients
    #[serde(skip_serializing)]
    pub id: Uuid,

    /// Opaque token, the sole public identifier
    pub token: String,

    /// Project the invitation is for
    pub project_id: Uuid,

    /// Invited email address
    pub email: String,

    /// Proposed role
    pub role: ProjectRole,

    /// Current status
    pub status: InvitationStatus,

    /// Inviting user
    pub created_by: Uuid,

    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,

    /// When the invitation was accepted, if it was
    pub accepted_at: Option<DateTime<Utc>>,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Whether the invitation has passed its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Input for creating an invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    /// Project to invite into
    pub project_id: Uuid,

    /// Invited email
    pub email: String,

    /// Proposed role
    pub role: ProjectRole,

    /// Inviting user
    pub created_by: Uuid,
}

/// Generates an opaque, unguessable invitation token
///
/// 32 random bytes, hex-encoded. The token is the only public handle for an
/// invitation.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl Invitation {
    /// Creates a pending invitation with a fresh token
    ///
    /// # Errors
    ///
    /// The partial unique index on (project_id, email) rejects the insert
    /// when a pending invitation for the pair already exists; callers map
    /// that to Conflict. [`find_pending`](Self::find_pending) lets callers
    /// check first for a friendlier error.
    pub async fn create(pool: &PgPool, data: CreateInvitation) -> Result<Self, sqlx::Error> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::days(DEFAULT_TTL_DAYS);

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (token, project_id, email, role, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, token, project_id, email, role, status, created_by,
                      expires_at, accepted_at, created_at
            "#,
        )
        .bind(token)
        .bind(data.project_id)
        .bind(data.email)
        .bind(data.role)
        .bind(data.created_by)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds the pending invitation for a (project, email) pair, if any
    ///
    /// Backs the duplicate check on invitation creation; at most one such
    /// row can exist thanks to the partial unique index.
    pub async fn find_pending(
        pool: &PgPool,
        project_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, token, project_id, email, role, status, created_by,
                   expires_at, accepted_at, created_at
            FROM invitations
            WHERE project_id = $1 AND email = $2 AND status = 'pending'
            "#,
        )
        .bind(project_id)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by its token
    ///
    /// A pending invitation past its expiry is transitioned to expired before
    /// being returned, so callers always see a truthful status.
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, token, project_id, email, role, status, created_by,
                   expires_at, accepted_at, created_at
            FROM invitations
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        let Some(invitation) = invitation else {
            return Ok(None);
        };

        if invitation.status == InvitationStatus::Pending && invitation.is_expired() {
            let expired = sqlx::query_as::<_, Invitation>(
                r#"
                UPDATE invitations
                SET status = 'expired'
                WHERE token = $1 AND status = 'pending'
                RETURNING id, token, project_id, email, role, status, created_by,
                          expires_at, accepted_at, created_at
                "#,
            )
            .bind(token)
            .fetch_optional(pool)
            .await?;

            return Ok(expired.or(Some(invitation)));
        }

        Ok(Some(invitation))
    }

    /// Accepts a pending invitation and creates the membership atomically
    ///
    /// The status flip and the membership insert run in one transaction;
    /// the conditional UPDATE means a concurrent accept or revoke wins and
    /// this call returns None.
    pub async fn accept(
        pool: &PgPool,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = 'accepted', accepted_at = NOW()
            WHERE token = $1 AND status = 'pending' AND expires_at > NOW()
            RETURNING id, token, project_id, email, role, status, created_by,
                      expires_at, accepted_at, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invitation) = invitation else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(invitation.project_id)
        .bind(user_id)
        .bind(invitation.role)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(invitation))
    }

    /// Revokes a pending invitation
    pub async fn revoke(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invitations SET status = 'revoked' WHERE token = $1 AND status = 'pending'",
        )
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists invitations for a project, newest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let invitations = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, token, project_id, email, role, status, created_by,
                   expires_at, accepted_at, created_at
            FROM invitations
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(invitations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_status_as_str() {
        assert_eq!(InvitationStatus::Pending.as_str(), "pending");
        assert_eq!(InvitationStatus::Accepted.as_str(), "accepted");
        assert_eq!(InvitationStatus::Expired.as_str(), "expired");
        assert_eq!(InvitationStatus::Revoked.as_str(), "revoked");
    }

    #[test]
    fn test_generate_token_is_opaque_and_unique() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_expired() {
        let mut invitation = Invitation {
            id: Uuid::new_v4(),
            token: generate_token(),
            project_id: Uuid::new_v4(),
            email: "invitee@example.com".to_string(),
            role: ProjectRole::Member,
            status: InvitationStatus::Pending,
            created_by: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::days(1),
            accepted_at: None,
            created_at: Utc::now(),
        };
        assert!(!invitation.is_expired());

        invitation.expires_at = Utc::now() - Duration::seconds(1);
        assert!(invitation.is_expired());
    }
}

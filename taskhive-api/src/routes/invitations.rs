/// Invitation endpoints
///
/// Invitations are addressed exclusively by their opaque token; the internal
/// row id never appears in a URL or response. Accepting is atomic: the
/// status flip and the membership insert share one transaction, and a
/// concurrent accept or revoke simply wins.
///
/// # Endpoints
///
/// - `POST /v1/projects/:id/invitations` - Invite an email to a project
/// - `GET  /v1/projects/:id/invitations` - List a project's invitations
/// - `GET  /v1/invitations/:token` - Inspect an invitation
/// - `POST /v1/invitations/:token/accept` - Accept and join
/// - `POST /v1/invitations/:token/revoke` - Withdraw a pending invitation
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use taskhive_shared::{
    access::permissions::Permission,
    auth::middleware::AuthContext,
    models::{
        invitation::{CreateInvitation, Invitation, InvitationStatus},
        membership::ProjectRole,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::projects::require_permission,
};

/// Invitation creation request body
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Email address to invite
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Role the invitee will receive (defaults to member)
    pub role: Option<ProjectRole>,
}

/// Invites an email address to a project
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateInvitationRequest>,
) -> ApiResult<Json<Invitation>> {
    require_permission(
        &state,
        auth.user_id,
        project_id,
        Permission::ProjectInviteUsers,
    )
    .await?;

    req.validate().map_err(|_| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "email".to_string(),
            message: "Invalid email format".to_string(),
        }])
    })?;

    let role = req.role.unwrap_or(ProjectRole::Member);
    if role == ProjectRole::Owner {
        return Err(ApiError::BadRequest(
            "Ownership is granted by transfer, not invitation".to_string(),
        ));
    }

    // The partial unique index catches the race; this check gives the
    // common case a clear message.
    if Invitation::find_pending(&state.db, project_id, &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "An invitation for this email is already pending".to_string(),
        ));
    }

    let invitation = Invitation::create(
        &state.db,
        CreateInvitation {
            project_id,
            email: req.email,
            role,
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        project_id = %project_id,
        invited_by = %auth.user_id,
        role = invitation.role.as_str(),
        "Invitation created"
    );

    Ok(Json(invitation))
}

/// Lists a project's invitations, newest first
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Invitation>>> {
    require_permission(
        &state,
        auth.user_id,
        project_id,
        Permission::ProjectInviteUsers,
    )
    .await?;

    let invitations = Invitation::list_by_project(&state.db, project_id).await?;
    Ok(Json(invitations))
}

/// Fetches an invitation by token
///
/// Any authenticated holder of the token may inspect it; the token itself
/// is the capability.
pub async fn get_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<Invitation>> {
    let invitation = Invitation::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    Ok(Json(invitation))
}

/// Accepts an invitation
///
/// The caller joins the project with the invited role. Expired, revoked,
/// and already-accepted invitations are rejected.
///
/// The unguessable token is the capability: any authenticated user who
/// presents it may accept, even under an account whose email differs from
/// the invited address. The email field is addressing and audit metadata,
/// not an authorization check, so invitees are free to join under whichever
/// account they actually use.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(token): Path<String>,
) -> ApiResult<Json<Invitation>> {
    let accepted = Invitation::accept(&state.db, &token, auth.user_id).await?;

    match accepted {
        Some(invitation) => {
            tracing::info!(
                project_id = %invitation.project_id,
                user_id = %auth.user_id,
                role = invitation.role.as_str(),
                "Invitation accepted"
            );
            Ok(Json(invitation))
        }
        None => {
            // Distinguish a dead invitation from an unknown token.
            match Invitation::find_by_token(&state.db, &token).await? {
                Some(invitation) => Err(ApiError::Conflict(format!(
                    "Invitation is {}",
                    invitation.status.as_str()
                ))),
                None => Err(ApiError::NotFound("Invitation not found".to_string())),
            }
        }
    }
}

/// Revokes a pending invitation
pub async fn revoke_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(token): Path<String>,
) -> ApiResult<Json<Invitation>> {
    let invitation = Invitation::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    require_permission(
        &state,
        auth.user_id,
        invitation.project_id,
        Permission::ProjectInviteUsers,
    )
    .await?;

    if invitation.status != InvitationStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Invitation is {}",
            invitation.status.as_str()
        )));
    }

    let revoked = Invitation::revoke(&state.db, &token).await?;
    if !revoked {
        return Err(ApiError::Conflict(
            "Invitation is no longer pending".to_string(),
        ));
    }

    let invitation = Invitation::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    tracing::info!(
        project_id = %invitation.project_id,
        revoked_by = %auth.user_id,
        "Invitation revoked"
    );

    Ok(Json(invitation))
}

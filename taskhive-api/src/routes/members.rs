/// Project membership endpoints
///
/// Every mutation here is subject to the last-owner invariant: the sole
/// remaining owner of a project can never be removed or demoted, in any code
/// path. The guard is enforced inside the SQL statements themselves, so it
/// holds under concurrent requests; blocked mutations surface as 409.
///
/// # Endpoints
///
/// - `GET    /v1/projects/:id/members` - List members
/// - `PUT    /v1/projects/:id/members/:user_id` - Change a member's role
/// - `DELETE /v1/projects/:id/members/:user_id` - Remove a member
/// - `POST   /v1/projects/:id/members/leave` - Leave the project
/// - `POST   /v1/projects/:id/transfer-ownership` - Hand the project over
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use taskhive_shared::{
    access::permissions::Permission,
    auth::middleware::AuthContext,
    models::membership::{GuardedOutcome, ProjectMember, ProjectRole},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::projects::require_permission,
};

fn guarded(outcome: GuardedOutcome) -> ApiResult<()> {
    match outcome {
        GuardedOutcome::Applied => Ok(()),
        GuardedOutcome::NotFound => Err(ApiError::NotFound("Member not found".to_string())),
        GuardedOutcome::LastOwner => Err(ApiError::Conflict(
            "Cannot remove or demote the last owner of a project".to_string(),
        )),
    }
}

/// Lists the members of a project
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    require_permission(&state, auth.user_id, project_id, Permission::MembersViewAll).await?;

    let members = ProjectMember::list_by_project(&state.db, project_id).await?;
    Ok(Json(members))
}

/// Role change request body
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    /// New role for the member
    pub role: ProjectRole,
}

/// Changes a member's role
pub async fn change_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ProjectMember>> {
    require_permission(
        &state,
        auth.user_id,
        project_id,
        Permission::ProjectManageMembers,
    )
    .await?;

    guarded(ProjectMember::change_role_guarded(&state.db, project_id, user_id, req.role).await?)?;

    let member = ProjectMember::find(&state.db, project_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    tracing::info!(
        project_id = %project_id,
        user_id = %user_id,
        role = member.role.as_str(),
        "Member role changed"
    );

    Ok(Json(member))
}

/// Removes a member from a project
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    require_permission(
        &state,
        auth.user_id,
        project_id,
        Permission::ProjectManageMembers,
    )
    .await?;

    guarded(ProjectMember::remove_guarded(&state.db, project_id, user_id).await?)?;

    tracing::info!(project_id = %project_id, user_id = %user_id, "Member removed");

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Leaves a project
///
/// Any member may leave; the last-owner guard still applies, so a sole
/// owner must transfer ownership first.
pub async fn leave_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    guarded(ProjectMember::remove_guarded(&state.db, project_id, auth.user_id).await?)?;

    tracing::info!(project_id = %project_id, user_id = %auth.user_id, "Member left project");

    Ok(Json(serde_json::json!({ "left": true })))
}

/// Ownership transfer request body
#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    /// Member to promote to owner
    pub new_owner_id: Uuid,
}

/// Transfers project ownership to another member
///
/// The caller must be an owner; the new owner must already be a member.
/// Promotion and demotion happen in one transaction so the project never
/// lacks an owner.
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<TransferOwnershipRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    require_permission(
        &state,
        auth.user_id,
        project_id,
        Permission::ProjectManageMembers,
    )
    .await?;

    if req.new_owner_id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot transfer ownership to yourself".to_string(),
        ));
    }

    let outcome = ProjectMember::transfer_ownership(
        &state.db,
        project_id,
        auth.user_id,
        req.new_owner_id,
    )
    .await?;

    match outcome {
        GuardedOutcome::Applied => {
            tracing::info!(
                project_id = %project_id,
                previous_owner = %auth.user_id,
                new_owner = %req.new_owner_id,
                "Project ownership transferred"
            );
            Ok(Json(serde_json::json!({ "transferred": true })))
        }
        GuardedOutcome::NotFound => Err(ApiError::NotFound(
            "New owner is not a member of this project".to_string(),
        )),
        GuardedOutcome::LastOwner => Err(ApiError::Conflict(
            "Cannot remove or demote the last owner of a project".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_outcome_mapping() {
        assert!(guarded(GuardedOutcome::Applied).is_ok());
        assert!(matches!(
            guarded(GuardedOutcome::NotFound),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            guarded(GuardedOutcome::LastOwner),
            Err(ApiError::Conflict(_))
        ));
    }
}

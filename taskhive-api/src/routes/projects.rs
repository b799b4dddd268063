/// Project endpoints
///
/// Project responses go through the boundary transform so older clients see
/// the `user_id` alias alongside `owner_id` and array fields are never null.
/// Permission checks resolve the caller's role once per request and consult
/// the role table; a missing role always denies.
///
/// # Endpoints
///
/// - `GET    /v1/projects` - List the caller's projects
/// - `POST   /v1/projects` - Create a project (caller becomes owner)
/// - `GET    /v1/projects/:id` - Fetch one project
/// - `PUT    /v1/projects/:id` - Update fields
/// - `POST   /v1/projects/:id/archive` - Set the archived flag
/// - `DELETE /v1/projects/:id` - Delete the project
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskhive_shared::{
    access::{
        permissions::{has_permission, Permission},
        resolver::resolve_role,
    },
    auth::middleware::AuthContext,
    dto,
    models::project::{CreateProject, Project, UpdateProject},
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Resolves the caller's role and checks a project-level permission
///
/// Returns NotFound rather than Forbidden for callers with no role at all,
/// so project IDs are not confirmed to outsiders.
pub(crate) async fn require_permission(
    state: &AppState,
    user_id: Uuid,
    project_id: Uuid,
    permission: Permission,
) -> ApiResult<()> {
    let role = resolve_role(&state.db, user_id, project_id).await?;

    match role {
        None => Err(ApiError::NotFound("Project not found".to_string())),
        Some(role) if has_permission(role, permission) => Ok(()),
        Some(_) => Err(ApiError::Forbidden(format!(
            "Requires the {} permission",
            permission.as_str()
        ))),
    }
}

/// Lists non-archived projects the caller is a member of
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Value>>> {
    let projects = Project::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(
        projects.iter().map(dto::project::to_response_shape).collect(),
    ))
}

/// Creates a project
///
/// The caller becomes the owner; the project row and the owner membership
/// are created atomically.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    #[derive(Deserialize)]
    struct CreateProjectBody {
        name: String,
        description: Option<String>,
        color: Option<String>,
    }

    let body: CreateProjectBody =
        serde_json::from_value(dto::project::from_request_shape(body))
            .map_err(|e| ApiError::BadRequest(format!("Invalid project body: {}", e)))?;

    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    let project = Project::create(
        &state.db,
        CreateProject {
            owner_id: auth.user_id,
            name: body.name,
            description: body.description,
            color: body.color,
        },
    )
    .await?;

    tracing::info!(project_id = %project.id, owner_id = %auth.user_id, "Project created");

    Ok(Json(dto::project::to_response_shape(&project)))
}

/// Fetches a single project
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, auth.user_id, id, Permission::ProjectView).await?;

    let project = Project::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(dto::project::to_response_shape(&project)))
}

/// Updates project fields
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, auth.user_id, id, Permission::ProjectEdit).await?;

    let update: UpdateProject = serde_json::from_value(dto::project::from_request_shape(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid project body: {}", e)))?;

    let project = Project::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    Ok(Json(dto::project::to_response_shape(&project)))
}

/// Archive request body
#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    /// Desired archived state
    pub archived: bool,
}

/// Sets the archived flag
pub async fn archive_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ArchiveRequest>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, auth.user_id, id, Permission::ProjectArchive).await?;

    let project = Project::set_archived(&state.db, id, req.archived)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(project_id = %id, archived = req.archived, "Project archive state changed");

    Ok(Json(dto::project::to_response_shape(&project)))
}

/// Deletes a project and everything under it
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, auth.user_id, id, Permission::ProjectDelete).await?;

    let deleted = Project::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = %id, "Project deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Task endpoints
///
/// Task bodies go through the boundary transform in both directions, so
/// either spelling of the aliased fields (`due_date`/`deadline`,
/// `creator_id`/`user_id`) is accepted and both appear in responses.
///
/// Access decisions are computed exactly once per mutating request, before
/// any write: the caller's role is resolved, combined with the task's
/// creator/assignee facts, and the resulting boolean turned into Forbidden
/// (or NotFound for invisible tasks). Decisions are never cached across
/// requests.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List tasks (`?project_id=` or personal)
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks/:id` - Fetch one task
/// - `PUT/PATCH /v1/tasks/:id` - Apply a field patch
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `GET    /v1/tasks/:id/comments` - List comments
/// - `POST   /v1/tasks/:id/comments` - Add a comment
/// - `DELETE /v1/tasks/:id/comments/:comment_id` - Remove a comment
/// - `GET    /v1/tasks/:id/attachments` - List attachment metadata
/// - `POST   /v1/tasks/:id/attachments` - Record attachment metadata
/// - `DELETE /v1/tasks/:id/attachments/:attachment_id` - Remove an attachment
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use taskhive_shared::{
    access::{
        evaluator::{self, TaskFacts},
        permissions::{has_permission, Permission},
        resolver::resolve_role,
    },
    auth::middleware::AuthContext,
    dto,
    models::{
        attachment::{Attachment, CreateAttachment},
        comment::{Comment, CreateComment},
        membership::ProjectRole,
        task::{CreateTask, Task, TaskPatch, TaskPriority},
    },
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Task list query parameters
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    /// Project to list; absent means the caller's personal tasks
    pub project_id: Option<Uuid>,
}

/// Lists tasks
///
/// With `project_id`, the listing is scoped by role: owner, collaborator,
/// and viewer see the whole board while a member sees only tasks they
/// created or are assigned to. Without it, the caller's personal tasks.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let tasks = match query.project_id {
        Some(project_id) => {
            let role = resolve_role(&state.db, auth.user_id, project_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

            match role {
                ProjectRole::Member => {
                    Task::list_by_project_for_member(&state.db, project_id, auth.user_id).await?
                }
                _ => Task::list_by_project(&state.db, project_id).await?,
            }
        }
        None => Task::list_personal(&state.db, auth.user_id).await?,
    };

    Ok(Json(tasks.iter().map(dto::task::to_response_shape).collect()))
}

/// Fields accepted when creating a task
#[derive(Debug, Deserialize)]
struct CreateTaskBody {
    project_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    status: Option<String>,
    priority: Option<TaskPriority>,
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    is_recurring: bool,
    recurrence_pattern: Option<String>,
}

/// Creates a task
///
/// The caller becomes the creator. In a project, owner and collaborator may
/// assign anyone; a member may only create unassigned or self-assigned
/// tasks.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let body: CreateTaskBody = serde_json::from_value(dto::task::from_request_shape(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid task body: {}", e)))?;

    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }

    let allowed =
        evaluator::can_create_task(&state.db, auth.user_id, body.project_id, body.assignee_id)
            .await?;
    if !allowed {
        return Err(ApiError::Forbidden(
            "Not allowed to create this task".to_string(),
        ));
    }

    let task = Task::create(
        &state.db,
        CreateTask {
            project_id: body.project_id,
            creator_id: auth.user_id,
            assignee_id: body.assignee_id,
            title: body.title,
            description: body.description,
            status: body.status,
            priority: body.priority,
            category: body.category,
            tags: body.tags,
            due_date: body.due_date,
            is_recurring: body.is_recurring,
            recurrence_pattern: body.recurrence_pattern,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, creator_id = %auth.user_id, "Task created");

    Ok(Json(dto::task::to_response_shape(&task)))
}

/// Loads a task the caller may view, or NotFound
///
/// Invisible tasks are indistinguishable from absent ones so task IDs are
/// not confirmed to callers without view access.
async fn find_visible_task(state: &AppState, user_id: Uuid, id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !evaluator::can_view_task(&state.db, user_id, &task).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(task)
}

/// Fetches a single task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = find_visible_task(&state, auth.user_id, id).await?;
    Ok(Json(dto::task::to_response_shape(&task)))
}

/// Applies a patch to a task
///
/// Editing and reassignment are separate decisions: a patch that changes
/// the assignee additionally requires the assign capability for the
/// caller's role.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let patch: TaskPatch = serde_json::from_value(dto::task::from_request_shape(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid task patch: {}", e)))?;

    let facts = TaskFacts::of(&task);
    let role = match facts.project_id {
        Some(project_id) => resolve_role(&state.db, auth.user_id, project_id).await?,
        None => None,
    };

    if !evaluator::can_view(role, auth.user_id, &facts) {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    if !evaluator::can_edit(role, auth.user_id, &facts) {
        return Err(ApiError::Forbidden("Not allowed to edit this task".to_string()));
    }

    if patch.changes_assignee() {
        let new_assignee = patch.assignee_id.flatten();

        if facts.project_id.is_some() {
            if !evaluator::can_assign(role) {
                return Err(ApiError::Forbidden(
                    "Not allowed to assign this task".to_string(),
                ));
            }
        } else if new_assignee.is_some() && new_assignee != Some(auth.user_id) {
            // Personal tasks cannot be handed to someone else.
            return Err(ApiError::Forbidden(
                "Personal tasks cannot be assigned to another user".to_string(),
            ));
        }
    }

    let task = Task::apply_patch(&state.db, id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(dto::task::to_response_shape(&task)))
}

/// Deletes a task
///
/// Attachments and comments go with it.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let task = find_visible_task(&state, auth.user_id, id).await?;

    if !evaluator::can_delete_task(&state.db, auth.user_id, &task).await? {
        return Err(ApiError::Forbidden(
            "Not allowed to delete this task".to_string(),
        ));
    }

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, "Task deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Lists a task's comments
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    find_visible_task(&state, auth.user_id, id).await?;

    let comments = Comment::list_by_task(&state.db, id).await?;
    Ok(Json(comments))
}

/// Comment creation request body
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    /// Comment body
    pub body: String,
}

/// Adds a comment to a task
///
/// Requires view access plus the task edit capability, so viewers stay
/// read-only.
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    if req.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment body is required".to_string()));
    }

    let task = find_visible_task(&state, auth.user_id, id).await?;

    if let Some(project_id) = task.project_id {
        let role = resolve_role(&state.db, auth.user_id, project_id).await?;
        let can_comment = role.is_some_and(|r| has_permission(r, Permission::TaskEdit));
        if !can_comment {
            return Err(ApiError::Forbidden(
                "Not allowed to comment on this task".to_string(),
            ));
        }
    }

    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: id,
            author_id: auth.user_id,
            body: req.body,
        },
    )
    .await?;

    Ok(Json(comment))
}

/// Removes a comment
///
/// The author may always remove their own comment; otherwise the caller
/// needs the task delete capability in the project.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let task = find_visible_task(&state, auth.user_id, id).await?;

    let comments = Comment::list_by_task(&state.db, id).await?;
    let comment = comments
        .into_iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    let mut allowed = comment.author_id == auth.user_id;
    if !allowed {
        if let Some(project_id) = task.project_id {
            let role = resolve_role(&state.db, auth.user_id, project_id).await?;
            allowed = role.is_some_and(|r| has_permission(r, Permission::TaskDelete));
        } else {
            allowed = task.creator_id == auth.user_id;
        }
    }

    if !allowed {
        return Err(ApiError::Forbidden(
            "Not allowed to delete this comment".to_string(),
        ));
    }

    Comment::delete(&state.db, comment_id).await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Lists a task's attachment metadata
pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Attachment>>> {
    find_visible_task(&state, auth.user_id, id).await?;

    let attachments = Attachment::list_by_task(&state.db, id).await?;
    Ok(Json(attachments))
}

/// Attachment registration request body
///
/// Records metadata only; the file bytes are handled by the storage layer.
#[derive(Debug, Deserialize)]
pub struct CreateAttachmentRequest {
    /// Original file name
    pub file_name: String,

    /// File size in bytes
    pub file_size: i64,

    /// MIME type, if known
    pub content_type: Option<String>,
}

/// Records attachment metadata on a task
pub async fn create_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateAttachmentRequest>,
) -> ApiResult<Json<Attachment>> {
    if req.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("File name is required".to_string()));
    }
    if req.file_size < 0 {
        return Err(ApiError::BadRequest(
            "File size cannot be negative".to_string(),
        ));
    }

    let task = find_visible_task(&state, auth.user_id, id).await?;

    if !evaluator::can_edit_task(&state.db, auth.user_id, &task).await? {
        return Err(ApiError::Forbidden(
            "Not allowed to attach files to this task".to_string(),
        ));
    }

    let attachment = Attachment::create(
        &state.db,
        CreateAttachment {
            task_id: id,
            uploaded_by: auth.user_id,
            file_name: req.file_name,
            file_size: req.file_size,
            content_type: req.content_type,
        },
    )
    .await?;

    Ok(Json(attachment))
}

/// Removes an attachment record
///
/// The uploader may always remove their own attachment; otherwise the
/// caller needs the task delete capability in the project.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    let task = find_visible_task(&state, auth.user_id, id).await?;

    let attachments = Attachment::list_by_task(&state.db, id).await?;
    let attachment = attachments
        .into_iter()
        .find(|a| a.id == attachment_id)
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let mut allowed = attachment.uploaded_by == auth.user_id;
    if !allowed {
        if let Some(project_id) = task.project_id {
            let role = resolve_role(&state.db, auth.user_id, project_id).await?;
            allowed = role.is_some_and(|r| has_permission(r, Permission::TaskDelete));
        } else {
            allowed = task.creator_id == auth.user_id;
        }
    }

    if !allowed {
        return Err(ApiError::Forbidden(
            "Not allowed to delete this attachment".to_string(),
        ));
    }

    Attachment::delete(&state.db, attachment_id).await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Task access evaluator
///
/// Combines the resolved project role with task ownership/assignment facts
/// into allow/deny decisions. The decision functions are pure over their
/// inputs and computed fresh on every call; the async wrappers at the bottom
/// resolve the role first and then delegate.
///
/// Every decision fails closed: a personal task denies everyone but its
/// creator, and a project task with no resolvable role denies everything.
/// Handlers must consult the evaluator exactly once per mutating request
/// before any persistence write.
///
/// # Example
///
/// ```
/// use taskhive_shared::access::evaluator::{can_edit, TaskFacts};
/// use taskhive_shared::models::membership::ProjectRole;
/// use uuid::Uuid;
///
/// let creator = Uuid::new_v4();
/// let outsider = Uuid::new_v4();
/// let facts = TaskFacts {
///     project_id: None,
///     creator_id: creator,
///     assignee_id: None,
/// };
///
/// assert!(can_edit(None, creator, &facts));
/// assert!(!can_edit(None, outsider, &facts));
/// ```
use sqlx::PgPool;
use uuid::Uuid;

use super::permissions::{has_permission, Permission};
use super::resolver::resolve_role;
use crate::models::membership::ProjectRole;
use crate::models::task::Task;

/// The facts about a task that access decisions depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFacts {
    /// Project the task belongs to (None = personal task)
    pub project_id: Option<Uuid>,

    /// Creator
    pub creator_id: Uuid,

    /// Assignee, if any
    pub assignee_id: Option<Uuid>,
}

impl TaskFacts {
    /// Extracts the decision-relevant facts from a task
    pub fn of(task: &Task) -> Self {
        TaskFacts {
            project_id: task.project_id,
            creator_id: task.creator_id,
            assignee_id: task.assignee_id,
        }
    }

    fn involves(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id || self.assignee_id == Some(user_id)
    }
}

/// Whether the user may view the task
///
/// Personal tasks: creator only. Project tasks: owner, collaborator, and
/// viewer see every task; a member sees only tasks they created or are
/// assigned to.
pub fn can_view(role: Option<ProjectRole>, user_id: Uuid, facts: &TaskFacts) -> bool {
    if facts.project_id.is_none() {
        return facts.creator_id == user_id;
    }

    match role {
        Some(ProjectRole::Owner | ProjectRole::Collaborator | ProjectRole::Viewer) => true,
        Some(ProjectRole::Member) => facts.involves(user_id),
        None => false,
    }
}

/// Whether the user may edit the task
///
/// Personal tasks: creator only. Project tasks: owner and collaborator edit
/// any task; a member edits only tasks they created or are assigned to; a
/// viewer never edits.
pub fn can_edit(role: Option<ProjectRole>, user_id: Uuid, facts: &TaskFacts) -> bool {
    if facts.project_id.is_none() {
        return facts.creator_id == user_id;
    }

    match role {
        Some(ProjectRole::Owner | ProjectRole::Collaborator) => true,
        Some(ProjectRole::Member) => facts.involves(user_id),
        Some(ProjectRole::Viewer) | None => false,
    }
}

/// Whether the user may delete the task
///
/// Personal tasks: creator only. Project tasks: owner and collaborator only.
pub fn can_delete(role: Option<ProjectRole>, user_id: Uuid, facts: &TaskFacts) -> bool {
    if facts.project_id.is_none() {
        return facts.creator_id == user_id;
    }

    matches!(
        role,
        Some(ProjectRole::Owner | ProjectRole::Collaborator)
    )
}

/// Whether the user may create a task with the given assignee
///
/// Personal tasks (no project) may only be assigned to the creator, if at
/// all. In a project, owner and collaborator may create for any assignee; a
/// member may create only unassigned or self-assigned tasks, so a member
/// cannot create work for someone else.
pub fn can_create(
    role: Option<ProjectRole>,
    user_id: Uuid,
    project_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
) -> bool {
    let self_or_unassigned = assignee_id.is_none() || assignee_id == Some(user_id);

    if project_id.is_none() {
        return self_or_unassigned;
    }

    match role {
        Some(ProjectRole::Owner | ProjectRole::Collaborator) => true,
        Some(ProjectRole::Member) => self_or_unassigned,
        Some(ProjectRole::Viewer) | None => false,
    }
}

/// Whether the user may change a task's assignee
///
/// Owner and collaborator may reassign unconditionally; every other role is
/// checked against the `task:assign` entry in the role table (member holds
/// it, viewer does not). No role means deny.
pub fn can_assign(role: Option<ProjectRole>) -> bool {
    match role {
        Some(ProjectRole::Owner | ProjectRole::Collaborator) => true,
        Some(other) => has_permission(other, Permission::TaskAssign),
        None => false,
    }
}

/// Resolves the role for a task's project, if it has one
async fn role_for_task(
    pool: &PgPool,
    user_id: Uuid,
    facts: &TaskFacts,
) -> Result<Option<ProjectRole>, sqlx::Error> {
    match facts.project_id {
        Some(project_id) => resolve_role(pool, user_id, project_id).await,
        None => Ok(None),
    }
}

/// Resolving wrapper around [`can_view`]
pub async fn can_view_task(pool: &PgPool, user_id: Uuid, task: &Task) -> Result<bool, sqlx::Error> {
    let facts = TaskFacts::of(task);
    let role = role_for_task(pool, user_id, &facts).await?;
    Ok(can_view(role, user_id, &facts))
}

/// Resolving wrapper around [`can_edit`]
pub async fn can_edit_task(pool: &PgPool, user_id: Uuid, task: &Task) -> Result<bool, sqlx::Error> {
    let facts = TaskFacts::of(task);
    let role = role_for_task(pool, user_id, &facts).await?;
    Ok(can_edit(role, user_id, &facts))
}

/// Resolving wrapper around [`can_delete`]
pub async fn can_delete_task(
    pool: &PgPool,
    user_id: Uuid,
    task: &Task,
) -> Result<bool, sqlx::Error> {
    let facts = TaskFacts::of(task);
    let role = role_for_task(pool, user_id, &facts).await?;
    Ok(can_delete(role, user_id, &facts))
}

/// Resolving wrapper around [`can_create`]
pub async fn can_create_task(
    pool: &PgPool,
    user_id: Uuid,
    project_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let role = match project_id {
        Some(pid) => resolve_role(pool, user_id, pid).await?,
        None => None,
    };
    Ok(can_create(role, user_id, project_id, assignee_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal(creator: Uuid) -> TaskFacts {
        TaskFacts {
            project_id: None,
            creator_id: creator,
            assignee_id: None,
        }
    }

    fn in_project(project: Uuid, creator: Uuid, assignee: Option<Uuid>) -> TaskFacts {
        TaskFacts {
            project_id: Some(project),
            creator_id: creator,
            assignee_id: assignee,
        }
    }

    #[test]
    fn test_personal_task_is_creator_only() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let facts = personal(creator);

        assert!(can_view(None, creator, &facts));
        assert!(can_edit(None, creator, &facts));
        assert!(can_delete(None, creator, &facts));

        // Even a role in some project grants nothing on a personal task.
        for role in [None, Some(ProjectRole::Owner)] {
            assert!(!can_view(role, other, &facts));
            assert!(!can_edit(role, other, &facts));
            assert!(!can_delete(role, other, &facts));
        }
    }

    #[test]
    fn test_view_by_role() {
        let project = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let facts = in_project(project, creator, None);

        assert!(can_view(Some(ProjectRole::Owner), member, &facts));
        assert!(can_view(Some(ProjectRole::Collaborator), member, &facts));
        assert!(can_view(Some(ProjectRole::Viewer), member, &facts));

        // Member sees only own or assigned tasks.
        assert!(!can_view(Some(ProjectRole::Member), member, &facts));
        assert!(can_view(
            Some(ProjectRole::Member),
            member,
            &in_project(project, member, None)
        ));
        assert!(can_view(
            Some(ProjectRole::Member),
            member,
            &in_project(project, creator, Some(member))
        ));

        assert!(!can_view(None, member, &facts));
    }

    #[test]
    fn test_edit_by_role() {
        let project = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let user = Uuid::new_v4();
        let foreign = in_project(project, creator, None);
        let assigned = in_project(project, creator, Some(user));

        assert!(can_edit(Some(ProjectRole::Owner), user, &foreign));
        assert!(can_edit(Some(ProjectRole::Collaborator), user, &foreign));
        assert!(!can_edit(Some(ProjectRole::Member), user, &foreign));
        assert!(can_edit(Some(ProjectRole::Member), user, &assigned));
        assert!(!can_edit(Some(ProjectRole::Viewer), user, &assigned));
        assert!(!can_edit(None, user, &assigned));
    }

    #[test]
    fn test_delete_is_owner_or_collaborator_only() {
        let project = Uuid::new_v4();
        let user = Uuid::new_v4();
        // Not even the creating member may delete a project task.
        let own = in_project(project, user, Some(user));

        assert!(can_delete(Some(ProjectRole::Owner), user, &own));
        assert!(can_delete(Some(ProjectRole::Collaborator), user, &own));
        assert!(!can_delete(Some(ProjectRole::Member), user, &own));
        assert!(!can_delete(Some(ProjectRole::Viewer), user, &own));
        assert!(!can_delete(None, user, &own));
    }

    #[test]
    fn test_create_assignee_rules() {
        let project = Uuid::new_v4();
        let user = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        // Owner/collaborator: any assignee.
        for role in [ProjectRole::Owner, ProjectRole::Collaborator] {
            assert!(can_create(Some(role), user, Some(project), Some(someone_else)));
        }

        // Member: unassigned or self only.
        assert!(can_create(Some(ProjectRole::Member), user, Some(project), None));
        assert!(can_create(Some(ProjectRole::Member), user, Some(project), Some(user)));
        assert!(!can_create(
            Some(ProjectRole::Member),
            user,
            Some(project),
            Some(someone_else)
        ));

        // Viewer and non-members create nothing.
        assert!(!can_create(Some(ProjectRole::Viewer), user, Some(project), None));
        assert!(!can_create(None, user, Some(project), None));
    }

    #[test]
    fn test_create_personal() {
        let user = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        assert!(can_create(None, user, None, None));
        assert!(can_create(None, user, None, Some(user)));
        assert!(!can_create(None, user, None, Some(someone_else)));
    }

    #[test]
    fn test_assign_follows_role_table() {
        assert!(can_assign(Some(ProjectRole::Owner)));
        assert!(can_assign(Some(ProjectRole::Collaborator)));
        assert!(can_assign(Some(ProjectRole::Member)));
        assert!(!can_assign(Some(ProjectRole::Viewer)));
        assert!(!can_assign(None));
    }
}

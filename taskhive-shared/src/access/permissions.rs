/// Static role table
///
/// Maps each project role to its permitted action set. This is pure data with
/// no side effects; lookups never fail, an unknown role/permission pair is
/// simply `false`.
///
/// | permission              | owner | collaborator | member | viewer |
/// |-------------------------|-------|--------------|--------|--------|
/// | project:view            |  yes  |     yes      |  yes   |  yes   |
/// | project:edit            |  yes  |     yes      |        |        |
/// | project:delete          |  yes  |              |        |        |
/// | project:archive         |  yes  |              |        |        |
/// | project:manage-members  |  yes  |              |        |        |
/// | project:invite-users    |  yes  |              |        |        |
/// | task:view               |  yes  |     yes      |  yes   |  yes   |
/// | task:create             |  yes  |     yes      |  yes   |        |
/// | task:edit               |  yes  |     yes      |  yes   |        |
/// | task:delete             |  yes  |     yes      |        |        |
/// | task:assign             |  yes  |     yes      |  yes   |        |
/// | members:view-all        |  yes  |     yes      |        |        |
///
/// Member-level task:view/edit/assign are additionally scoped to the member's
/// own or assigned tasks by the evaluator; the table only answers "does this
/// role hold this capability at all".
use serde::{Deserialize, Serialize};

use crate::models::membership::ProjectRole;

/// Actions a role can be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    ProjectView,
    ProjectEdit,
    ProjectDelete,
    ProjectArchive,
    ProjectManageMembers,
    ProjectInviteUsers,
    TaskView,
    TaskCreate,
    TaskEdit,
    TaskDelete,
    TaskAssign,
    MembersViewAll,
}

impl Permission {
    /// Permission name in its wire form ("task:edit" etc.)
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ProjectView => "project:view",
            Permission::ProjectEdit => "project:edit",
            Permission::ProjectDelete => "project:delete",
            Permission::ProjectArchive => "project:archive",
            Permission::ProjectManageMembers => "project:manage-members",
            Permission::ProjectInviteUsers => "project:invite-users",
            Permission::TaskView => "task:view",
            Permission::TaskCreate => "task:create",
            Permission::TaskEdit => "task:edit",
            Permission::TaskDelete => "task:delete",
            Permission::TaskAssign => "task:assign",
            Permission::MembersViewAll => "members:view-all",
        }
    }

    /// Every permission, for exhaustive checks
    pub const ALL: [Permission; 12] = [
        Permission::ProjectView,
        Permission::ProjectEdit,
        Permission::ProjectDelete,
        Permission::ProjectArchive,
        Permission::ProjectManageMembers,
        Permission::ProjectInviteUsers,
        Permission::TaskView,
        Permission::TaskCreate,
        Permission::TaskEdit,
        Permission::TaskDelete,
        Permission::TaskAssign,
        Permission::MembersViewAll,
    ];
}

/// Checks whether a role holds a permission
///
/// Owner holds everything. Collaborator holds everything except project
/// delete/archive/member-management/inviting. Member can view the project and
/// view/create/edit/assign tasks. Viewer is read-only.
pub fn has_permission(role: ProjectRole, permission: Permission) -> bool {
    use Permission::*;

    match role {
        ProjectRole::Owner => true,
        ProjectRole::Collaborator => !matches!(
            permission,
            ProjectDelete | ProjectArchive | ProjectManageMembers | ProjectInviteUsers
        ),
        ProjectRole::Member => matches!(
            permission,
            ProjectView | TaskView | TaskCreate | TaskEdit | TaskAssign
        ),
        ProjectRole::Viewer => matches!(permission, ProjectView | TaskView),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(role: ProjectRole) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| has_permission(role, *p))
            .collect()
    }

    #[test]
    fn test_owner_has_every_permission() {
        assert_eq!(granted(ProjectRole::Owner), Permission::ALL.to_vec());
    }

    #[test]
    fn test_collaborator_table() {
        use Permission::*;
        assert_eq!(
            granted(ProjectRole::Collaborator),
            vec![
                ProjectView,
                ProjectEdit,
                TaskView,
                TaskCreate,
                TaskEdit,
                TaskDelete,
                TaskAssign,
                MembersViewAll,
            ]
        );
    }

    #[test]
    fn test_member_table() {
        use Permission::*;
        assert_eq!(
            granted(ProjectRole::Member),
            vec![ProjectView, TaskView, TaskCreate, TaskEdit, TaskAssign]
        );
    }

    #[test]
    fn test_viewer_table() {
        use Permission::*;
        assert_eq!(granted(ProjectRole::Viewer), vec![ProjectView, TaskView]);
    }

    #[test]
    fn test_member_cannot_delete_tasks_or_edit_project() {
        assert!(!has_permission(ProjectRole::Member, Permission::TaskDelete));
        assert!(!has_permission(ProjectRole::Member, Permission::ProjectEdit));
    }

    #[test]
    fn test_viewer_cannot_assign() {
        assert!(!has_permission(ProjectRole::Viewer, Permission::TaskAssign));
    }

    #[test]
    fn test_permission_as_str() {
        assert_eq!(Permission::ProjectManageMembers.as_str(), "project:manage-members");
        assert_eq!(Permission::TaskAssign.as_str(), "task:assign");
        assert_eq!(Permission::MembersViewAll.as_str(), "members:view-all");
    }
}

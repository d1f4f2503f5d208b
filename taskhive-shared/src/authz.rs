/// Role-based authorization over a loaded project document
///
/// Membership and role live inside the project's member list, so every check
/// here is a pure, synchronous scan of an already-loaded `Project`, with no
/// database access and no side effects. Handlers run these before performing
/// any write, which guarantees an authorization failure never leaves a
/// partial mutation behind.
///
/// Gating contract:
///
/// - `require_member` guards every read of project content and every
///   task-content update (status, subtasks, comments).
/// - `require_leader` guards every structural mutation: membership changes,
///   role changes, task/requirement list changes and project deletion.
///
/// # Example
///
/// ```
/// use taskhive_shared::authz::{is_leader, role_of};
/// use taskhive_shared::models::member::{Member, MemberRole};
/// # use uuid::Uuid;
/// # let leader_id = Uuid::new_v4();
/// # let project = taskhive_shared::models::project::Project {
/// #     id: Uuid::new_v4(),
/// #     title: "Example".to_string(),
/// #     description: None,
/// #     repo_url: None,
/// #     members: vec![Member {
/// #         user_id: leader_id,
/// #         name: "Ada Lovelace".to_string(),
/// #         username: "AL417265".to_string(),
/// #         role: MemberRole::TeamLeader,
/// #     }],
/// #     tasks: Vec::new(),
/// #     requirements: Vec::new(),
/// #     created_at: chrono::Utc::now(),
/// # };
///
/// assert_eq!(role_of(&project, leader_id), Some(MemberRole::TeamLeader));
/// assert!(is_leader(&project, leader_id));
/// ```
use thiserror::Error;
use uuid::Uuid;

use crate::models::member::MemberRole;
use crate::models::project::Project;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// User does not appear in the project's member list
    #[error("You are not a member of this project")]
    NotMember,

    /// User is a member but does not hold the Team Leader role
    #[error("Only a Team Leader can perform this action")]
    NotLeader,
}

/// Looks up the role a user holds in a project
///
/// Returns `None` when the user is not in the member list.
pub fn role_of(project: &Project, user_id: Uuid) -> Option<MemberRole> {
    project
        .members
        .iter()
        .find(|m| m.user_id == user_id)
        .map(|m| m.role)
}

/// Whether the user holds the Team Leader role in the project
pub fn is_leader(project: &Project, user_id: Uuid) -> bool {
    role_of(project, user_id).is_some_and(|role| role.is_leader())
}

/// Requires project membership, returning the member's role
pub fn require_member(project: &Project, user_id: Uuid) -> Result<MemberRole, AuthzError> {
    role_of(project, user_id).ok_or(AuthzError::NotMember)
}

/// Requires the Team Leader role
///
/// Non-members and non-leader members both fail; the distinction is kept in
/// the error so the API can report it.
pub fn require_leader(project: &Project, user_id: Uuid) -> Result<(), AuthzError> {
    match require_member(project, user_id)? {
        role if role.is_leader() => Ok(()),
        _ => Err(AuthzError::NotLeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::Member;
    use chrono::Utc;

    fn project_with(members: Vec<Member>) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Example".to_string(),
            description: None,
            repo_url: None,
            members,
            tasks: Vec::new(),
            requirements: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn member(user_id: Uuid, role: MemberRole) -> Member {
        Member {
            user_id,
            name: "Ada Lovelace".to_string(),
            username: "AL417265".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_of_finds_member() {
        let user_id = Uuid::new_v4();
        let project = project_with(vec![member(user_id, MemberRole::Developer)]);

        assert_eq!(role_of(&project, user_id), Some(MemberRole::Developer));
        assert_eq!(role_of(&project, Uuid::new_v4()), None);
    }

    #[test]
    fn test_is_leader_only_for_team_leader_role() {
        let leader = Uuid::new_v4();
        let developer = Uuid::new_v4();
        let client = Uuid::new_v4();
        let project = project_with(vec![
            member(leader, MemberRole::TeamLeader),
            member(developer, MemberRole::Developer),
            member(client, MemberRole::Client),
        ]);

        assert!(is_leader(&project, leader));
        assert!(!is_leader(&project, developer));
        assert!(!is_leader(&project, client));
        // Absent user is never a leader.
        assert!(!is_leader(&project, Uuid::new_v4()));
    }

    #[test]
    fn test_require_member() {
        let user_id = Uuid::new_v4();
        let project = project_with(vec![member(user_id, MemberRole::Client)]);

        assert_eq!(require_member(&project, user_id), Ok(MemberRole::Client));
        assert_eq!(
            require_member(&project, Uuid::new_v4()),
            Err(AuthzError::NotMember)
        );
    }

    #[test]
    fn test_require_leader_distinguishes_errors() {
        let leader = Uuid::new_v4();
        let developer = Uuid::new_v4();
        let project = project_with(vec![
            member(leader, MemberRole::TeamLeader),
            member(developer, MemberRole::Developer),
        ]);

        assert!(require_leader(&project, leader).is_ok());
        assert_eq!(
            require_leader(&project, developer),
            Err(AuthzError::NotLeader)
        );
        assert_eq!(
            require_leader(&project, Uuid::new_v4()),
            Err(AuthzError::NotMember)
        );
    }
}

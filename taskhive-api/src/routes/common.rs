/// Shared lookups used by several route modules
///
/// Thin wrappers over the models that convert "missing document" into the
/// NotFound responses the API reports, plus the project-with-role join used
/// by every endpoint that returns a user's project list.
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use taskhive_shared::authz::role_of;
use taskhive_shared::models::invitation::Invitation;
use taskhive_shared::models::member::MemberRole;
use taskhive_shared::models::project::Project;
use taskhive_shared::models::user::User;

/// A project paired with the requesting user's role in it
#[derive(Debug, Serialize)]
pub struct ProjectWithRole {
    pub project: Project,
    pub role: MemberRole,
}

/// Loads a user or reports NotFound
pub async fn load_user(pool: &PgPool, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found with that ID".to_string()))
}

/// Loads a project or reports NotFound
pub async fn load_project(pool: &PgPool, project_id: Uuid) -> ApiResult<Project> {
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No project found with that ID".to_string()))
}

/// Loads an invitation or reports NotFound
pub async fn load_invitation(pool: &PgPool, invitation_id: Uuid) -> ApiResult<Invitation> {
    Invitation::find_by_id(pool, invitation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No invitation found with that ID".to_string()))
}

/// Resolves each of the user's project references into the full project
/// document plus the role they hold in it
///
/// References whose project no longer exists, or where the user's member
/// entry is gone, are skipped; both sides of the relation can briefly
/// disagree after a failed workflow, and the listing should not break on it.
pub async fn get_user_projects(pool: &PgPool, user: &User) -> ApiResult<Vec<ProjectWithRole>> {
    let mut projects = Vec::with_capacity(user.project_refs.len());

    for project_ref in &user.project_refs {
        let Some(project) = Project::find_by_id(pool, project_ref.project_id).await? else {
            continue;
        };

        if let Some(role) = role_of(&project, user.id) {
            projects.push(ProjectWithRole { project, role });
        }
    }

    Ok(projects)
}

/// Lists all pending invitations addressed to a user
pub async fn get_user_invitations(pool: &PgPool, user_id: Uuid) -> ApiResult<Vec<Invitation>> {
    Ok(Invitation::find_by_invitee(pool, user_id).await?)
}

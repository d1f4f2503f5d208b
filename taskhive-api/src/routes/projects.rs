/// Project endpoints: creation, retrieval, deletion and membership
/// management
///
/// # Endpoints
///
/// - `POST /projects/add`: create a project (creator becomes sole Team
///   Leader)
/// - `GET /projects/getproject/:project_id`: project plus the caller's role
/// - `GET /projects/getrole/:project_id`: the caller's role only
/// - `DELETE /projects/delete/:project_id`: leader-gated cascade delete
/// - `GET /projects/invitations/:project_id`: pending invites for a project
/// - `PATCH /projects/removeuser/:project_id/:user_id`: leader-gated removal
/// - `PATCH /projects/updateuserrole/:project_id/:user_id`: leader-gated
///   role change
/// - `PATCH /projects/leave/:project_id`: voluntary leave
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    routes::common::{get_user_projects, load_project, load_user},
    routes::users::{MessageResponse, ProjectsResponse},
};
use taskhive_shared::{
    auth::middleware::AuthUser,
    authz::{require_leader, require_member},
    membership::{self, NewProject},
    models::{invitation::Invitation, member::MemberRole, project::Project},
};

/// Request for `POST /projects/add`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    pub repo_url: Option<String>,
}

/// Response for `GET /projects/getproject/:project_id`
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
    pub role: MemberRole,
}

/// Response for `GET /projects/getrole/:project_id`
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: MemberRole,
}

/// Response for `GET /projects/invitations/:project_id`
#[derive(Debug, Serialize)]
pub struct ProjectInvitationsResponse {
    pub invitations: Vec<Invitation>,
}

/// Request for `PATCH /projects/updateuserrole/:project_id/:user_id`
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

/// Creates a project with the caller as sole Team Leader
///
/// Returns the caller's refreshed project list.
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectsResponse>)> {
    validate_request(&req)?;

    let user = load_user(&state.db, auth.user_id).await?;

    membership::create_project(
        &state.db,
        &user,
        NewProject {
            title: req.title,
            description: req.description,
            repo_url: req.repo_url,
        },
    )
    .await?;

    // Refreshed list including the new project.
    let user = load_user(&state.db, auth.user_id).await?;
    let projects = get_user_projects(&state.db, &user).await?;

    Ok((StatusCode::CREATED, Json(ProjectsResponse { projects })))
}

/// Returns a project and the caller's role in it
///
/// # Errors
///
/// - `403 Forbidden`: caller is not a member
/// - `404 Not Found`: unknown project
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = load_project(&state.db, project_id).await?;
    let role = require_member(&project, auth.user_id)?;

    Ok(Json(ProjectResponse { project, role }))
}

/// Returns the caller's role in a project
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    let project = load_project(&state.db, project_id).await?;
    let role = require_member(&project, auth.user_id)?;

    Ok(Json(RoleResponse { role }))
}

/// Deletes a project
///
/// Leader-gated. The project reference is removed from every member before
/// the document is deleted.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    membership::delete_project(&state.db, &project).await?;

    Ok(Json(MessageResponse::new("Successfully removed project")))
}

/// Lists the pending invitations sent for a project
pub async fn get_project_invitations(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectInvitationsResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    let invitations = Invitation::find_by_project(&state.db, project_id).await?;

    Ok(Json(ProjectInvitationsResponse { invitations }))
}

/// Removes a member from a project
///
/// Leader-gated. Performs the two-sided pull keeping the membership relation
/// consistent.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    // Confirm the target account still exists before touching the relation.
    load_user(&state.db, user_id).await?;

    membership::remove_member(&state.db, &project, user_id).await?;

    Ok(Json(MessageResponse::new("Successfully removed user")))
}

/// Changes a member's role
///
/// Leader-gated. Rewrites only the matching entry; every other entry is
/// carried over untouched.
pub async fn change_member_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    if !project.members.iter().any(|m| m.user_id == user_id) {
        return Err(ApiError::NotFound(
            "No member found with that ID".to_string(),
        ));
    }

    let members: Vec<_> = project
        .members
        .iter()
        .cloned()
        .map(|mut member| {
            if member.user_id == user_id {
                member.role = req.role;
            }
            member
        })
        .collect();

    Project::replace_members(&state.db, project.id, &members).await?;

    Ok(Json(MessageResponse::new(
        "Successfully changed member's role",
    )))
}

/// Leaves a project
///
/// The same two-sided pull as removal, with the caller as target.
pub async fn leave_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;

    membership::remove_member(&state.db, &project, auth.user_id).await?;

    Ok(Json(MessageResponse::new("Successfully left project")))
}

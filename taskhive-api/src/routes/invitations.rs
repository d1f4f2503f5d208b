/// Invitation endpoints: the invite → accept → join lifecycle
///
/// # Endpoints (prefix `/invitations`)
///
/// - `POST /addinvitation/:username`: leader-gated invite by username
/// - `POST /accept/:invitation_id`: effect membership, delete the record
/// - `DELETE /delete/:invitation_id`: decline / withdraw
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::common::{
        get_user_invitations, get_user_projects, load_invitation, load_project, load_user,
        ProjectWithRole,
    },
    routes::users::MessageResponse,
};
use taskhive_shared::{
    auth::middleware::AuthUser,
    authz::require_leader,
    membership,
    models::{
        invitation::{CreateInvitation, Invitation},
        member::MemberRole,
        user::User,
    },
};

/// Request for `POST /invitations/addinvitation/:username`
///
/// The inviter and project snapshots are taken server-side from the
/// authenticated caller and the loaded project.
#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub project_id: Uuid,
    pub role: MemberRole,
}

/// Response for a successful accept: the invitee's refreshed lists
#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub updated_projects: Vec<ProjectWithRole>,
    pub updated_invitations: Vec<Invitation>,
}

/// Invites a user to a project
///
/// Leader-gated. Rejected when the invitee is already a member or already
/// holds a pending invite for this project (compared by project id only).
///
/// # Errors
///
/// - `400 Bad Request`: duplicate membership or pending invite
/// - `403 Forbidden`: caller is not the Team Leader
/// - `404 Not Found`: unknown username or project
pub async fn add_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
    Json(req): Json<CreateInvitationRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let invitee = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user found with that username".to_string()))?;

    let project = load_project(&state.db, req.project_id).await?;
    require_leader(&project, auth.user_id)?;

    membership::ensure_invitable(&state.db, &project, &invitee).await?;

    let inviter = load_user(&state.db, auth.user_id).await?;

    Invitation::create(
        &state.db,
        CreateInvitation {
            invitee_user_id: invitee.id,
            invitee_name: invitee.display_name(),
            invitee_username: invitee.username.clone(),
            inviter_user_id: inviter.id,
            inviter_name: inviter.display_name(),
            project_id: project.id,
            project_title: project.title.clone(),
            role: req.role,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Successfully invited user")),
    ))
}

/// Accepts an invitation
///
/// Effects membership on both sides of the relation, deletes the invitation
/// record, and returns the invitee's refreshed project and invitation
/// lists. Accepting the same invitation id again yields NotFound; the
/// record was deleted by the first accept.
pub async fn accept_invitation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<AcceptResponse>)> {
    let invitation = load_invitation(&state.db, invitation_id).await?;
    let project = load_project(&state.db, invitation.project_id).await?;
    let invitee = load_user(&state.db, invitation.invitee_user_id).await?;

    membership::accept(&state.db, &invitation, &project, &invitee).await?;

    // Refreshed lists after the membership writes.
    let invitee = load_user(&state.db, invitee.id).await?;
    let updated_projects = get_user_projects(&state.db, &invitee).await?;
    let updated_invitations = get_user_invitations(&state.db, auth.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AcceptResponse {
            updated_projects,
            updated_invitations,
        }),
    ))
}

/// Deletes (declines or withdraws) an invitation
///
/// Pure record removal with no membership side effects.
pub async fn delete_invitation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = Invitation::delete(&state.db, invitation_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(
            "No invitation found with that ID".to_string(),
        ));
    }

    Ok(Json(MessageResponse::new("Successfully deleted invite")))
}

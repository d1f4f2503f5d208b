/// Requirement sub-resource endpoints
///
/// All writes are leader-gated; the listing is member-gated. Requirement
/// indices are assigned server-side ("REQ-<n>"), preserved across updates,
/// and renumbered on deletion the same way task keys are.
///
/// # Endpoints (prefix `/projects/requirements`)
///
/// - `PATCH /addrequirement/:project_id`
/// - `PATCH /updaterequirement/:project_id/:index`
/// - `PATCH /removerequirement/:project_id/:index`
/// - `GET /getall/:project_id`
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
    routes::common::load_project,
    routes::users::MessageResponse,
};
use taskhive_shared::{
    auth::middleware::AuthUser,
    authz::{require_leader, require_member},
    keys,
    models::{project::Project, requirement::Requirement},
};

/// Requirement fields accepted from the client
///
/// The sequential index is never part of the request; the server assigns it
/// on creation and preserves it across updates.
#[derive(Debug, Deserialize, Validate)]
pub struct RequirementRequest {
    #[validate(length(min = 1, message = "Requirement type is required"))]
    #[serde(rename = "type")]
    pub kind: String,

    #[validate(length(min = 1, message = "System name is required"))]
    pub system_name: String,

    #[serde(default)]
    pub trigger: String,

    #[serde(default)]
    pub unwanted_trigger: Option<String>,

    #[serde(default)]
    pub preconditions: Vec<String>,

    #[serde(default)]
    pub system_responses: Vec<String>,

    #[validate(length(min = 1, message = "Full text is required"))]
    pub full_text: String,

    #[serde(default)]
    pub feature: Option<String>,

    #[serde(default)]
    pub order: Vec<String>,
}

impl RequirementRequest {
    /// Builds the stored requirement with the given index
    fn into_requirement(self, index: String) -> Requirement {
        Requirement {
            kind: self.kind,
            index,
            system_name: self.system_name,
            trigger: self.trigger,
            unwanted_trigger: self.unwanted_trigger,
            preconditions: self.preconditions,
            system_responses: self.system_responses,
            full_text: self.full_text,
            feature: self.feature,
            order: self.order,
        }
    }
}

/// Response for `GET /projects/requirements/getall/:project_id`
#[derive(Debug, Serialize)]
pub struct RequirementsResponse {
    pub requirements: Vec<Requirement>,
}

/// Adds a requirement
///
/// Leader-gated; the index is the next in the project's "REQ-<n>" sequence.
pub async fn add_requirement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<RequirementRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    validate_request(&req)?;

    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    let index = keys::next_key(&project.requirements)?;
    let requirement = req.into_requirement(index);

    Project::push_requirement(&state.db, project.id, &requirement).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Successfully added requirement to project",
        )),
    ))
}

/// Replaces a requirement's content, keeping its index
///
/// Leader-gated. The path names the requirement by its current index; the
/// stored index survives the update so the sequence cannot be corrupted
/// from the outside.
pub async fn update_requirement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, index)): Path<(Uuid, String)>,
    Json(req): Json<RequirementRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_request(&req)?;

    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    if project.requirement(&index).is_none() {
        return Err(ApiError::NotFound(
            "No requirement found with that index".to_string(),
        ));
    }

    let replacement = req.into_requirement(index.clone());
    let requirements: Vec<Requirement> = project
        .requirements
        .iter()
        .map(|existing| {
            if existing.index == index {
                replacement.clone()
            } else {
                existing.clone()
            }
        })
        .collect();

    Project::replace_requirements(&state.db, project.id, &requirements).await?;

    Ok(Json(MessageResponse::new(
        "Successfully updated requirement",
    )))
}

/// Deletes a requirement and renumbers the remaining indices
///
/// Leader-gated. Indices above the removed one are decremented by exactly
/// one, keeping the sequence contiguous from "REQ-1".
pub async fn remove_requirement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, index)): Path<(Uuid, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    let removed = project.requirement(&index).ok_or_else(|| {
        ApiError::NotFound("No requirement found with that index".to_string())
    })?;
    let removed_suffix = keys::numeric_suffix(&removed.index)?;

    let mut requirements: Vec<Requirement> = project
        .requirements
        .iter()
        .filter(|r| r.index != index)
        .cloned()
        .collect();
    keys::renumber_after_removal(&mut requirements, removed_suffix)?;

    Project::replace_requirements(&state.db, project.id, &requirements).await?;

    Ok(Json(MessageResponse::new(
        "Successfully deleted requirement",
    )))
}

/// Lists a project's requirements
pub async fn get_requirements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<RequirementsResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    Ok(Json(RequirementsResponse {
        requirements: project.requirements,
    }))
}

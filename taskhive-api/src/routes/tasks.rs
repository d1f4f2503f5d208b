/// Task sub-resource endpoints
///
/// Structural changes to the task list (add, remove) are leader-gated;
/// content updates (status, subtasks, comments) and reads are member-gated.
/// Task keys are assigned server-side and renumbered on deletion so they
/// stay contiguous from "T1".
///
/// # Endpoints (prefix `/projects/tasks`)
///
/// - `GET /gettask/:project_id/:task_id`
/// - `PATCH /addtask/:project_id`: leader-gated, returns the new task id
/// - `PATCH /removetask/:project_id/:task_id`: leader-gated, renumbers
/// - `GET /subtasks/:project_id/:task_id`
/// - `PATCH /updatesubtasks/:project_id/:task_id`: whole-structure replace
/// - `PATCH /updatestatus/:project_id/:task_id`: derives resolution
/// - `GET /comments/:project_id/:task_id`
/// - `PATCH /comments/updatecomments/:project_id/:task_id`: full-list
///   replace
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    routes::common::{load_project, load_user},
    routes::users::MessageResponse,
};
use taskhive_shared::{
    auth::middleware::AuthUser,
    authz::{require_leader, require_member},
    keys,
    models::{
        project::Project,
        task::{Comment, PersonSnapshot, Subtasks, Task, TaskStatus},
        user::User,
    },
};

/// An assignee given by username in a task-creation request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AssigneeRequest {
    #[validate(length(min = 1, message = "Assignee username is required"))]
    pub username: String,
}

/// Request for `PATCH /projects/tasks/addtask/:project_id`
///
/// The task key, reporter snapshot, resolution and creation date are all
/// assigned server-side.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "Task type is required"))]
    #[serde(rename = "type")]
    pub kind: String,

    #[validate(length(min = 1, message = "At least one assignee is required"), nested)]
    pub assignees: Vec<AssigneeRequest>,

    /// Initial status as its display string, e.g. "In Development"
    pub status: String,

    pub date_due: Option<DateTime<Utc>>,
}

/// Response for task creation
#[derive(Debug, Serialize)]
pub struct NewTaskResponse {
    pub new_task_id: Uuid,
}

/// Response for `GET /projects/tasks/subtasks/...`
#[derive(Debug, Serialize)]
pub struct SubtasksResponse {
    pub subtasks: Subtasks,
}

/// Request for `PATCH /projects/tasks/updatestatus/...`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Response for `GET /projects/tasks/comments/...`
#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

/// Finds a task in a loaded project or reports NotFound
fn find_task<'a>(project: &'a Project, task_id: Uuid) -> ApiResult<&'a Task> {
    project
        .task(task_id)
        .ok_or_else(|| ApiError::NotFound("No task found with that ID".to_string()))
}

/// Parses a status display string or reports BadRequest
fn parse_status(status: &str) -> ApiResult<TaskStatus> {
    status
        .parse::<TaskStatus>()
        .map_err(|_| ApiError::BadRequest("Invalid status".to_string()))
}

/// Returns a single task
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    let task = find_task(&project, task_id)?;

    Ok(Json(task.clone()))
}

/// Creates a task
///
/// Leader-gated. Assignees are given by username; each must resolve to an
/// account and already be a project member. The key is the next in the
/// project's "T<n>" sequence and the caller becomes the reporter snapshot.
///
/// # Errors
///
/// - `400 Bad Request`: validation failure, unknown status, or an assignee
///   who is not a project member
/// - `403 Forbidden`: caller is not the Team Leader
/// - `404 Not Found`: unknown project or assignee username
pub async fn add_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<NewTaskResponse>)> {
    validate_request(&req)?;
    let status = parse_status(&req.status)?;

    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    let mut assignees = Vec::with_capacity(req.assignees.len());
    for assignee in &req.assignees {
        let user = User::find_by_username(&state.db, &assignee.username)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound("Could not find assigned task members".to_string())
            })?;
        assignees.push(PersonSnapshot {
            user_id: user.id,
            name: user.display_name(),
        });
    }

    let all_members = assignees.iter().all(|snapshot| {
        project
            .members
            .iter()
            .any(|member| member.user_id == snapshot.user_id)
    });
    if !all_members {
        return Err(ApiError::BadRequest(
            "One or more members are not a member of this project.".to_string(),
        ));
    }

    let reporter_user = load_user(&state.db, auth.user_id).await?;
    let key = keys::next_key(&project.tasks)?;

    let task = Task::new(
        key,
        req.title,
        req.description,
        req.kind,
        assignees,
        PersonSnapshot {
            user_id: reporter_user.id,
            name: reporter_user.display_name(),
        },
        status,
        req.date_due,
    );
    let new_task_id = task.id;

    Project::push_task(&state.db, project.id, &task).await?;

    Ok((StatusCode::CREATED, Json(NewTaskResponse { new_task_id })))
}

/// Deletes a task and renumbers the remaining keys
///
/// Leader-gated. Every task whose numeric suffix is greater than the removed
/// one is decremented by exactly one, so keys stay contiguous from "T1".
pub async fn remove_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_leader(&project, auth.user_id)?;

    let removed = find_task(&project, task_id)?;
    let removed_suffix = keys::numeric_suffix(&removed.key)?;

    let mut tasks: Vec<Task> = project
        .tasks
        .iter()
        .filter(|t| t.id != task_id)
        .cloned()
        .collect();
    keys::renumber_after_removal(&mut tasks, removed_suffix)?;

    Project::replace_tasks(&state.db, project.id, &tasks).await?;

    Ok(Json(MessageResponse::new("Successfully deleted task")))
}

/// Returns a task's subtask buckets
pub async fn get_subtasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<SubtasksResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    let task = find_task(&project, task_id)?;

    Ok(Json(SubtasksResponse {
        subtasks: task.subtasks.clone(),
    }))
}

/// Replaces a task's subtask buckets
///
/// Member-gated whole-structure replace: adds, edits, removals and moves
/// between buckets all arrive as the full new structure.
pub async fn update_subtasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(subtasks): Json<Subtasks>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;
    find_task(&project, task_id)?;

    let mut tasks = project.tasks.clone();
    for task in tasks.iter_mut() {
        if task.id == task_id {
            task.subtasks = subtasks.clone();
        }
    }

    Project::replace_tasks(&state.db, project.id, &tasks).await?;

    Ok(Json(MessageResponse::new("Successfully updated subtasks")))
}

/// Updates a task's status
///
/// Member-gated. The resolution is derived: "Resolved" iff the new status is
/// "Resolved", "Un-Resolved" otherwise. Returns the updated task.
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    let status = parse_status(&req.status)?;

    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;
    find_task(&project, task_id)?;

    let mut tasks = project.tasks.clone();
    let mut updated: Option<Task> = None;
    for task in tasks.iter_mut() {
        if task.id == task_id {
            task.set_status(status);
            updated = Some(task.clone());
        }
    }

    Project::replace_tasks(&state.db, project.id, &tasks).await?;

    // Present after the find_task check above.
    updated
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No task found with that ID".to_string()))
}

/// Returns a task's comments
pub async fn get_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<CommentsResponse>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    let task = find_task(&project, task_id)?;

    Ok(Json(CommentsResponse {
        comments: task.comments.clone(),
    }))
}

/// Replaces a task's comment list
///
/// Member-gated. Additions, edits and deletions all arrive as the full new
/// list; the stored list is replaced wholesale and echoed back.
pub async fn update_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(comments): Json<Vec<Comment>>,
) -> ApiResult<Json<Vec<Comment>>> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;
    find_task(&project, task_id)?;

    let mut tasks = project.tasks.clone();
    for task in tasks.iter_mut() {
        if task.id == task_id {
            task.comments = comments.clone();
        }
    }

    Project::replace_tasks(&state.db, project.id, &tasks).await?;

    Ok(Json(comments))
}

/// User endpoints: registration, login, account-scoped reads, self-removal
/// and the task-follow notification check
///
/// # Endpoints
///
/// - `POST /users/register`: create an account, returns `{token, user}`
/// - `POST /users/login`: authenticate, returns `{token, user}`
/// - `GET /users/getuser`: the caller's account document
/// - `GET /users/projects`: the caller's projects with their role in each
/// - `GET /users/invitations`: pending invitations addressed to the caller
/// - `GET /users/tasks`: tasks across all projects where the caller is an
///   assignee
/// - `DELETE /users/remove`: delete the account and leave every project
/// - `PATCH /users/followtask/:project_id/:task_id`
/// - `DELETE /users/unfollowtask/:project_id/:task_id`
/// - `POST /users/getlatestfollowedtaskcomments`: pull-based new-comment
///   check against client-held cursors
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{validate_request, ApiError, ApiResult},
    routes::common::{
        get_user_invitations, get_user_projects, load_project, load_user, ProjectWithRole,
    },
};
use taskhive_shared::{
    auth::{jwt, middleware::AuthUser, password},
    authz::require_member,
    membership,
    models::{
        invitation::Invitation,
        project::Project,
        task::Task,
        user::{CreateUser, FollowedTask, User},
    },
};

const BAD_CREDENTIALS: &str =
    "The credentials you have provided are incorrect. Please try again...";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Confirmation copy of the password
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub vpassword: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Response for register and login: a bearer token plus the account document
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Response for `GET /users/getuser`
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Response for `GET /users/projects`
#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectWithRole>,
}

/// Response for `GET /users/invitations`
#[derive(Debug, Serialize)]
pub struct InvitationsResponse {
    pub invitations: Vec<Invitation>,
}

/// One entry of `GET /users/tasks`: a task plus its parent project
#[derive(Debug, Serialize)]
pub struct AssignedTask {
    pub task: Task,
    pub parent_project_title: String,
    pub parent_project_id: Uuid,
}

/// Response for `GET /users/tasks`
#[derive(Debug, Serialize)]
pub struct AssignedTasksResponse {
    pub tasks: Vec<AssignedTask>,
}

/// Response for `PATCH /users/followtask`: the follow baseline
#[derive(Debug, Serialize)]
pub struct FollowTaskResponse {
    /// Date of the task's latest comment; None when it has no comments yet
    pub latest_comment: Option<DateTime<Utc>>,
}

/// A client-held cursor for one followed task
#[derive(Debug, Deserialize)]
pub struct FollowedTaskCursor {
    pub project_id: Uuid,
    pub task_id: Uuid,
    /// Date of the latest comment the client has seen
    pub latest_comment_date: DateTime<Utc>,
}

/// Request for `POST /users/getlatestfollowedtaskcomments`
#[derive(Debug, Deserialize)]
pub struct LatestCommentsRequest {
    pub local_followed_task_comments: Vec<FollowedTaskCursor>,
}

/// One followed task with comments newer than the client's cursor
#[derive(Debug, Serialize)]
pub struct NewCommentNotice {
    pub task_id: Uuid,
    pub project_id: Uuid,
    pub latest_comment_date: DateTime<Utc>,
}

/// Response for `POST /users/getlatestfollowedtaskcomments`
#[derive(Debug, Serialize)]
pub struct LatestCommentsResponse {
    pub new_comments: Vec<NewCommentNotice>,
}

/// Plain confirmation message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Generates a username candidate: initials followed by a random number
/// below one million
fn generate_username(first_name: &str, last_name: &str) -> String {
    let initials: String = first_name
        .chars()
        .take(1)
        .chain(last_name.chars().take(1))
        .collect();
    let number = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}{}", initials, number)
}

/// Registers a new user
///
/// Generates a unique username from the user's initials, hashes the
/// password, and returns a bearer token alongside the stored account.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, weak password, or the email is
///   already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validate_request(&req)?;

    password::validate_password_strength(&req.password).map_err(ApiError::BadRequest)?;

    let email = req.email.to_lowercase();
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "A user is already registered with that email address".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    // Regenerate until the username is unique; collisions are rare with a
    // six-digit suffix.
    let username = loop {
        let candidate = generate_username(&req.first_name, &req.last_name);
        if User::find_by_username(&state.db, &candidate)
            .await?
            .is_none()
        {
            break candidate;
        }
    };

    let user = User::create(
        &state.db,
        CreateUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email,
            username,
            password_hash,
        },
    )
    .await?;

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Authenticates a user and issues a bearer token
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (same message for
///   both)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    validate_request(&req)?;

    let user = User::find_by_email(&state.db, &req.email.to_lowercase())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok(Json(AuthResponse { token, user }))
}

/// Returns the caller's account document
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = load_user(&state.db, auth.user_id).await?;
    Ok(Json(UserResponse { user }))
}

/// Returns every project the caller belongs to, with their role in each
pub async fn get_projects(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProjectsResponse>> {
    let user = load_user(&state.db, auth.user_id).await?;
    let projects = get_user_projects(&state.db, &user).await?;

    Ok(Json(ProjectsResponse { projects }))
}

/// Returns all pending invitations addressed to the caller
pub async fn get_invitations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<InvitationsResponse>> {
    let invitations = get_user_invitations(&state.db, auth.user_id).await?;

    Ok(Json(InvitationsResponse { invitations }))
}

/// Returns every task the caller is assigned to, across all their projects
pub async fn get_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<AssignedTasksResponse>> {
    let user = load_user(&state.db, auth.user_id).await?;

    let mut tasks = Vec::new();
    for project_ref in &user.project_refs {
        let Some(project) = Project::find_by_id(&state.db, project_ref.project_id).await? else {
            continue;
        };

        for task in &project.tasks {
            if task.is_assigned_to(user.id) {
                tasks.push(AssignedTask {
                    task: task.clone(),
                    parent_project_title: project.title.clone(),
                    parent_project_id: project.id,
                });
            }
        }
    }

    Ok(Json(AssignedTasksResponse { tasks }))
}

/// Deletes the caller's account
///
/// The membership workflow strips the caller from every project member list
/// before the account document is removed.
pub async fn remove_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    let user = load_user(&state.db, auth.user_id).await?;

    membership::delete_user(&state.db, &user).await?;

    Ok(Json(MessageResponse::new("Successfully deleted user")))
}

/// Starts following a task
///
/// Rejects when the task is already followed; otherwise records the
/// (task, project) pair and returns the date of the task's latest comment as
/// the client's baseline cursor.
///
/// # Errors
///
/// - `400 Bad Request`: already following the task
/// - `403 Forbidden`: caller is not a member of the project
/// - `404 Not Found`: unknown project or task
pub async fn follow_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<(StatusCode, Json<FollowTaskResponse>)> {
    let project = load_project(&state.db, project_id).await?;
    require_member(&project, auth.user_id)?;

    let task = project
        .task(task_id)
        .ok_or_else(|| ApiError::NotFound("No task found with that ID".to_string()))?;

    let user = load_user(&state.db, auth.user_id).await?;
    if user.is_following(task_id) {
        return Err(ApiError::BadRequest(
            "You are already following this task".to_string(),
        ));
    }

    User::push_followed_task(
        &state.db,
        user.id,
        FollowedTask {
            task_id,
            project_id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(FollowTaskResponse {
            latest_comment: task.latest_comment_at(),
        }),
    ))
}

/// Stops following a task
///
/// # Errors
///
/// - `400 Bad Request`: the task is not being followed
pub async fn unfollow_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((_project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    let user = load_user(&state.db, auth.user_id).await?;

    if !user.is_following(task_id) {
        return Err(ApiError::BadRequest(
            "User is not following this task".to_string(),
        ));
    }

    User::pull_followed_task(&state.db, user.id, task_id).await?;

    Ok(Json(MessageResponse::new("Successfully unfollowed task")))
}

/// Reports which followed tasks have comments newer than the client's
/// cursors
///
/// The client supplies one (project, task, last-seen-comment-date) tuple per
/// followed task; the server compares each against live state and returns
/// only the tuples whose live latest comment is strictly newer. No cursor
/// state is kept server-side.
///
/// Tasks in projects the caller no longer belongs to are skipped rather
/// than failing the whole check.
pub async fn latest_followed_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LatestCommentsRequest>,
) -> ApiResult<Json<LatestCommentsResponse>> {
    let mut new_comments = Vec::new();

    for cursor in &req.local_followed_task_comments {
        let project = load_project(&state.db, cursor.project_id).await?;
        if require_member(&project, auth.user_id).is_err() {
            continue;
        }

        let Some(task) = project.task(cursor.task_id) else {
            continue;
        };

        if let Some(live_latest) = task.latest_comment_at() {
            if live_latest > cursor.latest_comment_date {
                new_comments.push(NewCommentNotice {
                    task_id: cursor.task_id,
                    project_id: cursor.project_id,
                    latest_comment_date: live_latest,
                });
            }
        }
    }

    Ok(Json(LatestCommentsResponse { new_comments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_username_shape() {
        let username = generate_username("Ada", "Lovelace");

        assert!(username.starts_with("AL"));
        let digits = &username[2..];
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert!(digits.parse::<u32>().unwrap() < 1_000_000);
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "MyP@ssw0rd!".to_string(),
            vpassword: "MyP@ssw0rd!".to_string(),
        };
        assert!(req.validate().is_ok());

        let mismatched = RegisterRequest {
            vpassword: "Different1!".to_string(),
            ..req
        };
        assert!(mismatched.validate().is_err());
    }

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            email: "not-an-email".to_string(),
            password: "MyP@ssw0rd!".to_string(),
        };
        assert!(req.validate().is_err());
    }
}

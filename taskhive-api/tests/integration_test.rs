/// Integration tests for the TaskHive API
///
/// End-to-end scenarios through the full router:
/// - register → login → create project → delete project
/// - invite → accept → membership on both sides, replay rejected
/// - invite guards (existing member, duplicate pending invite)
/// - task key renumbering after deletion
/// - status update deriving the resolution
///
/// All tests require a running Postgres named by `DATABASE_URL` and are
/// ignored by default. They truncate shared tables, so run them one at a
/// time: `cargo test -- --ignored --test-threads=1`.
mod common;

use axum::http::StatusCode;
use common::{add_task, call, create_project, register_user, TestContext};
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_register_login_create_and_delete_project() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (_, user) = register_user(&ctx, "Ada", "Lovelace", "ada@example.com").await;
    assert!(user.get("password_hash").is_none());

    // Fresh login works and returns a usable token.
    let (status, body) = call(
        &ctx,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "MyP@ssw0rd!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    // Create a project; the creator is its sole Team Leader.
    let project = create_project(&ctx, &token, "Example Project").await;
    let members = project["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "Team Leader");
    assert_eq!(members[0]["user_id"], user["id"]);

    // Delete it; the reference disappears from the user's project list.
    let project_id = project["id"].as_str().unwrap();
    let (status, _) = call(
        &ctx,
        "DELETE",
        &format!("/projects/delete/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&ctx, "GET", "/users/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["projects"].as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_invitation_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (leader_token, _) = register_user(&ctx, "Grace", "Hopper", "grace@example.com").await;
    let (invitee_token, invitee) = register_user(&ctx, "Alan", "Turing", "alan@example.com").await;
    let invitee_username = invitee["username"].as_str().unwrap();

    let project = create_project(&ctx, &leader_token, "Compiler").await;
    let project_id = project["id"].as_str().unwrap();

    // Leader invites the second user as Developer.
    let (status, _) = call(
        &ctx,
        "POST",
        &format!("/invitations/addinvitation/{}", invitee_username),
        Some(&leader_token),
        Some(json!({ "project_id": project_id, "role": "Developer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Inviting again while the invite is pending is rejected.
    let (status, _) = call(
        &ctx,
        "POST",
        &format!("/invitations/addinvitation/{}", invitee_username),
        Some(&leader_token),
        Some(json!({ "project_id": project_id, "role": "Client" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The invitee sees the invitation.
    let (status, body) = call(&ctx, "GET", "/users/invitations", Some(&invitee_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let invitations = body["invitations"].as_array().unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0]["role"], "Developer");
    let invitation_id = invitations[0]["id"].as_str().unwrap().to_string();

    // Accept: membership lands on both sides with the invited role.
    let (status, body) = call(
        &ctx,
        "POST",
        &format!("/invitations/accept/{}", invitation_id),
        Some(&invitee_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let projects = body["updated_projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["role"], "Developer");
    assert!(body["updated_invitations"].as_array().unwrap().is_empty());

    let (status, body) = call(
        &ctx,
        "GET",
        &format!("/projects/getproject/{}", project_id),
        Some(&invitee_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "Developer");
    assert_eq!(body["project"]["members"].as_array().unwrap().len(), 2);

    // Replaying the accept finds the record gone.
    let (status, _) = call(
        &ctx,
        "POST",
        &format!("/invitations/accept/{}", invitation_id),
        Some(&invitee_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Inviting an existing member is rejected.
    let (status, _) = call(
        &ctx,
        "POST",
        &format!("/invitations/addinvitation/{}", invitee_username),
        Some(&leader_token),
        Some(json!({ "project_id": project_id, "role": "Developer" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_member_access_control() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (leader_token, _) = register_user(&ctx, "Grace", "Hopper", "grace2@example.com").await;
    let (outsider_token, _) = register_user(&ctx, "Eve", "Outsider", "eve@example.com").await;

    let project = create_project(&ctx, &leader_token, "Secret Project").await;
    let project_id = project["id"].as_str().unwrap();

    // Non-members cannot read the project.
    let (status, _) = call(
        &ctx,
        "GET",
        &format!("/projects/getproject/{}", project_id),
        Some(&outsider_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Requests without a token are rejected before handler logic.
    let (status, _) = call(
        &ctx,
        "GET",
        &format!("/projects/getproject/{}", project_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_task_keys_renumber_after_deletion() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (token, user) = register_user(&ctx, "Ada", "Lovelace", "ada2@example.com").await;
    let username = user["username"].as_str().unwrap();

    let project = create_project(&ctx, &token, "Sequencer").await;
    let project_id = project["id"].as_str().unwrap();

    // Create T1..T5.
    let mut task_ids = Vec::new();
    for n in 1..=5 {
        let id = add_task(&ctx, &token, project_id, &format!("Task {}", n), username).await;
        task_ids.push(id);
    }

    // Delete the task holding key T3.
    let (status, body) = call(
        &ctx,
        "GET",
        &format!("/projects/getproject/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let t3_id = body["project"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["key"] == "T3")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = call(
        &ctx,
        "PATCH",
        &format!("/projects/tasks/removetask/{}/{}", project_id, t3_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Remaining keys are exactly T1..T4, contiguous, no duplicates.
    let (_, body) = call(
        &ctx,
        "GET",
        &format!("/projects/getproject/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    let mut keys: Vec<String> = body["project"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["T1", "T2", "T3", "T4"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_update_status_derives_resolution() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (token, user) = register_user(&ctx, "Ada", "Lovelace", "ada3@example.com").await;
    let username = user["username"].as_str().unwrap();

    let project = create_project(&ctx, &token, "Resolutions").await;
    let project_id = project["id"].as_str().unwrap();
    let task_id = add_task(&ctx, &token, project_id, "Close me", username).await;

    let (status, body) = call(
        &ctx,
        "PATCH",
        &format!("/projects/tasks/updatestatus/{}/{}", project_id, task_id),
        Some(&token),
        Some(json!({ "status": "Resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Resolved");
    assert_eq!(body["resolution"], "Resolved");

    let (status, body) = call(
        &ctx,
        "PATCH",
        &format!("/projects/tasks/updatestatus/{}/{}", project_id, task_id),
        Some(&token),
        Some(json!({ "status": "Testing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolution"], "Un-Resolved");

    // Unknown statuses are rejected.
    let (status, _) = call(
        &ctx,
        "PATCH",
        &format!("/projects/tasks/updatestatus/{}/{}", project_id, task_id),
        Some(&token),
        Some(json!({ "status": "Done" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn test_follow_task_and_comment_diff() {
    let ctx = TestContext::new().await.unwrap();
    ctx.cleanup().await.unwrap();

    let (token, user) = register_user(&ctx, "Ada", "Lovelace", "ada4@example.com").await;
    let username = user["username"].as_str().unwrap();
    let user_id = user["id"].clone();

    let project = create_project(&ctx, &token, "Watched").await;
    let project_id = project["id"].as_str().unwrap();
    let task_id = add_task(&ctx, &token, project_id, "Watch me", username).await;

    // Follow: no comments yet, so the baseline is null.
    let (status, body) = call(
        &ctx,
        "PATCH",
        &format!("/users/followtask/{}/{}", project_id, task_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["latest_comment"].is_null());

    // Following twice is rejected.
    let (status, _) = call(
        &ctx,
        "PATCH",
        &format!("/users/followtask/{}/{}", project_id, task_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Post a comment dated after the client's cursor.
    let (status, _) = call(
        &ctx,
        "PATCH",
        &format!(
            "/projects/tasks/comments/updatecomments/{}/{}",
            project_id, task_id
        ),
        Some(&token),
        Some(json!([{
            "author": { "user_id": user_id, "name": "Ada Lovelace" },
            "content": "new activity",
            "tagged_users": [],
            "date_added": "2024-06-01T12:00:00Z",
        }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Older cursor → the task is reported.
    let (status, body) = call(
        &ctx,
        "POST",
        "/users/getlatestfollowedtaskcomments",
        Some(&token),
        Some(json!({
            "local_followed_task_comments": [{
                "project_id": project_id,
                "task_id": task_id,
                "latest_comment_date": "2024-01-01T00:00:00Z",
            }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_comments"].as_array().unwrap().len(), 1);

    // Up-to-date cursor → nothing reported.
    let (status, body) = call(
        &ctx,
        "POST",
        "/users/getlatestfollowedtaskcomments",
        Some(&token),
        Some(json!({
            "local_followed_task_comments": [{
                "project_id": project_id,
                "task_id": task_id,
                "latest_comment_date": "2024-06-01T12:00:00Z",
            }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["new_comments"].as_array().unwrap().is_empty());

    ctx.cleanup().await.unwrap();
}

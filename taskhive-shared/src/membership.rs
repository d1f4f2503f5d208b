/// Membership and invitation workflows
///
/// Membership is stored redundantly on both sides of the relation: a project
/// keeps a member entry for each user, and a user keeps a project reference
/// for each project. Every workflow here exists to keep those two sides
/// consistent:
///
/// - invite → accept → join (invitation lifecycle)
/// - member removal and voluntary leave (two-sided pull)
/// - project deletion (strip the reference from every member)
/// - user deletion (strip the member entry from every project)
///
/// The store offers no cross-document transactions, so multi-write workflows
/// run under a small saga: each completed write registers a compensating
/// action, and on failure the completed writes are compensated in reverse
/// order before the error is surfaced. A compensation that itself fails is
/// logged and skipped; at that point the relation is inconsistent and the
/// caller sees an internal error either way.
use futures::future::BoxFuture;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::authz::role_of;
use crate::models::invitation::Invitation;
use crate::models::member::{Member, MemberRole};
use crate::models::project::{CreateProject, Project};
use crate::models::user::{ProjectRef, User};

/// Error type for membership workflows
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Invitee already appears in the project's member list
    #[error("This user is already a member of this project")]
    AlreadyMember,

    /// Invitee already holds a pending invite for this project
    #[error("This user has already been invited")]
    AlreadyInvited,

    /// Target of a removal is not in the member list
    #[error("This user is not a member of this project")]
    NotAMember,

    /// Removing the target would leave the project without members
    #[error("A project must keep at least one member")]
    LastMember,

    /// Invitation disappeared mid-accept (concurrent accept or decline)
    #[error("The invitation no longer exists")]
    InvitationGone,

    /// Document store failure
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

type Compensation = BoxFuture<'static, Result<(), sqlx::Error>>;

/// Compensation list for a multi-write workflow
///
/// Completed steps are unwound in reverse order. Compensations run
/// best-effort: a failing one is logged, the rest still run.
struct Saga {
    completed: Vec<(&'static str, Compensation)>,
}

impl Saga {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
        }
    }

    /// Registers the compensation for a step that just succeeded
    fn record(&mut self, step: &'static str, undo: Compensation) {
        self.completed.push((step, undo));
    }

    /// Runs all registered compensations, most recent first
    async fn unwind(self) {
        for (step, undo) in self.completed.into_iter().rev() {
            if let Err(err) = undo.await {
                tracing::error!(step, error = %err, "saga compensation failed; membership relation may be inconsistent");
            }
        }
    }
}

/// Input for the project-creation workflow
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
}

/// Creates a project with the founder as its sole Team Leader
///
/// Two writes: insert the project document, then append the reference to the
/// founder's project list. If the second write fails the fresh project
/// document is deleted again.
pub async fn create_project(
    pool: &PgPool,
    founder: &User,
    data: NewProject,
) -> Result<Project, MembershipError> {
    let project = Project::create(
        pool,
        CreateProject {
            title: data.title,
            description: data.description,
            repo_url: data.repo_url,
            founder: Member {
                user_id: founder.id,
                name: founder.display_name(),
                username: founder.username.clone(),
                role: MemberRole::TeamLeader,
            },
        },
    )
    .await?;

    let mut saga = Saga::new();
    saga.record("create project document", {
        let pool = pool.clone();
        let project_id = project.id;
        Box::pin(async move { Project::delete(&pool, project_id).await.map(|_| ()) })
    });

    if let Err(err) = User::push_project_ref(
        pool,
        founder.id,
        ProjectRef {
            project_id: project.id,
        },
    )
    .await
    {
        saga.unwind().await;
        return Err(err.into());
    }

    Ok(project)
}

/// Checks the invite guards: invitee is not a member and holds no pending
/// invite for this project
///
/// The duplicate-invite check compares project ids only; a second invite from
/// a different inviter or with a different role is still a duplicate.
pub async fn ensure_invitable(
    pool: &PgPool,
    project: &Project,
    invitee: &User,
) -> Result<(), MembershipError> {
    if role_of(project, invitee.id).is_some() {
        return Err(MembershipError::AlreadyMember);
    }

    let pending = Invitation::find_by_invitee(pool, invitee.id).await?;
    if pending.iter().any(|inv| inv.project_id == project.id) {
        return Err(MembershipError::AlreadyInvited);
    }

    Ok(())
}

/// Turns a pending invitation into a membership
///
/// Re-validates that the invitee has not become a member since the invite
/// was created, then performs the three writes under saga compensation: the
/// reference onto the user, the member entry (with the invited role and
/// fresh name/username snapshots) onto the project, and the invitation
/// deletion. A replayed accept finds the invitation already gone and reports
/// `InvitationGone` after unwinding.
pub async fn accept(
    pool: &PgPool,
    invitation: &Invitation,
    project: &Project,
    invitee: &User,
) -> Result<(), MembershipError> {
    // Race-safe re-check against the freshly loaded project.
    if role_of(project, invitee.id).is_some() {
        return Err(MembershipError::AlreadyMember);
    }

    let mut saga = Saga::new();

    if let Err(err) = User::push_project_ref(
        pool,
        invitee.id,
        ProjectRef {
            project_id: project.id,
        },
    )
    .await
    {
        saga.unwind().await;
        return Err(err.into());
    }
    saga.record("add project reference to invitee", {
        let pool = pool.clone();
        let (user_id, project_id) = (invitee.id, project.id);
        Box::pin(async move { User::pull_project_ref(&pool, user_id, project_id).await })
    });

    let member = Member {
        user_id: invitee.id,
        name: invitee.display_name(),
        username: invitee.username.clone(),
        role: invitation.role,
    };
    if let Err(err) = Project::push_member(pool, project.id, &member).await {
        saga.unwind().await;
        return Err(err.into());
    }
    saga.record("add member entry to project", {
        let pool = pool.clone();
        let (project_id, user_id) = (project.id, invitee.id);
        Box::pin(async move { Project::pull_member(&pool, project_id, user_id).await })
    });

    match Invitation::delete(pool, invitation.id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            saga.unwind().await;
            Err(MembershipError::InvitationGone)
        }
        Err(err) => {
            saga.unwind().await;
            Err(err.into())
        }
    }
}

/// Removes a member from a project (leader removal or voluntary leave)
///
/// Performs the two-sided pull: the member entry leaves the project and the
/// project reference leaves the user, under saga compensation. Refuses to
/// remove the last remaining member, since the project must keep at least
/// one; deletion is the operation for that.
pub async fn remove_member(
    pool: &PgPool,
    project: &Project,
    user_id: Uuid,
) -> Result<(), MembershipError> {
    let entry = project
        .members
        .iter()
        .find(|m| m.user_id == user_id)
        .cloned()
        .ok_or(MembershipError::NotAMember)?;

    if project.members.len() == 1 {
        return Err(MembershipError::LastMember);
    }

    let mut saga = Saga::new();

    Project::pull_member(pool, project.id, user_id).await?;
    saga.record("remove member entry from project", {
        let pool = pool.clone();
        let project_id = project.id;
        Box::pin(async move { Project::push_member(&pool, project_id, &entry).await })
    });

    if let Err(err) = User::pull_project_ref(pool, user_id, project.id).await {
        saga.unwind().await;
        return Err(err.into());
    }

    Ok(())
}

/// Deletes a project and strips its reference from every member
///
/// The reference pulls run first so a failure surfaces before the document
/// disappears; pulls already applied are not re-added (the project is going
/// away regardless, and the deletion can be retried).
pub async fn delete_project(pool: &PgPool, project: &Project) -> Result<(), MembershipError> {
    for member in &project.members {
        User::pull_project_ref(pool, member.user_id, project.id).await?;
    }

    Project::delete(pool, project.id).await?;
    Ok(())
}

/// Deletes a user and strips their member entry from every project they
/// belong to
pub async fn delete_user(pool: &PgPool, user: &User) -> Result<(), MembershipError> {
    for project_ref in &user.project_refs {
        Project::pull_member(pool, project_ref.project_id, user.id).await?;
    }

    User::delete(pool, user.id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_step(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Compensation {
        let log = Arc::clone(log);
        Box::pin(async move {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_saga_unwinds_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut saga = Saga::new();
        saga.record("first", recording_step(&log, "undo first"));
        saga.record("second", recording_step(&log, "undo second"));
        saga.unwind().await;

        assert_eq!(*log.lock().unwrap(), vec!["undo second", "undo first"]);
    }

    #[tokio::test]
    async fn test_saga_continues_past_failing_compensation() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut saga = Saga::new();
        saga.record("first", recording_step(&log, "undo first"));
        saga.record(
            "second",
            Box::pin(async { Err(sqlx::Error::PoolClosed) }),
        );
        saga.unwind().await;

        // The failing compensation does not stop the earlier one.
        assert_eq!(*log.lock().unwrap(), vec!["undo first"]);
    }

    #[tokio::test]
    async fn test_empty_saga_unwind_is_a_noop() {
        Saga::new().unwind().await;
    }

    // The workflow functions themselves are exercised end-to-end by the
    // integration tests in taskhive-api/tests against a running Postgres.
}

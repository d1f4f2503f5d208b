/// Invitation model and database operations
///
/// An invitation is a pending offer of project membership. The invitee,
/// inviter and project fields are display snapshots taken when the invite is
/// created. The record is deleted when the invite is accepted (after
/// membership has been effected) or explicitly declined.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     invitee_user_id UUID NOT NULL,
///     invitee_name VARCHAR(255) NOT NULL,
///     invitee_username VARCHAR(64) NOT NULL,
///     inviter_user_id UUID NOT NULL,
///     inviter_name VARCHAR(255) NOT NULL,
///     project_id UUID NOT NULL,
///     project_title VARCHAR(255) NOT NULL,
///     role member_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::member::MemberRole;

/// A pending membership offer
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Invitation {
    /// Unique invitation ID
    pub id: Uuid,

    /// Invited user
    pub invitee_user_id: Uuid,

    /// Invitee display-name snapshot
    pub invitee_name: String,

    /// Invitee username snapshot
    pub invitee_username: String,

    /// Inviting user (a Team Leader of the project at invite time)
    pub inviter_user_id: Uuid,

    /// Inviter display-name snapshot
    pub inviter_name: String,

    /// Target project
    pub project_id: Uuid,

    /// Project title snapshot
    pub project_title: String,

    /// Role the invitee will receive on accept
    pub role: MemberRole,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new invitation
#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub invitee_user_id: Uuid,
    pub invitee_name: String,
    pub invitee_username: String,
    pub inviter_user_id: Uuid,
    pub inviter_name: String,
    pub project_id: Uuid,
    pub project_title: String,
    pub role: MemberRole,
}

const INVITATION_COLUMNS: &str = "id, invitee_user_id, invitee_name, invitee_username, \
                                  inviter_user_id, inviter_name, project_id, project_title, \
                                  role, created_at";

impl Invitation {
    /// Creates a new invitation
    pub async fn create(pool: &PgPool, data: CreateInvitation) -> Result<Self, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations (invitee_user_id, invitee_name, invitee_username,
                                     inviter_user_id, inviter_name, project_id, project_title,
                                     role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {INVITATION_COLUMNS}
            "#,
        ))
        .bind(data.invitee_user_id)
        .bind(data.invitee_name)
        .bind(data.invitee_username)
        .bind(data.inviter_user_id)
        .bind(data.inviter_name)
        .bind(data.project_id)
        .bind(data.project_title)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists all pending invitations addressed to a user
    pub async fn find_by_invitee(
        pool: &PgPool,
        invitee_user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS} FROM invitations
            WHERE invitee_user_id = $1
            ORDER BY created_at ASC
            "#,
        ))
        .bind(invitee_user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists all pending invitations for a project
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS} FROM invitations
            WHERE project_id = $1
            ORDER BY created_at ASC
            "#,
        ))
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes an invitation
    ///
    /// Returns false when no record existed, so replayed accepts and deletes
    /// surface as NotFound at the API layer.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invitations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Database operations are covered by the integration tests in
// taskhive-api/tests, which require a running Postgres.

/// User model and database operations
///
/// A user document carries identity (names, email, generated username,
/// password hash) plus two JSONB subdocument arrays: `project_refs` (the
/// projects the user belongs to, by id only) and `followed_tasks` (the
/// (task, project) pairs the user watches for new comments).
///
/// The membership workflow owns the consistency of `project_refs` against
/// each project's member list; the primitives here are the `$push` / `$pull`
/// analogues it builds on.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     username VARCHAR(64) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     project_refs JSONB NOT NULL DEFAULT '[]'::jsonb,
///     followed_tasks JSONB NOT NULL DEFAULT '[]'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         first_name: "Ada".to_string(),
///         last_name: "Lovelace".to_string(),
///         email: "ada@example.com".to_string(),
///         username: "AL417265".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// println!("Created user {}", user.id);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Reference to a project the user belongs to
///
/// Holds the id only; title, role and everything else live on the project
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// ID of the referenced project
    pub project_id: Uuid,
}

/// A (task, project) pair the user follows for new comments
///
/// The server keeps only this followed/unfollowed relation; the per-task
/// "last seen comment" cursor is client-held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedTask {
    /// ID of the followed task
    pub task_id: Uuid,

    /// ID of the project owning the task
    pub project_id: Uuid,
}

/// User account document
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Email address (stored lowercase, unique)
    pub email: String,

    /// Generated username: initials plus a random number (unique)
    pub username: String,

    /// Argon2id password hash; never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Projects the user belongs to
    #[sqlx(json)]
    pub project_refs: Vec<ProjectRef>,

    /// Tasks the user follows
    #[sqlx(json)]
    pub followed_tasks: Vec<FollowedTask>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    /// Stored as given; callers normalize to lowercase
    pub email: String,
    /// Pre-generated unique username
    pub username: String,
    /// Argon2id hash, never a plaintext password
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, username, password_hash, \
                            project_refs, followed_tasks, created_at";

impl User {
    /// Display name used for snapshots: "First Last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the user already follows the given task
    pub fn is_following(&self, task_id: Uuid) -> bool {
        self.followed_tasks.iter().any(|f| f.task_id == task_id)
    }

    /// Creates a new user with empty project and followed-task lists
    ///
    /// # Errors
    ///
    /// Fails on duplicate email or username (unique constraints) or any
    /// connection error.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, username, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.username)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (exact match on the stored lowercase form)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user document
    ///
    /// Callers must have already stripped the user from every project member
    /// list (the membership workflow owns that cascade).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends a project reference ($push analogue)
    pub async fn push_project_ref(
        pool: &PgPool,
        id: Uuid,
        project_ref: ProjectRef,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET project_refs = project_refs || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![project_ref]))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Removes a project reference ($pull analogue)
    pub async fn pull_project_ref(
        pool: &PgPool,
        id: Uuid,
        project_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET project_refs = COALESCE(
                (SELECT jsonb_agg(elem)
                 FROM jsonb_array_elements(project_refs) elem
                 WHERE (elem->>'project_id')::uuid <> $2),
                '[]'::jsonb
            )
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(project_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Appends a followed task ($push analogue)
    pub async fn push_followed_task(
        pool: &PgPool,
        id: Uuid,
        followed: FollowedTask,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET followed_tasks = followed_tasks || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![followed]))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Removes a followed task by task id ($pull analogue)
    pub async fn pull_followed_task(
        pool: &PgPool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET followed_tasks = COALESCE(
                (SELECT jsonb_agg(elem)
                 FROM jsonb_array_elements(followed_tasks) elem
                 WHERE (elem->>'task_id')::uuid <> $2),
                '[]'::jsonb
            )
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            username: "AL417265".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            project_refs: Vec::new(),
            followed_tasks: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user().display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_is_following() {
        let mut u = user();
        let task_id = Uuid::new_v4();
        assert!(!u.is_following(task_id));

        u.followed_tasks.push(FollowedTask {
            task_id,
            project_id: Uuid::new_v4(),
        });
        assert!(u.is_following(task_id));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let value = serde_json::to_value(user()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "ada@example.com");
    }

    // Database operations are covered by the integration tests in
    // taskhive-api/tests, which require a running Postgres.
}

/// Project model and database operations
///
/// A project is the aggregate document of the system: its member list, task
/// list and requirement list are JSONB subdocument arrays on the project row.
/// Handlers load the whole document, mutate the relevant array in memory and
/// persist it through one of the replace/push primitives below, the `$set` /
/// `$push` analogues of a document store. The primitives
/// replace exactly one array column atomically; they are never inlined at
/// call sites.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     repo_url VARCHAR(512),
///     members JSONB NOT NULL DEFAULT '[]'::jsonb,
///     tasks JSONB NOT NULL DEFAULT '[]'::jsonb,
///     requirements JSONB NOT NULL DEFAULT '[]'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::member::{Member, MemberRole};
/// use taskhive_shared::models::project::{CreateProject, Project};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let founder = Member {
///     user_id: Uuid::new_v4(),
///     name: "Ada Lovelace".to_string(),
///     username: "AL417265".to_string(),
///     role: MemberRole::TeamLeader,
/// };
///
/// let project = Project::create(
///     &pool,
///     CreateProject {
///         title: "Example Project".to_string(),
///         description: None,
///         repo_url: None,
///         founder,
///     },
/// )
/// .await?;
///
/// println!("Created project {}", project.id);
/// # Ok(())
/// # }
/// ```
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::member::Member;
use super::requirement::Requirement;
use super::task::Task;

/// Project document
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Project title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Optional link to an external repository
    pub repo_url: Option<String>,

    /// Ordered member list; never empty, user_id unique within the list
    #[sqlx(json)]
    pub members: Vec<Member>,

    /// Ordered task list with contiguous "T<n>" keys
    #[sqlx(json)]
    pub tasks: Vec<Task>,

    /// Ordered requirement list with contiguous "REQ-<n>" indices
    #[sqlx(json)]
    pub requirements: Vec<Requirement>,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
///
/// The founder becomes the sole initial member; the membership workflow
/// assigns them the Team Leader role before calling this.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    /// Sole initial member entry
    pub founder: Member,
}

const PROJECT_COLUMNS: &str =
    "id, title, description, repo_url, members, tasks, requirements, created_at";

impl Project {
    /// Finds a task subdocument by ID
    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Finds a requirement subdocument by its sequential index
    pub fn requirement(&self, index: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.index == index)
    }

    /// Creates a new project with the founder as sole member
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (title, description, repo_url, members)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.repo_url)
        .bind(Json(vec![data.founder]))
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a project document
    ///
    /// Callers must have already removed the project reference from every
    /// member (the membership workflow owns that cascade).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the whole member list ($set analogue)
    pub async fn replace_members(
        pool: &PgPool,
        id: Uuid,
        members: &[Member],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET members = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(members))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Replaces the whole task list ($set analogue)
    pub async fn replace_tasks(pool: &PgPool, id: Uuid, tasks: &[Task]) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET tasks = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(tasks))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Replaces the whole requirement list ($set analogue)
    pub async fn replace_requirements(
        pool: &PgPool,
        id: Uuid,
        requirements: &[Requirement],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET requirements = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(requirements))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Appends a member entry ($push analogue)
    pub async fn push_member(pool: &PgPool, id: Uuid, member: &Member) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET members = members || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![member]))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Removes a member entry by user id ($pull analogue)
    pub async fn pull_member(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE projects
            SET members = COALESCE(
                (SELECT jsonb_agg(elem)
                 FROM jsonb_array_elements(members) elem
                 WHERE (elem->>'user_id')::uuid <> $2),
                '[]'::jsonb
            )
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Appends a task ($push analogue)
    pub async fn push_task(pool: &PgPool, id: Uuid, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET tasks = tasks || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![task]))
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Appends a requirement ($push analogue)
    pub async fn push_requirement(
        pool: &PgPool,
        id: Uuid,
        requirement: &Requirement,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET requirements = requirements || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![requirement]))
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::MemberRole;
    use crate::models::task::{PersonSnapshot, TaskStatus};

    fn project() -> Project {
        let founder = Member {
            user_id: Uuid::new_v4(),
            name: "Ada Lovelace".to_string(),
            username: "AL417265".to_string(),
            role: MemberRole::TeamLeader,
        };

        Project {
            id: Uuid::new_v4(),
            title: "Example Project".to_string(),
            description: None,
            repo_url: None,
            members: vec![founder],
            tasks: Vec::new(),
            requirements: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_lookup_by_id() {
        let mut p = project();
        let reporter = PersonSnapshot {
            user_id: p.members[0].user_id,
            name: p.members[0].name.clone(),
        };
        let task = Task::new(
            "T1".to_string(),
            "Set up CI".to_string(),
            None,
            "Chore".to_string(),
            vec![reporter.clone()],
            reporter,
            TaskStatus::InDevelopment,
            None,
        );
        let task_id = task.id;
        p.tasks.push(task);

        assert!(p.task(task_id).is_some());
        assert!(p.task(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_requirement_lookup_by_index() {
        let mut p = project();
        p.requirements.push(Requirement {
            kind: "Functional".to_string(),
            index: "REQ-1".to_string(),
            system_name: "Auth".to_string(),
            trigger: String::new(),
            unwanted_trigger: None,
            preconditions: Vec::new(),
            system_responses: Vec::new(),
            full_text: "The system rejects bad credentials.".to_string(),
            feature: None,
            order: Vec::new(),
        });

        assert!(p.requirement("REQ-1").is_some());
        assert!(p.requirement("REQ-2").is_none());
    }

    // Database operations are covered by the integration tests in
    // taskhive-api/tests, which require a running Postgres.
}

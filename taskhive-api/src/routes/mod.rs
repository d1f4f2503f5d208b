/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check endpoint
/// - `users`: registration, login, account-scoped reads, follow checks
/// - `projects`: project CRUD and membership management
/// - `tasks`: task sub-resources (subtasks, status, comments)
/// - `requirements`: requirement sub-resources
/// - `invitations`: the invite → accept → join lifecycle
/// - `common`: shared lookups used across the modules
pub mod common;
pub mod health;
pub mod invitations;
pub mod projects;
pub mod requirements;
pub mod tasks;
pub mod users;

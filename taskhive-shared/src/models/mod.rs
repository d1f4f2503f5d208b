/// Document models for TaskHive
///
/// Three top-level documents back the whole system:
///
/// - `user`: accounts, project references and followed tasks
/// - `project`: the aggregate holding members, tasks and requirements
/// - `invitation`: pending membership offers
///
/// Tasks (`task`), requirements (`requirement`) and member entries
/// (`member`) are subdocument value types stored inside the project's JSONB
/// arrays; they have no tables of their own.
pub mod invitation;
pub mod member;
pub mod project;
pub mod requirement;
pub mod task;
pub mod user;

/// Project membership entries and roles
///
/// A member entry lives inside the owning project's `members` JSONB array and
/// carries a display snapshot (name, username) taken when the user joined.
/// Snapshots are intentionally never resynced after a rename.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a member holds within a single project
///
/// Stored as its display string both inside the project document and in the
/// `member_role` Postgres enum used by the invitations table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role")]
pub enum MemberRole {
    /// May invite/remove members, change roles, manage the task and
    /// requirement lists, and delete the project
    #[serde(rename = "Team Leader")]
    #[sqlx(rename = "Team Leader")]
    TeamLeader,

    /// Regular contributor
    #[serde(rename = "Developer")]
    #[sqlx(rename = "Developer")]
    Developer,

    /// External stakeholder with member-level access
    #[serde(rename = "Client")]
    #[sqlx(rename = "Client")]
    Client,
}

impl MemberRole {
    /// Role as its display string
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::TeamLeader => "Team Leader",
            MemberRole::Developer => "Developer",
            MemberRole::Client => "Client",
        }
    }

    /// Whether this role may perform structural project mutations
    /// (membership, roles, task/requirement lists, project deletion)
    pub fn is_leader(&self) -> bool {
        matches!(self, MemberRole::TeamLeader)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a project's member list
///
/// Invariants, maintained by the membership workflow: `user_id` is unique
/// within a project's list, and the list is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// ID of the user this entry belongs to
    pub user_id: Uuid,

    /// Display name snapshot ("First Last") taken at join time
    pub name: String,

    /// Username snapshot taken at join time
    pub username: String,

    /// Role within this project
    pub role: MemberRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(MemberRole::TeamLeader.as_str(), "Team Leader");
        assert_eq!(MemberRole::Developer.as_str(), "Developer");
        assert_eq!(MemberRole::Client.as_str(), "Client");
    }

    #[test]
    fn test_only_leader_is_leader() {
        assert!(MemberRole::TeamLeader.is_leader());
        assert!(!MemberRole::Developer.is_leader());
        assert!(!MemberRole::Client.is_leader());
    }

    #[test]
    fn test_role_serializes_as_display_string() {
        let json = serde_json::to_string(&MemberRole::TeamLeader).unwrap();
        assert_eq!(json, "\"Team Leader\"");

        let back: MemberRole = serde_json::from_str("\"Developer\"").unwrap();
        assert_eq!(back, MemberRole::Developer);
    }

    #[test]
    fn test_member_roundtrip() {
        let member = Member {
            user_id: Uuid::new_v4(),
            name: "Ada Lovelace".to_string(),
            username: "AL123456".to_string(),
            role: MemberRole::Client,
        };

        let json = serde_json::to_string(&member).unwrap();
        let back: Member = serde_json::from_str(&json).unwrap();
        assert_eq!(member, back);
    }
}

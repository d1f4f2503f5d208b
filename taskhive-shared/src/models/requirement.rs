/// Requirement subdocuments
///
/// Lightweight requirements-engineering records kept per project, stored in
/// the project's `requirements` JSONB array. The `index` field is a
/// sequential "REQ-<n>" value assigned by the server on creation, preserved
/// across updates, and renumbered on deletion like task keys.
use serde::{Deserialize, Serialize};

use crate::keys::Keyed;

/// A requirement inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement type, e.g. "Functional"
    #[serde(rename = "type")]
    pub kind: String,

    /// Sequential index, e.g. "REQ-3" (server-assigned)
    pub index: String,

    /// Name of the (sub)system the requirement applies to
    pub system_name: String,

    /// Triggering event
    #[serde(default)]
    pub trigger: String,

    /// Triggering event for unwanted behaviour, if any
    #[serde(default)]
    pub unwanted_trigger: Option<String>,

    /// Preconditions that must hold before the trigger
    #[serde(default)]
    pub preconditions: Vec<String>,

    /// Expected system responses
    #[serde(default)]
    pub system_responses: Vec<String>,

    /// Full requirement text
    pub full_text: String,

    /// Feature this requirement belongs to, if any
    #[serde(default)]
    pub feature: Option<String>,

    /// Ordering hints for the response steps
    #[serde(default)]
    pub order: Vec<String>,
}

impl Keyed for Requirement {
    const PREFIX: &'static str = "REQ-";

    fn key(&self) -> &str {
        &self.index
    }

    fn set_key(&mut self, key: String) {
        self.index = key;
    }
}

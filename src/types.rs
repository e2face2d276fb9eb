//! Core types for scheduled-merge

use serde::{Deserialize, Serialize};

/// Value of `detailed_merge_status` when GitLab would accept a merge right now
pub const MERGE_STATUS_MERGEABLE: &str = "mergeable";

/// A GitLab merge request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
    /// Global MR id
    pub id: u64,
    /// Project-scoped MR number (`!iid`)
    pub iid: u64,
    /// Project the MR belongs to
    pub project_id: u64,
    /// MR title
    pub title: String,
    /// Web URL for the MR
    pub web_url: String,
    /// Source branch; the schedule document is read from here
    pub source_branch: String,
    /// GitLab's detailed merge status, e.g. "mergeable", "conflict", "ci_still_running"
    #[serde(default)]
    pub detailed_merge_status: String,
}

impl MergeRequest {
    /// Whether GitLab reports the MR as mergeable
    pub fn is_mergeable(&self) -> bool {
        self.detailed_merge_status == MERGE_STATUS_MERGEABLE
    }
}

/// A note (comment) on a merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MrNote {
    /// Note id
    pub id: u64,
    /// Markdown body
    pub body: String,
    /// User id of the author
    pub author_id: u64,
    /// Whether GitLab generated this note (label changes, merges, ...)
    pub system: bool,
}

/// A GitLab user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User id
    pub id: u64,
    /// Login name
    pub username: String,
}

impl std::fmt::Display for MergeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{} ({})", self.iid, self.title)
    }
}

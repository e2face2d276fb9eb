//! Platform services for GitLab
//!
//! Provides the interface the merge engine uses to talk to the
//! repository-hosting service.

mod gitlab;

pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{MergeRequest, MrNote, User};
use async_trait::async_trait;

/// Platform service trait for MR operations
///
/// This trait abstracts the remote service so the merge engine can be
/// driven by GitLab in production and by a mock in tests.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// The user the service is authenticated as
    async fn current_user(&self) -> Result<User>;

    /// List open MRs carrying `label`, across all pages
    async fn list_mrs_with_label(&self, label: &str) -> Result<Vec<MergeRequest>>;

    /// Fetch the raw contents of `path` at the MR's source branch
    async fn get_file_from_mr_branch(&self, mr: &MergeRequest, path: &str) -> Result<Vec<u8>>;

    /// Re-read the MR's current state
    async fn refresh_mr(&self, mr: &MergeRequest) -> Result<MergeRequest>;

    /// Merge the MR and remove its source branch
    async fn merge_mr(&self, mr: &MergeRequest) -> Result<()>;

    /// List notes on the MR, newest first
    async fn list_mr_notes(&self, mr: &MergeRequest) -> Result<Vec<MrNote>>;

    /// Create a note on the MR
    async fn create_mr_note(&self, mr: &MergeRequest, body: &str) -> Result<()>;

    /// Replace the body of an existing note
    async fn update_mr_note(&self, mr: &MergeRequest, note_id: u64, body: &str) -> Result<()>;
}

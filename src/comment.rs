//! Feedback comments on merge requests
//!
//! Every outcome category has a fixed title. Posting a comment first looks at
//! the most recent note written by the service account: if it carries the
//! same title it is updated in place, otherwise a new note is created. Older
//! notes are never considered.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::MergeRequest;
use tracing::debug;

/// Title for failures to load or evaluate the schedule
pub const COMMENT_MERGE_SCHEDULING_FAILED: &str = "Failed to schedule merge";
/// Title for MRs whose window is open but which GitLab won't merge
pub const COMMENT_MERGE_SKIPPED: &str = "Not merging automatically";
/// Title for MRs waiting for their next window
pub const COMMENT_MERGE_SCHEDULED: &str = "Merge scheduled";
/// Title for failed refresh or merge attempts
pub const COMMENT_MERGE_FAILED: &str = "Failed to merge";

/// Render a comment body: bold title line, blank line, message
pub fn format_comment(title: &str, message: &str) -> String {
    format!("**{title}**\n\n{message}")
}

/// Extract the title of a comment written by [`format_comment`]
///
/// Returns `None` if the body does not start with a bold segment.
pub fn extract_title(body: &str) -> Option<&str> {
    let rest = body.strip_prefix("**")?;
    let end = rest.find("**")?;
    Some(&rest[..end])
}

/// Posts title-keyed comments on behalf of one service account
pub struct CommentPoster<'a> {
    platform: &'a dyn PlatformService,
    author_id: u64,
}

impl<'a> CommentPoster<'a> {
    /// Create a poster for comments authored by user `author_id`
    pub fn new(platform: &'a dyn PlatformService, author_id: u64) -> Self {
        Self {
            platform,
            author_id,
        }
    }

    /// Post `message` under `title`, updating our latest note if it has the same title
    pub async fn post(&self, mr: &MergeRequest, title: &str, message: &str) -> Result<()> {
        let body = format_comment(title, message);
        let to_comment_error = |e: Error| Error::CommentPost {
            iid: mr.iid,
            reason: e.to_string(),
        };

        let notes = self
            .platform
            .list_mr_notes(mr)
            .await
            .map_err(to_comment_error)?;

        let latest_own = notes
            .iter()
            .find(|n| !n.system && n.author_id == self.author_id);

        if let Some(note) = latest_own.filter(|n| extract_title(&n.body) == Some(title)) {
            debug!(mr_iid = mr.iid, note_id = note.id, title, "updating own comment");
            return self
                .platform
                .update_mr_note(mr, note.id, &body)
                .await
                .map_err(to_comment_error);
        }

        debug!(mr_iid = mr.iid, title, "creating comment");
        self.platform
            .create_mr_note(mr, &body)
            .await
            .map_err(to_comment_error)
    }
}

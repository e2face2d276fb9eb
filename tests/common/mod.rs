//! Shared fixtures for integration and unit tests

#![allow(dead_code, unused_imports)]

mod mock_platform;

pub use mock_platform::{BOT_USER_ID, CreateNoteCall, MockPlatformService, UpdateNoteCall};

use chrono::{DateTime, Utc};
use scheduled_merge::types::{MERGE_STATUS_MERGEABLE, MergeRequest};

/// "Now" used throughout the tests: Thursday of ISO week 26, 10:30 in Zurich
pub const NOW: &str = "2024-06-27T10:30:00+02:00";

/// Parse an RFC 3339 timestamp into UTC
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// The fixed test instant
pub fn now() -> DateTime<Utc> {
    at(NOW)
}

/// An MR in project 7 with the given detailed merge status
pub fn make_mr(iid: u64, status: &str) -> MergeRequest {
    MergeRequest {
        id: 100 + iid,
        iid,
        project_id: 7,
        title: format!("MR {iid}"),
        web_url: format!("https://gitlab.example.com/group/repo/-/merge_requests/{iid}"),
        source_branch: format!("feature-{iid}"),
        detailed_merge_status: status.to_string(),
    }
}

/// A mergeable MR
pub fn mergeable_mr(iid: u64) -> MergeRequest {
    make_mr(iid, MERGE_STATUS_MERGEABLE)
}

/// Schedule with a single window
pub fn single_window(cron: &str, location: &str, iso_week: &str, max_delay: &str) -> String {
    format!(
        "mergeWindows:\n- schedule:\n    cron: '{cron}'\n    isoWeek: '{iso_week}'\n    location: '{location}'\n  maxDelay: '{max_delay}'\n"
    )
}

/// Daily 10:00 Zurich window, open at [`NOW`]
pub fn active_window() -> String {
    single_window("0 10 * * *", "Europe/Zurich", "", "1h")
}

/// Daily 20:00 Zurich window, closed at [`NOW`]
pub fn inactive_window() -> String {
    single_window("0 20 * * *", "Europe/Zurich", "", "1h")
}

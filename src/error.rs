//! Error types for scheduled-merge

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// All errors produced by scheduled-merge
#[derive(Debug, Error)]
pub enum Error {
    /// The schedule document could not be fetched from the MR's branch
    #[error("failed to fetch config file: {0}")]
    ConfigFetch(String),

    /// The schedule document is not valid YAML or has the wrong shape
    #[error("failed to parse config file: {0}")]
    ConfigParse(String),

    /// A merge window names a timezone that does not exist
    #[error("failed to load location for merge window: unknown time zone {0}")]
    InvalidTimezone(String),

    /// A merge window's cron expression cannot be parsed
    #[error("failed to parse cron schedule '{expression}': {reason}")]
    InvalidCronExpression {
        /// The expression as written in the schedule document
        expression: String,
        /// Why it was rejected
        reason: String,
    },

    /// The `isoWeek` value is none of "", "@even", "@odd" or a number
    #[error("unknown iso week: {0}")]
    UnrecognizedIsoWeekFilter(String),

    /// No recurrence instance satisfied the ISO-week filter within the search bound
    #[error("could not find next run, max time: {last_candidate}")]
    NoMatchingActivationFound {
        /// The last candidate inspected before giving up (RFC 3339)
        last_candidate: String,
    },

    /// A duration string such as `maxDelay` is malformed
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The offending input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Re-reading the MR before merging failed
    #[error("failed to refresh MR: {0}")]
    Refresh(String),

    /// GitLab refused or failed the merge
    #[error("failed to merge MR: {0}")]
    MergeExecution(String),

    /// Posting feedback on the MR failed; the user was not informed
    #[error("failed to comment on MR !{iid}: {reason}")]
    CommentPost {
        /// MR the comment was meant for
        iid: u64,
        /// Underlying failure
        reason: String,
    },

    /// GitLab API error
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid service configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// One or more MRs of a batch run failed
    #[error("{} merge request(s) failed: {}", .0.len(), format_aggregate(.0))]
    Aggregate(Vec<Error>),
}

fn format_aggregate(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! Per-MR processing: fetch schedule, decide, merge or report

use crate::comment::{
    COMMENT_MERGE_FAILED, COMMENT_MERGE_SCHEDULED, COMMENT_MERGE_SCHEDULING_FAILED,
    COMMENT_MERGE_SKIPPED, CommentPoster,
};
use crate::config::TaskConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::schedule::{Decision, ScheduleDocument, ScheduledWindow, resolve};
use crate::types::MergeRequest;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// What happened to one MR during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The MR was merged; no comment is posted
    Merged,
    /// A window was open but GitLab reported the MR as not mergeable
    SkippedNotMergeable {
        /// GitLab's detailed merge status at refresh time
        status: String,
    },
    /// Refreshing or merging the MR failed
    MergeFailed {
        /// Error message shown in the comment
        reason: String,
    },
    /// No window was open; the next one was announced
    Scheduled(ScheduledWindow),
    /// The schedule could not be fetched, parsed or evaluated
    ScheduleFailed {
        /// Error message shown in the comment
        reason: String,
    },
}

impl std::fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged => write!(f, "merged"),
            Self::SkippedNotMergeable { status } => write!(f, "skipped (status: {status})"),
            Self::MergeFailed { reason } => write!(f, "merge failed: {reason}"),
            Self::Scheduled(window) if !window.configured => write!(f, "no merge windows"),
            Self::Scheduled(window) => write!(
                f,
                "scheduled for {}",
                window.zone.format(window.start)
            ),
            Self::ScheduleFailed { reason } => write!(f, "scheduling failed: {reason}"),
        }
    }
}

/// Drives one MR from schedule document to merge or comment
///
/// Every failure except a failed comment is reported to the MR as a comment
/// and turned into a [`RequestOutcome`]. The returned error therefore always
/// means the MR's author was not informed.
pub struct MergeEngine {
    platform: Arc<dyn PlatformService>,
    config: TaskConfig,
    author_id: u64,
}

impl MergeEngine {
    /// Create an engine commenting as user `author_id`
    pub fn new(platform: Arc<dyn PlatformService>, config: TaskConfig, author_id: u64) -> Self {
        Self {
            platform,
            config,
            author_id,
        }
    }

    /// The platform this engine acts on
    pub fn platform(&self) -> &dyn PlatformService {
        self.platform.as_ref()
    }

    /// The task configuration
    pub const fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Fetch the MR's schedule document and act on it
    pub async fn process(&self, mr: &MergeRequest, now: DateTime<Utc>) -> Result<RequestOutcome> {
        let document = self
            .platform
            .get_file_from_mr_branch(mr, &self.config.config_file_path)
            .await
            .map_err(|e| Error::ConfigFetch(e.to_string()));
        self.process_document(mr, document, now).await
    }

    /// Act on an already fetched (or failed) schedule document
    pub async fn process_document(
        &self,
        mr: &MergeRequest,
        document: Result<Vec<u8>>,
        now: DateTime<Utc>,
    ) -> Result<RequestOutcome> {
        let bytes = match document {
            Ok(bytes) => bytes,
            Err(e) => {
                let message = format!(
                    "Could not load config file `{}`.\n\n{e}",
                    self.config.config_file_path
                );
                return self.report_schedule_failure(mr, message).await;
            }
        };

        let schedule = match ScheduleDocument::from_yaml(&bytes) {
            Ok(schedule) => schedule,
            Err(e) => {
                let message = format!("Error while parsing config file.\n\n{e}");
                return self.report_schedule_failure(mr, message).await;
            }
        };

        let decision = resolve(&schedule.merge_windows, now);
        debug!(mr_iid = mr.iid, ?decision, "resolved schedule");
        match decision {
            Decision::EvaluationFailed(e) => {
                let message = format!("Error while parsing merge windows.\n\n{e}");
                self.report_schedule_failure(mr, message).await
            }
            Decision::MergeNow => self.merge(mr).await,
            Decision::ReportWindow(window) => self.report_window(mr, window).await,
        }
    }

    async fn merge(&self, mr: &MergeRequest) -> Result<RequestOutcome> {
        // Other merges since the listing may have introduced conflicts
        let refreshed = match self.platform.refresh_mr(mr).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                let reason = Error::Refresh(e.to_string()).to_string();
                let message = format!("Error while refreshing merge request data.\n\n{reason}");
                return self
                    .comment(
                        mr,
                        COMMENT_MERGE_FAILED,
                        &message,
                        RequestOutcome::MergeFailed { reason },
                    )
                    .await;
            }
        };

        if !refreshed.is_mergeable() {
            let status = refreshed.detailed_merge_status;
            let message = format!("MR is not mergeable. Current status: {status}");
            return self
                .comment(
                    mr,
                    COMMENT_MERGE_SKIPPED,
                    &message,
                    RequestOutcome::SkippedNotMergeable { status },
                )
                .await;
        }

        if let Err(e) = self.platform.merge_mr(&refreshed).await {
            let reason = Error::MergeExecution(e.to_string()).to_string();
            let message = format!("Error while merging.\n\n{reason}");
            return self
                .comment(
                    mr,
                    COMMENT_MERGE_FAILED,
                    &message,
                    RequestOutcome::MergeFailed { reason },
                )
                .await;
        }

        Ok(RequestOutcome::Merged)
    }

    async fn report_window(
        &self,
        mr: &MergeRequest,
        window: ScheduledWindow,
    ) -> Result<RequestOutcome> {
        let mut message = if window.configured {
            format!(
                "This MR will be merged between {} and {}.",
                window.zone.format(window.start),
                window.zone.format(window.end)
            )
        } else {
            format!(
                "No merge windows are configured in `{}`. This MR will not be merged automatically.",
                self.config.config_file_path
            )
        };

        if !mr.is_mergeable() {
            message = format!(
                "{message}\n\nWarning: This merge request is currently not mergeable. Current status: {}",
                mr.detailed_merge_status
            );
        }

        self.comment(
            mr,
            COMMENT_MERGE_SCHEDULED,
            &message,
            RequestOutcome::Scheduled(window),
        )
        .await
    }

    async fn report_schedule_failure(
        &self,
        mr: &MergeRequest,
        reason: String,
    ) -> Result<RequestOutcome> {
        self.comment(
            mr,
            COMMENT_MERGE_SCHEDULING_FAILED,
            &reason,
            RequestOutcome::ScheduleFailed {
                reason: reason.clone(),
            },
        )
        .await
    }

    async fn comment(
        &self,
        mr: &MergeRequest,
        title: &str,
        message: &str,
        outcome: RequestOutcome,
    ) -> Result<RequestOutcome> {
        CommentPoster::new(self.platform.as_ref(), self.author_id)
            .post(mr, title, message)
            .await?;
        Ok(outcome)
    }
}

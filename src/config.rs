//! Service configuration

use crate::error::{Error, Result};
use url::Url;

/// Default GitLab API endpoint
pub const DEFAULT_GITLAB_BASE_URL: &str = "https://gitlab.com/api/v4";

/// Default label marking MRs for scheduled merging
pub const DEFAULT_SCHEDULED_LABEL: &str = "scheduled";

/// Default location of the schedule document inside a repository
pub const DEFAULT_CONFIG_FILE_PATH: &str = ".merge-schedule.yml";

/// Connection settings for the GitLab API
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Personal or project access token
    pub access_token: String,
    /// API root, e.g. `https://gitlab.example.com/api/v4`
    pub base_url: Url,
}

impl GitLabConfig {
    /// Validate and build GitLab connection settings
    pub fn new(access_token: &str, base_url: &str) -> Result<Self> {
        let access_token = access_token.trim();
        if access_token.is_empty() {
            return Err(Error::Config(
                "a GitLab access token is required (--gitlab-token or GITLAB_TOKEN)".to_string(),
            ));
        }

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid GitLab base URL '{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "GitLab base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        Ok(Self {
            access_token: access_token.to_string(),
            base_url,
        })
    }
}

/// What a batch run looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    /// Label marking MRs for scheduled merging
    pub scheduled_label: String,
    /// Path of the schedule document in the MR's repository
    pub config_file_path: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            scheduled_label: DEFAULT_SCHEDULED_LABEL.to_string(),
            config_file_path: DEFAULT_CONFIG_FILE_PATH.to_string(),
        }
    }
}

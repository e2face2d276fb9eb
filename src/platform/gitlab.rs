//! GitLab platform service implementation

use crate::config::GitLabConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{MergeRequest, MrNote, User};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MRs requested per page when listing
const PAGE_SIZE: &str = "20";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
}

#[derive(Deserialize)]
struct NoteAuthor {
    id: u64,
}

#[derive(Deserialize)]
struct Note {
    id: u64,
    body: String,
    author: NoteAuthor,
    #[serde(default)]
    system: bool,
}

impl From<Note> for MrNote {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            body: note.body,
            author_id: note.author.id,
            system: note.system,
        }
    }
}

#[derive(Serialize)]
struct NotePayload<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct AcceptMrPayload {
    should_remove_source_branch: bool,
}

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(config: &GitLabConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("scheduled-merge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: config.access_token.clone(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn mr_url(&self, mr: &MergeRequest, suffix: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests/{}{}",
            mr.project_id, mr.iid, suffix
        ))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", &self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authed(request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn current_user(&self) -> Result<User> {
        debug!("fetching current user");
        let user: User = self
            .send(self.client.get(self.api_url("/user")))
            .await?
            .json()
            .await?;
        debug!(user_id = user.id, username = %user.username, "authenticated");
        Ok(user)
    }

    async fn list_mrs_with_label(&self, label: &str) -> Result<Vec<MergeRequest>> {
        debug!(label, "listing MRs with label");
        let url = self.api_url("/merge_requests");
        let mut all_mrs = Vec::new();
        let mut page = "1".to_string();

        loop {
            let response = self
                .send(self.client.get(&url).query(&[
                    ("state", "opened"),
                    ("labels", label),
                    ("scope", "all"),
                    ("with_merge_status_recheck", "true"),
                    ("per_page", PAGE_SIZE),
                    ("page", page.as_str()),
                ]))
                .await?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string);

            let mrs: Vec<MergeRequest> = response.json().await?;
            all_mrs.extend(mrs);

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!(label, count = all_mrs.len(), "listed MRs");
        Ok(all_mrs)
    }

    async fn get_file_from_mr_branch(&self, mr: &MergeRequest, path: &str) -> Result<Vec<u8>> {
        debug!(mr_iid = mr.iid, path, branch = %mr.source_branch, "fetching file");
        let url = self.api_url(&format!(
            "/projects/{}/repository/files/{}/raw",
            mr.project_id,
            urlencoding::encode(path)
        ));

        let bytes = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("ref", mr.source_branch.as_str())]),
            )
            .await?
            .bytes()
            .await?;

        debug!(mr_iid = mr.iid, size = bytes.len(), "fetched file");
        Ok(bytes.to_vec())
    }

    async fn refresh_mr(&self, mr: &MergeRequest) -> Result<MergeRequest> {
        debug!(mr_iid = mr.iid, "refreshing MR");
        let refreshed: MergeRequest = self
            .send(self.client.get(self.mr_url(mr, "")))
            .await?
            .json()
            .await?;
        debug!(
            mr_iid = mr.iid,
            status = %refreshed.detailed_merge_status,
            "refreshed MR"
        );
        Ok(refreshed)
    }

    async fn merge_mr(&self, mr: &MergeRequest) -> Result<()> {
        debug!(mr_iid = mr.iid, "merging MR");
        self.send(
            self.client
                .put(self.mr_url(mr, "/merge"))
                .json(&AcceptMrPayload {
                    should_remove_source_branch: true,
                }),
        )
        .await?;
        debug!(mr_iid = mr.iid, "merged MR");
        Ok(())
    }

    async fn list_mr_notes(&self, mr: &MergeRequest) -> Result<Vec<MrNote>> {
        debug!(mr_iid = mr.iid, "listing MR notes");
        let notes: Vec<Note> = self
            .send(
                self.client
                    .get(self.mr_url(mr, "/notes"))
                    .query(&[("sort", "desc"), ("order_by", "created_at")]),
            )
            .await?
            .json()
            .await?;

        let notes: Vec<MrNote> = notes.into_iter().map(Into::into).collect();
        debug!(mr_iid = mr.iid, count = notes.len(), "listed MR notes");
        Ok(notes)
    }

    async fn create_mr_note(&self, mr: &MergeRequest, body: &str) -> Result<()> {
        debug!(mr_iid = mr.iid, "creating MR note");
        self.send(
            self.client
                .post(self.mr_url(mr, "/notes"))
                .json(&NotePayload { body }),
        )
        .await?;
        debug!(mr_iid = mr.iid, "created MR note");
        Ok(())
    }

    async fn update_mr_note(&self, mr: &MergeRequest, note_id: u64, body: &str) -> Result<()> {
        debug!(mr_iid = mr.iid, note_id, "updating MR note");
        self.send(
            self.client
                .put(self.mr_url(mr, &format!("/notes/{note_id}")))
                .json(&NotePayload { body }),
        )
        .await?;
        debug!(mr_iid = mr.iid, note_id, "updated MR note");
        Ok(())
    }
}

//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use scheduled_merge::error::{Error, Result};
use scheduled_merge::platform::PlatformService;
use scheduled_merge::types::{MergeRequest, MrNote, User};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// User id the mock authenticates as
pub const BOT_USER_ID: u64 = 42;

/// Call record for `create_mr_note`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNoteCall {
    pub iid: u64,
    pub body: String,
}

/// Call record for `update_mr_note`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNoteCall {
    pub iid: u64,
    pub note_id: u64,
    pub body: String,
}

/// Simple mock platform service for testing
///
/// Features:
/// - Per-MR schedule files, refresh responses and notes
/// - Notes behave like GitLab: created notes appear newest-first
/// - Call tracking for verification
/// - Error injection per MR for failure path testing
pub struct MockPlatformService {
    next_note_id: AtomicU64,
    mrs: Mutex<Vec<MergeRequest>>,
    files: Mutex<HashMap<u64, Vec<u8>>>,
    refresh_responses: Mutex<HashMap<u64, MergeRequest>>,
    notes: Mutex<HashMap<u64, Vec<MrNote>>>,
    // Call tracking
    get_file_calls: Mutex<Vec<(u64, String)>>,
    refresh_calls: Mutex<Vec<u64>>,
    merge_calls: Mutex<Vec<u64>>,
    create_note_calls: Mutex<Vec<CreateNoteCall>>,
    update_note_calls: Mutex<Vec<UpdateNoteCall>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    error_on_get_file: Mutex<HashMap<u64, String>>,
    error_on_refresh: Mutex<HashMap<u64, String>>,
    error_on_merge: Mutex<HashMap<u64, String>>,
    error_on_comment: Mutex<HashMap<u64, String>>,
}

impl MockPlatformService {
    /// Create an empty mock
    pub fn new() -> Self {
        Self {
            next_note_id: AtomicU64::new(1000),
            mrs: Mutex::new(Vec::new()),
            files: Mutex::new(HashMap::new()),
            refresh_responses: Mutex::new(HashMap::new()),
            notes: Mutex::new(HashMap::new()),
            get_file_calls: Mutex::new(Vec::new()),
            refresh_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            create_note_calls: Mutex::new(Vec::new()),
            update_note_calls: Mutex::new(Vec::new()),
            error_on_list: Mutex::new(None),
            error_on_get_file: Mutex::new(HashMap::new()),
            error_on_refresh: Mutex::new(HashMap::new()),
            error_on_merge: Mutex::new(HashMap::new()),
            error_on_comment: Mutex::new(HashMap::new()),
        }
    }

    // === Setup methods ===

    /// Add an MR to the labelled listing, with its schedule file
    pub fn add_mr(&self, mr: MergeRequest, schedule_yaml: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(mr.iid, schedule_yaml.as_bytes().to_vec());
        self.mrs.lock().unwrap().push(mr);
    }

    /// Add an MR to the labelled listing without a schedule file
    pub fn add_mr_without_file(&self, mr: MergeRequest) {
        self.mrs.lock().unwrap().push(mr);
    }

    /// Set the state returned by `refresh_mr` (defaults to the listed MR)
    pub fn set_refresh_response(&self, mr: MergeRequest) {
        self.refresh_responses.lock().unwrap().insert(mr.iid, mr);
    }

    /// Seed existing notes on an MR, newest first
    pub fn set_notes(&self, iid: u64, notes: Vec<MrNote>) {
        self.notes.lock().unwrap().insert(iid, notes);
    }

    // === Error injection methods ===

    /// Make `list_mrs_with_label` return an error
    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_file_from_mr_branch` fail for an MR
    pub fn fail_get_file(&self, iid: u64, msg: &str) {
        self.error_on_get_file
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    /// Make `refresh_mr` fail for an MR
    pub fn fail_refresh(&self, iid: u64, msg: &str) {
        self.error_on_refresh
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    /// Make `merge_mr` fail for an MR
    pub fn fail_merge(&self, iid: u64, msg: &str) {
        self.error_on_merge.lock().unwrap().insert(iid, msg.to_string());
    }

    /// Make note creation and updates fail for an MR
    pub fn fail_comment(&self, iid: u64, msg: &str) {
        self.error_on_comment
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    // === Call verification methods ===

    /// Current notes on an MR, newest first
    pub fn notes(&self, iid: u64) -> Vec<MrNote> {
        self.notes
            .lock()
            .unwrap()
            .get(&iid)
            .cloned()
            .unwrap_or_default()
    }

    /// Get all `get_file_from_mr_branch` calls as (iid, path)
    pub fn get_file_calls(&self) -> Vec<(u64, String)> {
        self.get_file_calls.lock().unwrap().clone()
    }

    /// Get all `refresh_mr` calls
    pub fn get_refresh_calls(&self) -> Vec<u64> {
        self.refresh_calls.lock().unwrap().clone()
    }

    /// Get all `merge_mr` calls
    pub fn get_merge_calls(&self) -> Vec<u64> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Get all `create_mr_note` calls
    pub fn get_create_note_calls(&self) -> Vec<CreateNoteCall> {
        self.create_note_calls.lock().unwrap().clone()
    }

    /// Get all `update_mr_note` calls
    pub fn get_update_note_calls(&self) -> Vec<UpdateNoteCall> {
        self.update_note_calls.lock().unwrap().clone()
    }

    /// Assert that `merge_mr` was called for an MR
    pub fn assert_merge_called(&self, iid: u64) {
        let calls = self.get_merge_calls();
        assert!(
            calls.contains(&iid),
            "Expected merge_mr(!{iid}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_mr` was NOT called for an MR
    pub fn assert_merge_not_called(&self, iid: u64) {
        let calls = self.get_merge_calls();
        assert!(
            !calls.contains(&iid),
            "Expected merge_mr(!{iid}) NOT to be called but it was: {calls:?}"
        );
    }

    /// The single note on an MR, asserting there is exactly one
    pub fn only_note(&self, iid: u64) -> MrNote {
        let notes = self.notes(iid);
        assert_eq!(notes.len(), 1, "Expected exactly one note on !{iid}: {notes:?}");
        notes.into_iter().next().unwrap()
    }

    fn injected(map: &Mutex<HashMap<u64, String>>, iid: u64) -> Result<()> {
        match map.lock().unwrap().get(&iid) {
            Some(msg) => Err(Error::GitLabApi(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn current_user(&self) -> Result<User> {
        Ok(User {
            id: BOT_USER_ID,
            username: "merge-bot".to_string(),
        })
    }

    async fn list_mrs_with_label(&self, _label: &str) -> Result<Vec<MergeRequest>> {
        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(msg.clone()));
        }
        Ok(self.mrs.lock().unwrap().clone())
    }

    async fn get_file_from_mr_branch(&self, mr: &MergeRequest, path: &str) -> Result<Vec<u8>> {
        self.get_file_calls
            .lock()
            .unwrap()
            .push((mr.iid, path.to_string()));
        Self::injected(&self.error_on_get_file, mr.iid)?;

        self.files
            .lock()
            .unwrap()
            .get(&mr.iid)
            .cloned()
            .ok_or_else(|| Error::GitLabApi("404 File Not Found".to_string()))
    }

    async fn refresh_mr(&self, mr: &MergeRequest) -> Result<MergeRequest> {
        self.refresh_calls.lock().unwrap().push(mr.iid);
        Self::injected(&self.error_on_refresh, mr.iid)?;

        let responses = self.refresh_responses.lock().unwrap();
        Ok(responses.get(&mr.iid).cloned().unwrap_or_else(|| mr.clone()))
    }

    async fn merge_mr(&self, mr: &MergeRequest) -> Result<()> {
        self.merge_calls.lock().unwrap().push(mr.iid);
        Self::injected(&self.error_on_merge, mr.iid)
    }

    async fn list_mr_notes(&self, mr: &MergeRequest) -> Result<Vec<MrNote>> {
        Ok(self.notes(mr.iid))
    }

    async fn create_mr_note(&self, mr: &MergeRequest, body: &str) -> Result<()> {
        self.create_note_calls.lock().unwrap().push(CreateNoteCall {
            iid: mr.iid,
            body: body.to_string(),
        });
        Self::injected(&self.error_on_comment, mr.iid)?;

        let note = MrNote {
            id: self.next_note_id.fetch_add(1, Ordering::SeqCst),
            body: body.to_string(),
            author_id: BOT_USER_ID,
            system: false,
        };
        self.notes
            .lock()
            .unwrap()
            .entry(mr.iid)
            .or_default()
            .insert(0, note);
        Ok(())
    }

    async fn update_mr_note(&self, mr: &MergeRequest, note_id: u64, body: &str) -> Result<()> {
        self.update_note_calls.lock().unwrap().push(UpdateNoteCall {
            iid: mr.iid,
            note_id,
            body: body.to_string(),
        });
        Self::injected(&self.error_on_comment, mr.iid)?;

        let mut notes = self.notes.lock().unwrap();
        let note = notes
            .get_mut(&mr.iid)
            .and_then(|notes| notes.iter_mut().find(|n| n.id == note_id))
            .ok_or_else(|| Error::GitLabApi(format!("404 Note {note_id} Not Found")))?;
        note.body = body.to_string();
        Ok(())
    }
}

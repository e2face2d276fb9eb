//! The per-repository schedule document

use crate::error::{Error, Result};
use crate::schedule::window::WindowDefinition;
use serde::Deserialize;

/// Parsed contents of the schedule file on an MR's source branch
///
/// Window order is significant: the first active window wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDocument {
    /// Merge windows in document order
    #[serde(default)]
    pub merge_windows: Vec<WindowDefinition>,
}

impl ScheduleDocument {
    /// Parse a schedule document from raw YAML bytes
    ///
    /// An empty file is an empty schedule. Window contents are not validated
    /// here; bad cron expressions or zones surface when windows are evaluated.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(bytes).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

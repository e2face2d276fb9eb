//! scheduled-merge: merge labelled GitLab merge requests inside merge windows
//!
//! Each repository declares its merge windows in a YAML file on the MR's
//! source branch. A periodic batch scans every MR carrying the scheduling
//! label, merges the ones whose window is open and comments the next window
//! on the others.

pub mod clock;
pub mod comment;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod platform;
pub mod schedule;
pub mod trigger;
pub mod types;

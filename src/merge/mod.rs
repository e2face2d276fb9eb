//! Merge engine for scheduled MRs
//!
//! Three phases per MR, matching the split between `schedule` and here:
//! 1. Gather - fetch the schedule document from the MR's branch (effectful)
//! 2. Decide - `schedule::resolve` (pure, testable)
//! 3. Act - merge or comment (effectful)

mod batch;
mod engine;

pub use batch::{BatchReport, BatchRunner, ProcessedRequest};
pub use engine::{MergeEngine, RequestOutcome};

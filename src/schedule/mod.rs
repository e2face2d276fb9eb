//! Merge schedules: windows, their evaluation and the resulting decision
//!
//! Everything in here is pure: "now" is always passed in, nothing talks to
//! GitLab. The effectful side lives in [`crate::merge`].

pub mod recurrence;
pub mod duration;
mod document;
mod resolve;
mod window;

pub use document::ScheduleDocument;
pub use resolve::{Decision, NO_SCHEDULE_HORIZON_HOURS, ScheduledWindow, resolve};
pub use window::{
    Activation, EvaluationZone, IsoWeekFilter, MAX_ACTIVATION_CANDIDATES, WindowDefinition,
    WindowSchedule, next_activation,
};

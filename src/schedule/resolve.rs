//! Combining a schedule's windows into one decision (pure, no I/O)

use crate::error::Error;
use crate::schedule::window::{EvaluationZone, WindowDefinition, next_activation};
use chrono::{DateTime, TimeDelta, Utc};

/// Hours ahead of "now" at which the "nothing scheduled" placeholder window is placed
pub const NO_SCHEDULE_HORIZON_HOURS: i64 = 1_000_000;

/// The next time an MR may be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledWindow {
    /// When the window opens
    pub start: DateTime<Utc>,
    /// When the window closes (`start + max_delay`)
    pub end: DateTime<Utc>,
    /// Zone for presenting `start` and `end`
    pub zone: EvaluationZone,
    /// `false` for the placeholder returned when no windows are configured
    pub configured: bool,
}

impl ScheduledWindow {
    /// Placeholder for a schedule without windows, far in the future
    pub fn unscheduled(now: DateTime<Utc>) -> Self {
        let start = now
            .checked_add_signed(TimeDelta::hours(NO_SCHEDULE_HORIZON_HOURS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            start,
            end: start,
            zone: EvaluationZone::Named(chrono_tz::UTC),
            configured: false,
        }
    }
}

/// Outcome of evaluating a schedule at one instant
#[derive(Debug)]
pub enum Decision {
    /// A window is open: merge now
    MergeNow,
    /// No window is open: report the next one
    ReportWindow(ScheduledWindow),
    /// A window could not be evaluated
    EvaluationFailed(Error),
}

/// Decide what to do with an MR given its windows, in document order
///
/// The first window that is open wins, even if a later window opened
/// earlier. When none is open, the earliest upcoming opening across all
/// windows is reported. Evaluation stops at the first error.
pub fn resolve(windows: &[WindowDefinition], now: DateTime<Utc>) -> Decision {
    let mut earliest: Option<(DateTime<Utc>, &WindowDefinition, EvaluationZone)> = None;

    for window in windows {
        let activation = match next_activation(window, now) {
            Ok(activation) => activation,
            Err(e) => return Decision::EvaluationFailed(e),
        };
        if activation.is_active_at(now) {
            return Decision::MergeNow;
        }
        if earliest.is_none_or(|(start, _, _)| activation.start < start) {
            earliest = Some((activation.start, window, activation.zone));
        }
    }

    match earliest {
        Some((start, window, zone)) => Decision::ReportWindow(ScheduledWindow {
            start,
            end: start
                .checked_add_signed(window.max_delay)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            zone,
            configured: true,
        }),
        None => Decision::ReportWindow(ScheduledWindow::unscheduled(now)),
    }
}

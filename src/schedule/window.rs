//! Merge window evaluation
//!
//! A window counts as *active* for `max_delay` after each recurrence instant.
//! Evaluating a window therefore starts the recurrence search `max_delay`
//! before "now": the first qualifying instant found is either in the past
//! (the window is open) or in the future (the next opening).

use crate::error::{Error, Result};
use crate::schedule::recurrence::Recurrence;
use crate::schedule::duration;
use chrono::{DateTime, Datelike, Local, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::str::FromStr;

/// Upper bound on recurrence instants inspected for an ISO-week match
pub const MAX_ACTIVATION_CANDIDATES: usize = 1000;

/// Format used when presenting window boundaries to users
const DISPLAY_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// One entry of `mergeWindows` in the schedule document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDefinition {
    /// When the window opens
    pub schedule: WindowSchedule,
    /// How long after opening the window stays active
    #[serde(default, deserialize_with = "duration::deserialize")]
    pub max_delay: TimeDelta,
}

/// Recurrence part of a window definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSchedule {
    /// Standard 5-field cron expression
    #[serde(default)]
    pub cron: String,
    /// ISO-week filter: "", "@even", "@odd" or a week number
    #[serde(default)]
    pub iso_week: String,
    /// IANA timezone name; local time when unset
    #[serde(default)]
    pub location: Option<String>,
}

impl WindowDefinition {
    /// Build a window definition from its parts
    pub fn new(cron: &str, location: Option<&str>, iso_week: &str, max_delay: TimeDelta) -> Self {
        Self {
            schedule: WindowSchedule {
                cron: cron.to_string(),
                iso_week: iso_week.to_string(),
                location: location.map(ToString::to_string),
            },
            max_delay,
        }
    }

    /// The configured timezone name, treating an empty string as unset
    pub fn location(&self) -> Option<&str> {
        self.schedule.location.as_deref().filter(|l| !l.is_empty())
    }
}

/// Timezone a window is evaluated and displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationZone {
    /// The process' local timezone
    Local,
    /// A named IANA zone
    Named(Tz),
}

impl EvaluationZone {
    /// Resolve an optional zone name, defaulting to local time
    pub fn resolve(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Named)
                .map_err(|_| Error::InvalidTimezone(name.to_string())),
        }
    }

    /// Human-readable rendering of `instant` in this zone
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Local => instant
                .with_timezone(&Local)
                .format(DISPLAY_FORMAT)
                .to_string(),
            Self::Named(tz) => instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
        }
    }
}

/// Restriction of recurrence instants to certain ISO weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoWeekFilter {
    /// Every week
    Any,
    /// Even week numbers
    Even,
    /// Odd week numbers
    Odd,
    /// Exactly this week number; values outside 1-53 never match
    Week(i64),
}

impl IsoWeekFilter {
    /// Whether ISO week number `week` passes the filter
    pub fn matches(self, week: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Even => week % 2 == 0,
            Self::Odd => week % 2 == 1,
            Self::Week(n) => i64::from(week) == n,
        }
    }
}

impl FromStr for IsoWeekFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Ok(Self::Any),
            "@even" => Ok(Self::Even),
            "@odd" => Ok(Self::Odd),
            other => other
                .parse::<i64>()
                .map(Self::Week)
                .map_err(|_| Error::UnrecognizedIsoWeekFilter(other.to_string())),
        }
    }
}

/// The qualifying recurrence instant of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// When the window (last) opened or will next open
    pub start: DateTime<Utc>,
    /// ISO week number of `start` in the evaluation zone
    pub iso_week: u32,
    /// Zone the window was evaluated in
    pub zone: EvaluationZone,
}

impl Activation {
    /// Whether the window is open at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now
    }
}

/// Find the activation of `window` relevant at `now`
///
/// This is the window's most recent opening if it is still within
/// `max_delay`, otherwise its next opening.
pub fn next_activation(window: &WindowDefinition, now: DateTime<Utc>) -> Result<Activation> {
    let zone = EvaluationZone::resolve(window.location())?;
    let lookback = now.checked_sub_signed(window.max_delay).ok_or_else(|| {
        Error::NoMatchingActivationFound {
            last_candidate: now.to_rfc3339(),
        }
    })?;
    let recurrence: Recurrence = window.schedule.cron.parse()?;
    let filter: IsoWeekFilter = window.schedule.iso_week.parse()?;

    let (start, iso_week) = match zone {
        EvaluationZone::Local => {
            first_matching_instant(&recurrence, filter, &lookback.with_timezone(&Local))?
        }
        EvaluationZone::Named(tz) => {
            first_matching_instant(&recurrence, filter, &lookback.with_timezone(&tz))?
        }
    };

    Ok(Activation {
        start,
        iso_week,
        zone,
    })
}

fn first_matching_instant<Z: TimeZone>(
    recurrence: &Recurrence,
    filter: IsoWeekFilter,
    lookback: &DateTime<Z>,
) -> Result<(DateTime<Utc>, u32)> {
    let exhausted = |last: &DateTime<Z>| Error::NoMatchingActivationFound {
        last_candidate: last.with_timezone(&Utc).to_rfc3339(),
    };

    let mut candidate = recurrence
        .next_after(lookback)
        .ok_or_else(|| exhausted(lookback))?;
    for _ in 0..MAX_ACTIVATION_CANDIDATES {
        let week = candidate.iso_week().week();
        if filter.matches(week) {
            return Ok((candidate.with_timezone(&Utc), week));
        }
        candidate = recurrence
            .next_after(&candidate)
            .ok_or_else(|| exhausted(&candidate))?;
    }
    Err(exhausted(&candidate))
}

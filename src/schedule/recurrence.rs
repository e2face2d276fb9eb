//! Standard 5-field cron recurrences
//!
//! Merge windows are written in classic crontab syntax
//! (`minute hour day-of-month month day-of-week`). The `cron` crate wants a
//! leading seconds field and numbers weekdays 1-7 from Sunday, so expressions
//! are translated before being handed over. When both day fields are
//! restricted, crontab fires if *either* matches; that is modelled as two
//! schedules whose next instants are merged.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone};
use cron::Schedule;
use std::str::FromStr;

const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// A parsed cron recurrence
#[derive(Debug, Clone)]
pub struct Recurrence {
    expression: String,
    schedules: Vec<Schedule>,
}

impl Recurrence {
    /// The expression as originally written
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First instant strictly after `after`, in the same zone
    ///
    /// Returns `None` for recurrences that never fire again
    /// (e.g. `0 0 30 2 *`).
    pub fn next_after<Z: TimeZone>(&self, after: &DateTime<Z>) -> Option<DateTime<Z>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(after).next())
            .min()
    }
}

impl FromStr for Recurrence {
    type Err = Error;

    fn from_str(expression: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidCronExpression {
            expression: expression.to_string(),
            reason,
        };

        let expanded = expand_descriptor(expression.trim()).map_err(invalid)?;
        let fields: Vec<&str> = expanded.split_whitespace().collect();
        let [minute, hour, day_of_month, month, day_of_week] = fields[..] else {
            return Err(invalid(format!(
                "expected exactly 5 fields, found {}",
                fields.len()
            )));
        };

        let weekdays = translate_day_of_week(day_of_week).map_err(invalid)?;

        let variants = if is_restricted(day_of_month) && is_restricted(day_of_week) {
            vec![
                format!("0 {minute} {hour} {day_of_month} {month} *"),
                format!("0 {minute} {hour} * {month} {weekdays}"),
            ]
        } else {
            vec![format!("0 {minute} {hour} {day_of_month} {month} {weekdays}")]
        };

        let schedules = variants
            .iter()
            .map(|v| Schedule::from_str(v).map_err(|e| invalid(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            expression: expression.to_string(),
            schedules,
        })
    }
}

fn expand_descriptor(expression: &str) -> std::result::Result<String, String> {
    if !expression.starts_with('@') {
        return Ok(expression.to_string());
    }
    let expanded = match expression {
        "@yearly" | "@annually" => "0 0 1 1 *",
        "@monthly" => "0 0 1 * *",
        "@weekly" => "0 0 * * 0",
        "@daily" | "@midnight" => "0 0 * * *",
        "@hourly" => "0 * * * *",
        other => return Err(format!("unrecognized descriptor: {other}")),
    };
    Ok(expanded.to_string())
}

/// A day field is unrestricted only when it covers every day with step 1
fn is_restricted(field: &str) -> bool {
    !matches!(field, "*" | "?" | "*/1" | "?/1")
}

/// Rewrite a crontab day-of-week field (0-7, Sunday = 0 or 7) into the
/// `cron` crate's numbering (1-7, Sunday = 1)
fn translate_day_of_week(field: &str) -> std::result::Result<String, String> {
    if field == "*" || field == "?" {
        return Ok("*".to_string());
    }

    let mut days = [false; 7];
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step in day-of-week: {item}"))?;
                if step == 0 {
                    return Err(format!("step must be positive: {item}"));
                }
                (range, Some(step))
            }
            None => (item, None),
        };

        let (start, end) = if range == "*" || range == "?" {
            (0, 6)
        } else if let Some((low, high)) = range.split_once('-') {
            (parse_weekday(low)?, parse_weekday(high)?)
        } else {
            let day = parse_weekday(range)?;
            // "N/step" runs from N to the end of the week
            (day, if step.is_some() { 6 } else { day })
        };
        if start > end {
            return Err(format!("beginning of range after end: {item}"));
        }

        let mut day = start;
        while day <= end {
            days[(day % 7) as usize] = true;
            day += step.unwrap_or(1);
        }
    }

    Ok(days
        .iter()
        .enumerate()
        .filter(|(_, selected)| **selected)
        .map(|(day, _)| (day + 1).to_string())
        .collect::<Vec<_>>()
        .join(","))
}

fn parse_weekday(token: &str) -> std::result::Result<u32, String> {
    if let Some(index) = WEEKDAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
    {
        return Ok(u32::try_from(index).unwrap_or(0));
    }
    match token.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(day),
        _ => Err(format!("invalid day-of-week: {token}")),
    }
}

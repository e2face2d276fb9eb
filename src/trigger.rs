//! Periodic invocation of batch runs
//!
//! Batches run one at a time: the next tick is computed only after the
//! previous batch finished, so a slow batch skips ticks instead of
//! overlapping with the next one.

use crate::error::{Error, Result};
use crate::merge::BatchRunner;
use crate::schedule::duration::parse_duration;
use crate::schedule::recurrence::Recurrence;
use chrono::{DateTime, Local, TimeDelta, Utc};
use std::future::Future;
use std::str::FromStr;
use tracing::{error, info};

/// How often batch runs are triggered
#[derive(Debug, Clone)]
pub enum TaskSchedule {
    /// `@every <duration>`: fixed interval
    ///
    /// The first run happens immediately at startup rather than one interval
    /// later, then every `duration` after the previous run's start.
    Every(TimeDelta),
    /// 5-field cron expression in local time
    Cron(Recurrence),
}

impl TaskSchedule {
    /// Instant of the run following one that started at `last_start`
    ///
    /// `None` as `last_start` means no run happened yet.
    pub fn next_run(
        &self,
        last_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            Self::Every(interval) => match last_start {
                None => Some(now),
                Some(last) => {
                    let mut next = last.checked_add_signed(*interval)?;
                    // Skip ticks missed while a batch was running
                    while next < now {
                        next = next.checked_add_signed(*interval)?;
                    }
                    Some(next)
                }
            },
            Self::Cron(recurrence) => recurrence
                .next_after(&now.with_timezone(&Local))
                .map(|next| next.with_timezone(&Utc)),
        }
    }
}

impl FromStr for TaskSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(interval) = s.strip_prefix("@every") {
            let interval = parse_duration(interval.trim())?;
            if interval <= TimeDelta::zero() {
                return Err(Error::Config(format!(
                    "task schedule interval must be positive: {s}"
                )));
            }
            return Ok(Self::Every(interval));
        }
        Ok(Self::Cron(s.parse()?))
    }
}

/// Run batches according to `schedule` until `shutdown` resolves
///
/// Batch errors are logged and never stop the loop.
pub async fn run_periodically<F>(runner: &BatchRunner, schedule: &TaskSchedule, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut last_start = None;

    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_run(last_start, now) else {
            error!("task schedule has no further runs, stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next_run = %next, "waiting for next run");

        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested, stopping");
                return;
            }
            () = tokio::time::sleep(wait) => {}
        }

        last_start = Some(next);
        match runner.run().await {
            Ok(report) => match report.into_result() {
                Ok(outcomes) => info!(processed = outcomes.len(), "batch finished"),
                Err(e) => error!(error = %e, "error during periodic job"),
            },
            Err(e) => error!(error = %e, "error during periodic job"),
        }
    }
}

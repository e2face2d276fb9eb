//! Batch runs over every MR carrying the scheduling label

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::merge::engine::{MergeEngine, RequestOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of processing one MR in a batch
#[derive(Debug)]
pub struct ProcessedRequest {
    /// MR number
    pub iid: u64,
    /// Outcome, or the error that kept the MR's author from being informed
    pub result: Result<RequestOutcome>,
}

/// Everything that happened during one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-MR results in listing order
    pub processed: Vec<ProcessedRequest>,
}

impl BatchReport {
    /// Successful outcomes with their MR numbers
    pub fn outcomes(&self) -> impl Iterator<Item = (u64, &RequestOutcome)> {
        self.processed
            .iter()
            .filter_map(|p| p.result.as_ref().ok().map(|outcome| (p.iid, outcome)))
    }

    /// Number of MRs whose processing returned an error
    pub fn error_count(&self) -> usize {
        self.processed.iter().filter(|p| p.result.is_err()).count()
    }

    /// Combine all per-MR errors into one [`Error::Aggregate`]
    pub fn into_result(self) -> Result<Vec<(u64, RequestOutcome)>> {
        let mut outcomes = Vec::new();
        let mut errors = Vec::new();
        for processed in self.processed {
            match processed.result {
                Ok(outcome) => outcomes.push((processed.iid, outcome)),
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() {
            Ok(outcomes)
        } else {
            Err(Error::Aggregate(errors))
        }
    }
}

/// Processes all labelled MRs, one after another
pub struct BatchRunner {
    engine: MergeEngine,
    clock: Arc<dyn Clock>,
}

impl BatchRunner {
    /// Create a runner reading "now" from `clock`
    pub fn new(engine: MergeEngine, clock: Arc<dyn Clock>) -> Self {
        Self { engine, clock }
    }

    /// Run a batch at the clock's current time
    pub async fn run(&self) -> Result<BatchReport> {
        self.run_at(self.clock.now()).await
    }

    /// Run a batch as of `now`
    ///
    /// Fails only if the MRs cannot be listed. A failing MR never stops the
    /// batch; its error is recorded in the report.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<BatchReport> {
        let label = &self.engine.config().scheduled_label;
        info!(label = %label, "running scheduled merge task");

        let mrs = self.engine.platform().list_mrs_with_label(label).await?;
        info!(count = mrs.len(), "processing MRs with label");

        let mut report = BatchReport::default();
        for mr in &mrs {
            let result = self.engine.process(mr, now).await;
            match &result {
                Ok(outcome) => info!(mr_iid = mr.iid, %outcome, "processed MR"),
                Err(e) => warn!(mr_iid = mr.iid, error = %e, "failed to process MR"),
            }
            report.processed.push(ProcessedRequest {
                iid: mr.iid,
                result,
            });
        }

        Ok(report)
    }
}

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs summarization for every owner with entries in the windows that just closed.

use std::sync::Arc;

use chrono::NaiveDate;
use memoir_core::{EntryStore, MemoirError, PeriodType};
use tracing::{info, warn};

use crate::summarizer::{SummarizationJob, SummaryOutcome};

/// A per-owner run that returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFailure {
    pub owner_id: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: Vec<ScheduleFailure>,
}

pub struct SummarySchedule {
    entries: Arc<dyn EntryStore>,
    job: Arc<SummarizationJob>,
}

impl SummarySchedule {
    pub fn new(entries: Arc<dyn EntryStore>, job: Arc<SummarizationJob>) -> Self {
        Self { entries, job }
    }

    /// Summarize the most recently completed window of each period type.
    ///
    /// Failures of individual owners are recorded in the report. Only a
    /// failure to list owners is returned as an error.
    pub async fn run_due(
        &self,
        today: NaiveDate,
        periods: &[PeriodType],
    ) -> Result<ScheduleReport, MemoirError> {
        let mut report = ScheduleReport::default();

        for &period_type in periods {
            let (start, end) = period_type.previous_window(today);
            let owners = self.entries.owners_with_entries_between(start, end).await?;
            info!(
                period_type = %period_type,
                start_date = %start,
                end_date = %end,
                owners = owners.len(),
                "running due summaries"
            );

            for owner_id in owners {
                match self.job.run(&owner_id, period_type, start, end).await {
                    Ok(SummaryOutcome::Persisted(_)) => report.persisted += 1,
                    Ok(SummaryOutcome::NoOp) => report.skipped += 1,
                    Err(e) => {
                        warn!(owner_id, period_type = %period_type, error = %e, "due summary failed");
                        report.failed.push(ScheduleFailure {
                            owner_id,
                            period_type,
                            start_date: start,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }
}

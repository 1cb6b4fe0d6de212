// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compresses one owner's entries in a date window into a period summary.
//!
//! The job moves through `Pending -> Compressing -> Summarizing -> Embedding
//! -> Persisted`; any failure ends in `Failed` with nothing written. The only
//! write is the final upsert, so a rerun for the same window overwrites the
//! previous summary in place.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use memoir_config::model::SummaryConfig;
use memoir_core::{
    BodyCipher, Entry, EntryStore, MemoirError, PeriodType, Summary, SummarizerAdapter,
    SummaryStore,
};
use tracing::{info, warn};

use crate::shared::SharedEmbedder;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Persisted(Summary),
    /// Nothing to summarize; the store was not touched.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Compressing,
    Summarizing,
    Embedding,
    Persisted,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Compressing => "compressing",
            JobState::Summarizing => "summarizing",
            JobState::Embedding => "embedding",
            JobState::Persisted => "persisted",
            JobState::Failed => "failed",
        }
    }
}

/// Identifies one run for logging.
struct JobKey<'a> {
    owner_id: &'a str,
    period_type: PeriodType,
    start_date: NaiveDate,
}

impl JobKey<'_> {
    fn enter(&self, state: JobState) {
        info!(
            owner_id = self.owner_id,
            period_type = %self.period_type,
            start_date = %self.start_date,
            state = state.as_str(),
            "summary job"
        );
    }
}

pub struct SummarizationJob {
    entries: Arc<dyn EntryStore>,
    summaries: Arc<dyn SummaryStore>,
    cipher: Arc<dyn BodyCipher>,
    summarizer: Arc<dyn SummarizerAdapter>,
    embedder: SharedEmbedder,
    config: SummaryConfig,
}

impl SummarizationJob {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        summaries: Arc<dyn SummaryStore>,
        cipher: Arc<dyn BodyCipher>,
        summarizer: Arc<dyn SummarizerAdapter>,
        embedder: SharedEmbedder,
        config: SummaryConfig,
    ) -> Self {
        Self {
            entries,
            summaries,
            cipher,
            summarizer,
            embedder,
            config,
        }
    }

    /// Summarize the owner's entries dated within `[start_date, end_date]`.
    pub async fn run(
        &self,
        owner_id: &str,
        period_type: PeriodType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SummaryOutcome, MemoirError> {
        if start_date > end_date {
            return Err(MemoirError::InvalidInput(format!(
                "summary window starts {start_date} after it ends {end_date}"
            )));
        }

        let key = JobKey {
            owner_id,
            period_type,
            start_date,
        };
        key.enter(JobState::Pending);

        let result = self.execute(&key, end_date).await;
        match &result {
            Ok(SummaryOutcome::Persisted(_)) => key.enter(JobState::Persisted),
            Ok(SummaryOutcome::NoOp) => {}
            Err(e) => {
                key.enter(JobState::Failed);
                warn!(owner_id, period_type = %period_type, error = %e, "summary job failed");
            }
        }
        result
    }

    async fn execute(
        &self,
        key: &JobKey<'_>,
        end_date: NaiveDate,
    ) -> Result<SummaryOutcome, MemoirError> {
        let entries = self
            .entries
            .entries_between(key.owner_id, key.start_date, end_date)
            .await?;
        if entries.is_empty() {
            info!(owner_id = key.owner_id, "no entries in window, nothing to summarize");
            return Ok(SummaryOutcome::NoOp);
        }

        key.enter(JobState::Compressing);
        let Some(document) = self.compose(&entries) else {
            info!(owner_id = key.owner_id, "no readable entry bodies in window, nothing to summarize");
            return Ok(SummaryOutcome::NoOp);
        };

        key.enter(JobState::Summarizing);
        let timeout = Duration::from_secs(self.config.summarize_timeout_secs);
        let text = tokio::time::timeout(timeout, self.summarizer.summarize(&document, key.period_type))
            .await
            .map_err(|_| MemoirError::Timeout { duration: timeout })??;
        let text = text.trim();
        if text.is_empty() {
            return Err(MemoirError::provider("summarizer returned empty text"));
        }

        key.enter(JobState::Embedding);
        let vector = self.embedder.embed_one(text).await?;

        let now = Utc::now();
        let stored = self
            .summaries
            .upsert_summary(&Summary {
                owner_id: key.owner_id.to_string(),
                period_type: key.period_type,
                start_date: key.start_date,
                end_date,
                summary_text: text.to_string(),
                vector: Some(vector),
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(SummaryOutcome::Persisted(stored))
    }

    /// Decrypt bodies and build the summarizer input. `None` when no entry
    /// has a readable, non-empty body.
    fn compose(&self, entries: &[Entry]) -> Option<String> {
        let blocks: Vec<String> = entries
            .iter()
            .filter_map(|entry| match self.cipher.decrypt(&entry.body) {
                Ok(body) if !body.trim().is_empty() => Some(entry_block(entry, &body)),
                Ok(_) => None,
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "skipping entry with undecryptable body");
                    None
                }
            })
            .collect();

        if blocks.is_empty() {
            None
        } else {
            Some(truncate_chars(&blocks.join("\n\n"), self.config.char_budget).to_string())
        }
    }
}

/// `[YYYY-MM-DD] (Mood: <mood>)` header followed by the body.
pub fn entry_block(entry: &Entry, body: &str) -> String {
    format!(
        "[{}] (Mood: {})\n{}",
        entry.created_date().format("%Y-%m-%d"),
        entry.mood.as_deref().unwrap_or("None"),
        body.trim()
    )
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

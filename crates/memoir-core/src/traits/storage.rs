// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for entries and period summaries.
//!
//! Both stores report whether nearest-neighbor search is available so the
//! retrievers can pick vector-capable or degraded mode once per call.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::MemoirError;
use crate::types::{Entry, IndexTask, PeriodType, Summary};

/// Journal entries plus one embedding vector per entry.
///
/// Every query is scoped to a single owner. No method returns entries
/// belonging to another owner.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Whether [`EntryStore::nearest_entries`] is usable on this backend.
    fn supports_nearest_neighbor(&self) -> bool;

    /// Insert or replace an entry.
    async fn save_entry(&self, entry: &Entry) -> Result<(), MemoirError>;

    /// Fetch a single entry by id.
    async fn get_entry(&self, entry_id: &str) -> Result<Option<Entry>, MemoirError>;

    /// Fetch the owner's entries with the given ids. Unknown ids are skipped.
    async fn get_entries(&self, owner_id: &str, ids: &[String]) -> Result<Vec<Entry>, MemoirError>;

    /// Delete an entry and its embedding. Returns false if it did not exist.
    async fn delete_entry(&self, entry_id: &str) -> Result<bool, MemoirError>;

    /// Up to `limit` `(entry_id, l2_distance)` pairs nearest to `query`,
    /// closest first. Embeddings of a different dimension are ignored.
    async fn nearest_entries(
        &self,
        owner_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<(String, f64)>, MemoirError>;

    /// Entries whose title or derived keyword index contains any of
    /// `keywords` (case-insensitive), newest first, skipping `exclude`.
    async fn keyword_entries(
        &self,
        owner_id: &str,
        keywords: &[String],
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Entry>, MemoirError>;

    /// The owner's `limit` most recent entries, newest first.
    async fn recent_entries(&self, owner_id: &str, limit: usize) -> Result<Vec<Entry>, MemoirError>;

    /// Entries created on dates within `[start, end]`, oldest first.
    async fn entries_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>, MemoirError>;

    /// Distinct owners with at least one entry in `[start, end]`.
    async fn owners_with_entries_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, MemoirError>;

    /// Replace the embedding for an entry.
    async fn upsert_embedding(&self, entry_id: &str, vector: &[f32]) -> Result<(), MemoirError>;

    /// Replace the derived keyword index for an entry.
    async fn set_search_keywords(&self, entry_id: &str, keywords: &str) -> Result<(), MemoirError>;
}

/// Period summaries plus their optional embeddings.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Whether [`SummaryStore::nearest_summaries`] is usable on this backend.
    fn supports_nearest_neighbor(&self) -> bool;

    /// Insert or overwrite the summary keyed by `(owner_id, period_type, start_date)`.
    ///
    /// Returns the stored row.
    async fn upsert_summary(&self, summary: &Summary) -> Result<Summary, MemoirError>;

    /// Fetch the summary for a key, if present.
    async fn get_summary(
        &self,
        owner_id: &str,
        period_type: PeriodType,
        start_date: NaiveDate,
    ) -> Result<Option<Summary>, MemoirError>;

    /// Up to `limit` summaries nearest to `query`, closest first.
    /// Summaries without a vector are excluded.
    async fn nearest_summaries(
        &self,
        owner_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<(Summary, f64)>, MemoirError>;

    /// The owner's `limit` most recent summaries by window end.
    async fn recent_summaries(&self, owner_id: &str, limit: usize) -> Result<Vec<Summary>, MemoirError>;

    /// Number of stored summaries for an owner.
    async fn count_summaries(&self, owner_id: &str) -> Result<usize, MemoirError>;

    /// Explicit data deletion for an owner. Returns the number of rows removed.
    async fn delete_summaries_for_owner(&self, owner_id: &str) -> Result<usize, MemoirError>;
}

/// Durable queue of entries whose embedding and keyword index need recomputing.
///
/// Delivery is at-least-once: a lease that is neither acked nor failed
/// before it expires is handed out again.
#[async_trait]
pub trait IndexQueue: Send + Sync {
    /// Queue an entry unless a pending task for it already exists.
    /// Returns false when deduplicated.
    async fn enqueue_index(&self, entry_id: &str) -> Result<bool, MemoirError>;

    /// Lease the oldest deliverable task.
    async fn dequeue_index(&self) -> Result<Option<IndexTask>, MemoirError>;

    /// Mark a leased task done.
    async fn ack_index(&self, task_id: i64) -> Result<(), MemoirError>;

    /// Record a failed attempt. Returns true if the task will be retried.
    async fn fail_index(&self, task_id: i64) -> Result<bool, MemoirError>;

    /// Number of tasks waiting to be leased.
    async fn pending_index_count(&self) -> Result<usize, MemoirError>;
}

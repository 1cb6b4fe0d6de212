// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the journal store traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use memoir_config::model::StorageConfig;
use memoir_core::{
    AdapterType, Entry, EntryStore, HealthStatus, IndexQueue, IndexTask, MemoirError,
    PeriodType, PluginAdapter, Summary, SummaryStore,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// Queue name used for entry re-index tasks.
pub const INDEX_QUEUE: &str = "entry-index";

/// SQLite-backed entry, summary and index-queue store.
///
/// Vectors are checked against the configured embedding dimension before
/// they reach SQL.
#[derive(Clone)]
pub struct SqliteJournalStore {
    db: Database,
    dimensions: usize,
}

impl SqliteJournalStore {
    pub fn new(db: Database, dimensions: usize) -> Self {
        Self { db, dimensions }
    }

    /// Open the database described by `config` and wrap it.
    pub async fn open(config: &StorageConfig, dimensions: usize) -> Result<Self, MemoirError> {
        let db = Database::open_with_config(config).await?;
        Ok(Self::new(db, dimensions))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Checkpoint and close the underlying database.
    pub async fn close(self) -> Result<(), MemoirError> {
        self.db.close().await
    }

    fn check_dimensions(&self, vector: &[f32], what: &str) -> Result<(), MemoirError> {
        if vector.len() != self.dimensions {
            return Err(MemoirError::InvalidInput(format!(
                "{what} has {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteJournalStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MemoirError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        if self.db.supports_vector_search() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "nearest-neighbor search unavailable".to_string(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), MemoirError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl EntryStore for SqliteJournalStore {
    fn supports_nearest_neighbor(&self) -> bool {
        self.db.supports_vector_search()
    }

    async fn save_entry(&self, entry: &Entry) -> Result<(), MemoirError> {
        queries::entries::save(&self.db, entry).await
    }

    async fn get_entry(&self, entry_id: &str) -> Result<Option<Entry>, MemoirError> {
        queries::entries::get(&self.db, entry_id).await
    }

    async fn get_entries(&self, owner_id: &str, ids: &[String]) -> Result<Vec<Entry>, MemoirError> {
        queries::entries::get_many(&self.db, owner_id, ids).await
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<bool, MemoirError> {
        queries::entries::delete(&self.db, entry_id).await
    }

    async fn nearest_entries(
        &self,
        owner_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<(String, f64)>, MemoirError> {
        if !self.db.supports_vector_search() {
            return Err(MemoirError::Internal(
                "nearest-neighbor search is not available".to_string(),
            ));
        }
        self.check_dimensions(query, "query vector")?;
        queries::entries::nearest(&self.db, owner_id, query, limit).await
    }

    async fn keyword_entries(
        &self,
        owner_id: &str,
        keywords: &[String],
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Entry>, MemoirError> {
        queries::entries::keyword_matches(&self.db, owner_id, keywords, exclude, limit).await
    }

    async fn recent_entries(&self, owner_id: &str, limit: usize) -> Result<Vec<Entry>, MemoirError> {
        queries::entries::recent(&self.db, owner_id, limit).await
    }

    async fn entries_between(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>, MemoirError> {
        queries::entries::between(&self.db, owner_id, start, end).await
    }

    async fn owners_with_entries_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<String>, MemoirError> {
        queries::entries::owners_between(&self.db, start, end).await
    }

    async fn upsert_embedding(&self, entry_id: &str, vector: &[f32]) -> Result<(), MemoirError> {
        self.check_dimensions(vector, "entry embedding")?;
        queries::entries::upsert_embedding(&self.db, entry_id, vector).await
    }

    async fn set_search_keywords(&self, entry_id: &str, keywords: &str) -> Result<(), MemoirError> {
        queries::entries::set_search_keywords(&self.db, entry_id, keywords).await
    }
}

#[async_trait]
impl SummaryStore for SqliteJournalStore {
    fn supports_nearest_neighbor(&self) -> bool {
        self.db.supports_vector_search()
    }

    async fn upsert_summary(&self, summary: &Summary) -> Result<Summary, MemoirError> {
        if summary.start_date > summary.end_date {
            return Err(MemoirError::InvalidInput(format!(
                "summary window starts {} after it ends {}",
                summary.start_date, summary.end_date
            )));
        }
        if let Some(vector) = &summary.vector {
            self.check_dimensions(vector, "summary embedding")?;
        }
        queries::summaries::upsert(&self.db, summary).await
    }

    async fn get_summary(
        &self,
        owner_id: &str,
        period_type: PeriodType,
        start_date: NaiveDate,
    ) -> Result<Option<Summary>, MemoirError> {
        queries::summaries::get(&self.db, owner_id, period_type, start_date).await
    }

    async fn nearest_summaries(
        &self,
        owner_id: &str,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<(Summary, f64)>, MemoirError> {
        if !self.db.supports_vector_search() {
            return Err(MemoirError::Internal(
                "nearest-neighbor search is not available".to_string(),
            ));
        }
        self.check_dimensions(query, "query vector")?;
        queries::summaries::nearest(&self.db, owner_id, query, limit).await
    }

    async fn recent_summaries(&self, owner_id: &str, limit: usize) -> Result<Vec<Summary>, MemoirError> {
        queries::summaries::recent(&self.db, owner_id, limit).await
    }

    async fn count_summaries(&self, owner_id: &str) -> Result<usize, MemoirError> {
        queries::summaries::count(&self.db, owner_id).await
    }

    async fn delete_summaries_for_owner(&self, owner_id: &str) -> Result<usize, MemoirError> {
        queries::summaries::delete_for_owner(&self.db, owner_id).await
    }
}

#[async_trait]
impl IndexQueue for SqliteJournalStore {
    async fn enqueue_index(&self, entry_id: &str) -> Result<bool, MemoirError> {
        let id = queries::queue::enqueue_unique(&self.db, INDEX_QUEUE, entry_id).await?;
        Ok(id.is_some())
    }

    async fn dequeue_index(&self) -> Result<Option<IndexTask>, MemoirError> {
        let entry = queries::queue::dequeue(&self.db, INDEX_QUEUE).await?;
        Ok(entry.map(|row| IndexTask {
            id: row.id,
            entry_id: row.payload,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
        }))
    }

    async fn ack_index(&self, task_id: i64) -> Result<(), MemoirError> {
        queries::queue::ack(&self.db, task_id).await
    }

    async fn fail_index(&self, task_id: i64) -> Result<bool, MemoirError> {
        queries::queue::fail(&self.db, task_id).await
    }

    async fn pending_index_count(&self) -> Result<usize, MemoirError> {
        queries::queue::pending_count(&self.db, INDEX_QUEUE).await
    }
}

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queued recomputation of entry embeddings and derived keyword indexes.
//!
//! Saving an entry enqueues an `entry-index` task keyed by entry id.
//! Workers lease tasks, recompute both derived fields from the decrypted
//! body, and ack. Recomputation is idempotent, so redelivery is harmless.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use memoir_config::model::MemoryConfig;
use memoir_core::{BodyCipher, Entry, EntryStore, IndexQueue, KeywordAdapter, MemoirError};
use tracing::{debug, info, warn};

use crate::shared::SharedEmbedder;

/// Totals from [`EntryIndexer::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub processed: usize,
    pub failed: usize,
}

/// What happened to one leased task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed { entry_id: String },
    /// The entry was deleted after the task was queued.
    Missing { entry_id: String },
    Failed { entry_id: String, will_retry: bool },
}

pub struct EntryIndexer {
    entries: Arc<dyn EntryStore>,
    queue: Arc<dyn IndexQueue>,
    cipher: Arc<dyn BodyCipher>,
    keywords: Arc<dyn KeywordAdapter>,
    embedder: SharedEmbedder,
    config: MemoryConfig,
}

impl EntryIndexer {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        queue: Arc<dyn IndexQueue>,
        cipher: Arc<dyn BodyCipher>,
        keywords: Arc<dyn KeywordAdapter>,
        embedder: SharedEmbedder,
        config: MemoryConfig,
    ) -> Self {
        Self {
            entries,
            queue,
            cipher,
            keywords,
            embedder,
            config,
        }
    }

    /// Encrypt and save a new entry, then queue it for indexing.
    pub async fn save_entry(
        &self,
        owner_id: &str,
        title: &str,
        body: &str,
        mood: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Entry, MemoirError> {
        let entry = Entry::new(owner_id, title, self.cipher.encrypt(body)?, mood, created_at);
        self.entries.save_entry(&entry).await?;
        self.enqueue(&entry.id).await?;
        debug!(owner_id, entry_id = %entry.id, "entry saved");
        Ok(entry)
    }

    /// Queue an entry. Returns false if a pending task already covers it.
    pub async fn enqueue(&self, entry_id: &str) -> Result<bool, MemoirError> {
        self.queue.enqueue_index(entry_id).await
    }

    pub async fn pending_count(&self) -> Result<usize, MemoirError> {
        self.queue.pending_index_count().await
    }

    /// Lease and process one task. `None` when the queue is empty.
    pub async fn process_next(&self) -> Result<Option<IndexOutcome>, MemoirError> {
        let Some(task) = self.queue.dequeue_index().await? else {
            return Ok(None);
        };

        let entry = match self.entries.get_entry(&task.entry_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.queue.ack_index(task.id).await?;
                debug!(entry_id = %task.entry_id, "indexed entry no longer exists");
                return Ok(Some(IndexOutcome::Missing {
                    entry_id: task.entry_id,
                }));
            }
            Err(e) => return self.record_failure(task.id, task.entry_id, e).await,
        };

        match self.index_entry(&entry).await {
            Ok(()) => {
                self.queue.ack_index(task.id).await?;
                debug!(entry_id = %entry.id, attempts = task.attempts, "entry indexed");
                Ok(Some(IndexOutcome::Indexed { entry_id: entry.id }))
            }
            Err(e) => self.record_failure(task.id, task.entry_id, e).await,
        }
    }

    async fn record_failure(
        &self,
        task_id: i64,
        entry_id: String,
        error: MemoirError,
    ) -> Result<Option<IndexOutcome>, MemoirError> {
        let will_retry = self.queue.fail_index(task_id).await?;
        warn!(entry_id = %entry_id, will_retry, error = %error, "entry indexing failed");
        Ok(Some(IndexOutcome::Failed {
            entry_id,
            will_retry,
        }))
    }

    /// Recompute the keyword index, then the embedding.
    ///
    /// Keywords are written first so keyword retrieval benefits even when
    /// the embedder is unavailable.
    async fn index_entry(&self, entry: &Entry) -> Result<(), MemoirError> {
        let body = self.cipher.decrypt(&entry.body)?;

        let keywords = if body.chars().count() < self.config.index_min_chars {
            vec![]
        } else {
            self.keywords.extract(&body, self.config.index_keyword_count)?
        };
        self.entries
            .set_search_keywords(&entry.id, &keywords.join(" "))
            .await?;

        let vector = self.embedder.embed_one(&embedding_text(entry, &body)).await?;
        self.entries.upsert_embedding(&entry.id, &vector).await
    }

    /// Process tasks until the queue has nothing deliverable.
    ///
    /// A task that keeps failing is retried until the queue parks it, so
    /// this always terminates.
    pub async fn drain(&self) -> Result<IndexReport, MemoirError> {
        let mut report = IndexReport::default();
        while let Some(outcome) = self.process_next().await? {
            match outcome {
                IndexOutcome::Indexed { .. } | IndexOutcome::Missing { .. } => report.processed += 1,
                IndexOutcome::Failed { .. } => report.failed += 1,
            }
        }
        info!(processed = report.processed, failed = report.failed, "index queue drained");
        Ok(report)
    }
}

/// Text embedded for an entry.
pub fn embedding_text(entry: &Entry, body: &str) -> String {
    format!(
        "Title: {}\nContent: {}\nMood: {}",
        entry.title,
        body,
        entry.mood.as_deref().unwrap_or("None")
    )
}

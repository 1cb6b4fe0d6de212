// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary journal database for integration tests.
//!
//! `TestJournal` opens a fresh SQLite journal in a temp directory with an
//! ephemeral body cipher, and writes encrypted entries dated relative to
//! now. The directory is removed when the journal is dropped.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use memoir_config::model::{MemoirConfig, StorageConfig};
use memoir_core::{BodyCipher, Entry, EntryStore, IndexQueue, MemoirError, SummaryStore};
use memoir_storage::SqliteJournalStore;
use memoir_vault::AesBodyCipher;
use tempfile::TempDir;

/// Builder for [`TestJournal`].
pub struct TestJournalBuilder {
    dimensions: usize,
    vector_search: bool,
}

impl TestJournalBuilder {
    fn new() -> Self {
        Self {
            dimensions: 8,
            vector_search: true,
        }
    }

    /// Embedding dimension enforced by the store.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Disable nearest-neighbor search to exercise degraded mode.
    pub fn without_vector_search(mut self) -> Self {
        self.vector_search = false;
        self
    }

    pub async fn build(self) -> Result<TestJournal, MemoirError> {
        let dir = tempfile::tempdir().map_err(|e| MemoirError::Internal(e.to_string()))?;

        let mut config = MemoirConfig::default();
        config.storage = StorageConfig {
            database_path: dir.path().join("journal.db").to_string_lossy().into_owned(),
            wal_mode: true,
            vector_search: self.vector_search,
        };
        config.memory.embedding_dimensions = self.dimensions;

        let store = SqliteJournalStore::open(&config.storage, self.dimensions).await?;

        Ok(TestJournal {
            store: Arc::new(store),
            cipher: Arc::new(AesBodyCipher::ephemeral()?),
            config,
            _dir: dir,
        })
    }
}

pub struct TestJournal {
    pub store: Arc<SqliteJournalStore>,
    pub cipher: Arc<AesBodyCipher>,
    /// Defaults with storage and dimensions pointing at this journal.
    pub config: MemoirConfig,
    _dir: TempDir,
}

impl TestJournal {
    pub fn builder() -> TestJournalBuilder {
        TestJournalBuilder::new()
    }

    /// A vector-capable journal with 8-dimensional embeddings.
    pub async fn new() -> Result<Self, MemoirError> {
        Self::builder().build().await
    }

    pub fn entries(&self) -> Arc<dyn EntryStore> {
        self.store.clone()
    }

    pub fn summaries(&self) -> Arc<dyn SummaryStore> {
        self.store.clone()
    }

    pub fn queue(&self) -> Arc<dyn IndexQueue> {
        self.store.clone()
    }

    pub fn body_cipher(&self) -> Arc<dyn BodyCipher> {
        self.cipher.clone()
    }

    /// Save an entry written `days_ago` days before now.
    pub async fn entry(
        &self,
        owner_id: &str,
        title: &str,
        body: &str,
        mood: Option<&str>,
        days_ago: i64,
    ) -> Result<Entry, MemoirError> {
        self.entry_at(owner_id, title, body, mood, Utc::now() - Duration::days(days_ago))
            .await
    }

    /// Save an entry with an exact creation time.
    pub async fn entry_at(
        &self,
        owner_id: &str,
        title: &str,
        body: &str,
        mood: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Entry, MemoirError> {
        let entry = Entry::new(
            owner_id,
            title,
            self.cipher.encrypt(body)?,
            mood.map(str::to_string),
            created_at,
        );
        self.store.save_entry(&entry).await?;
        Ok(entry)
    }

    /// Attach an embedding without going through the indexer.
    pub async fn embed(&self, entry: &Entry, vector: &[f32]) -> Result<(), MemoirError> {
        self.store.upsert_embedding(&entry.id, vector).await
    }

    /// Save an entry whose body cannot be decrypted.
    pub async fn corrupt_entry(
        &self,
        owner_id: &str,
        title: &str,
        days_ago: i64,
    ) -> Result<Entry, MemoirError> {
        let entry = Entry::new(
            owner_id,
            title,
            "v1:not-a-real-envelope",
            None,
            Utc::now() - Duration::days(days_ago),
        );
        self.store.save_entry(&entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_are_stored_encrypted() {
        let journal = TestJournal::new().await.unwrap();
        let entry = journal
            .entry("alice", "Garden", "Planted tulips.", Some("content"), 2)
            .await
            .unwrap();

        let stored = journal.store.get_entry(&entry.id).await.unwrap().unwrap();
        assert_ne!(stored.body, "Planted tulips.");
        assert_eq!(journal.cipher.decrypt(&stored.body).unwrap(), "Planted tulips.");
    }

    #[tokio::test]
    async fn degraded_builder_disables_vector_search() {
        let journal = TestJournal::builder()
            .without_vector_search()
            .build()
            .await
            .unwrap();
        assert!(!journal.entries().supports_nearest_neighbor());
    }
}

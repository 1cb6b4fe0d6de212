// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process wiring shared by the subcommands.
//!
//! One store, one body cipher and one embedding handle are created here and
//! handed to every component that needs them.

use std::path::PathBuf;
use std::sync::Arc;

use memoir_config::model::MemoirConfig;
use memoir_core::{BodyCipher, KeywordAdapter, MemoirError};
use memoir_memory::{
    EntryIndexer, FrequencyKeywordExtractor, HybridEntryRetriever, ModelManager,
    RagContextAssembler, SharedEmbedder, SummaryRetriever,
};
use memoir_storage::SqliteJournalStore;
use memoir_vault::AesBodyCipher;
use tracing::{info, warn};

pub struct Journal {
    store: Arc<SqliteJournalStore>,
    cipher: Arc<dyn BodyCipher>,
    embedder: SharedEmbedder,
    keywords: Arc<dyn KeywordAdapter>,
    config: MemoirConfig,
}

impl Journal {
    /// Open the configured database, derive the body key and prepare the
    /// embedding model (loaded on first use).
    pub async fn open(config: MemoirConfig) -> Result<Self, MemoirError> {
        let cipher = Arc::new(AesBodyCipher::from_config(&config.vault)?);
        let store =
            SqliteJournalStore::open(&config.storage, config.memory.embedding_dimensions).await?;
        let embedder = SharedEmbedder::lazy_onnx(model_manager(&config), &config.memory);
        info!(
            database = %config.storage.database_path,
            vector_search = store.database().supports_vector_search(),
            "journal opened"
        );
        Self::from_parts(store, cipher, embedder, config)
    }

    pub fn from_parts(
        store: SqliteJournalStore,
        cipher: Arc<dyn BodyCipher>,
        embedder: SharedEmbedder,
        config: MemoirConfig,
    ) -> Result<Self, MemoirError> {
        Ok(Self {
            store: Arc::new(store),
            cipher,
            embedder,
            keywords: Arc::new(FrequencyKeywordExtractor::new()?),
            config,
        })
    }

    /// Wait for the embedding model with no time limit, so a first-run
    /// download finishes before batch indexing starts.
    pub async fn load_embedder(&self) {
        if let Err(e) = self.embedder.preload().await {
            warn!(error = %e, "embedding model unavailable, queued entries will be retried");
        }
    }

    pub fn indexer(&self) -> EntryIndexer {
        EntryIndexer::new(
            self.store.clone(),
            self.store.clone(),
            self.cipher.clone(),
            self.keywords.clone(),
            self.embedder.clone(),
            self.config.memory.clone(),
        )
    }

    pub fn assembler(&self) -> RagContextAssembler {
        RagContextAssembler::new(
            SummaryRetriever::new(self.store.clone(), self.embedder.clone()),
            HybridEntryRetriever::new(
                self.store.clone(),
                self.embedder.clone(),
                self.keywords.clone(),
                self.cipher.clone(),
                self.config.retrieval.clone(),
            ),
            self.cipher.clone(),
            self.config.summary.clone(),
        )
    }
}

pub fn model_manager(config: &MemoirConfig) -> ModelManager {
    ModelManager::new(
        PathBuf::from(&config.agent.data_dir),
        config.memory.model_name.clone(),
    )
}

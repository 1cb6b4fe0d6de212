// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Period summary lookup: nearest by vector, or most recent when degraded.

use std::sync::Arc;

use memoir_core::{MemoirError, Summary, SummaryStore};
use tracing::{debug, warn};

use crate::shared::SharedEmbedder;

pub struct SummaryRetriever {
    store: Arc<dyn SummaryStore>,
    embedder: SharedEmbedder,
}

impl SummaryRetriever {
    pub fn new(store: Arc<dyn SummaryStore>, embedder: SharedEmbedder) -> Self {
        Self { store, embedder }
    }

    /// Up to `limit` of the owner's summaries relevant to `query`.
    ///
    /// Summaries without a vector only surface through the recency fallback.
    pub async fn retrieve(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Summary>, MemoirError> {
        if limit == 0 {
            return Ok(vec![]);
        }

        if self.store.supports_nearest_neighbor() {
            match self.embedder.embed_one(query).await {
                Ok(vector) => {
                    let hits = self.store.nearest_summaries(owner_id, &vector, limit).await?;
                    debug!(owner_id, mode = "vector", returned = hits.len(), "summaries retrieved");
                    return Ok(hits.into_iter().map(|(summary, _)| summary).collect());
                }
                Err(e) => {
                    warn!(owner_id, error = %e, "query embedding failed, using recent summaries");
                }
            }
        }

        let recent = self.store.recent_summaries(owner_id, limit).await?;
        debug!(owner_id, mode = "recent", returned = recent.len(), "summaries retrieved");
        Ok(recent)
    }
}

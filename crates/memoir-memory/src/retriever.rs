// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid entry retriever: vector-nearest plus keyword candidates, re-ranked.
//!
//! With nearest-neighbor support and a working embedder, up to
//! `vector_candidates` nearest entries are merged with up to
//! `keyword_candidates` keyword matches and scored (see [`crate::scoring`]).
//! Otherwise the retriever degrades to keyword matches, newest first, and
//! finally to the most recent entries. A missing or failing embedder never
//! turns into an error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use memoir_config::model::RetrievalConfig;
use memoir_core::{
    BodyCipher, Entry, EntryStore, KeywordAdapter, MatchedBy, MemoirError, RetrievalCandidate,
};
use tracing::{debug, warn};

use crate::scoring::{self, ScoreBreakdown};
use crate::shared::SharedEmbedder;

/// An entry with the provenance and score that placed it.
///
/// `score` is `None` for results produced in degraded mode.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: Entry,
    pub matched_by: MatchedBy,
    pub score: Option<ScoreBreakdown>,
}

pub struct HybridEntryRetriever {
    store: Arc<dyn EntryStore>,
    embedder: SharedEmbedder,
    keywords: Arc<dyn KeywordAdapter>,
    cipher: Arc<dyn BodyCipher>,
    config: RetrievalConfig,
}

impl HybridEntryRetriever {
    pub fn new(
        store: Arc<dyn EntryStore>,
        embedder: SharedEmbedder,
        keywords: Arc<dyn KeywordAdapter>,
        cipher: Arc<dyn BodyCipher>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            keywords,
            cipher,
            config,
        }
    }

    /// Up to `limit` of the owner's entries most relevant to `query`.
    ///
    /// Returned entries carry their stored (encrypted) bodies.
    pub async fn retrieve(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Entry>, MemoirError> {
        let scored = self.retrieve_scored(owner_id, query, limit, Utc::now()).await?;
        Ok(scored.into_iter().map(|s| s.entry).collect())
    }

    /// [`retrieve`](Self::retrieve) with the configured default limit.
    pub async fn retrieve_default(
        &self,
        owner_id: &str,
        query: &str,
    ) -> Result<Vec<Entry>, MemoirError> {
        self.retrieve(owner_id, query, self.config.default_limit).await
    }

    /// Like [`retrieve`](Self::retrieve), evaluated at `now` and keeping scores.
    pub async fn retrieve_scored(
        &self,
        owner_id: &str,
        query: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredEntry>, MemoirError> {
        if limit == 0 {
            return Ok(vec![]);
        }

        let keywords = self.query_keywords(query);

        if self.store.supports_nearest_neighbor() {
            match self.embedder.embed_one(query).await {
                Ok(vector) => {
                    return self
                        .vector_mode(owner_id, &vector, &keywords, limit, now)
                        .await;
                }
                Err(e) => {
                    warn!(owner_id, error = %e, "query embedding failed, using degraded retrieval");
                }
            }
        } else {
            debug!(owner_id, "nearest-neighbor search unavailable, using degraded retrieval");
        }

        self.degraded_mode(owner_id, &keywords, limit).await
    }

    fn query_keywords(&self, query: &str) -> Vec<String> {
        match self.keywords.extract(query, self.config.keyword_count) {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!(error = %e, "keyword extraction failed, continuing without keywords");
                vec![]
            }
        }
    }

    async fn vector_mode(
        &self,
        owner_id: &str,
        query_vector: &[f32],
        keywords: &[String],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScoredEntry>, MemoirError> {
        let nearest = self
            .store
            .nearest_entries(owner_id, query_vector, self.config.vector_candidates)
            .await?;
        let vector_ids: Vec<String> = nearest.iter().map(|(id, _)| id.clone()).collect();

        let keyword_hits = if keywords.is_empty() {
            vec![]
        } else {
            self.store
                .keyword_entries(owner_id, keywords, &vector_ids, self.config.keyword_candidates)
                .await?
        };

        let mut by_id: HashMap<String, Entry> = self
            .store
            .get_entries(owner_id, &vector_ids)
            .await?
            .into_iter()
            .map(|e| (e.id.clone(), e))
            .collect();

        let mut candidates: Vec<RetrievalCandidate> = nearest
            .into_iter()
            .filter_map(|(id, distance)| {
                by_id.remove(&id).map(|entry| RetrievalCandidate {
                    entry,
                    distance: Some(distance),
                    matched_by: MatchedBy::Vector,
                })
            })
            .collect();
        candidates.extend(keyword_hits.into_iter().map(|entry| RetrievalCandidate {
            entry,
            distance: None,
            matched_by: MatchedBy::Keyword,
        }));

        let candidate_count = candidates.len();
        let mut ranked = self.rank(candidates, keywords, now);
        ranked.truncate(limit);

        debug!(
            owner_id,
            mode = "vector",
            candidates = candidate_count,
            returned = ranked.len(),
            "entries retrieved"
        );
        Ok(ranked)
    }

    fn rank(
        &self,
        candidates: Vec<RetrievalCandidate>,
        keywords: &[String],
        now: DateTime<Utc>,
    ) -> Vec<ScoredEntry> {
        let mut scored: Vec<ScoredEntry> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let body = match self.cipher.decrypt(&candidate.entry.body) {
                Ok(body) => body,
                Err(e) => {
                    warn!(entry_id = %candidate.entry.id, error = %e, "skipping candidate with undecryptable body");
                    continue;
                }
            };

            let matches = scoring::keyword_matches(keywords, &candidate.entry.title, &body);
            let score = scoring::score(
                candidate.distance,
                candidate.entry.created_at,
                matches,
                now,
                &self.config,
            );
            let matched_by = match candidate.matched_by {
                MatchedBy::Vector if matches > 0 => MatchedBy::Both,
                other => other,
            };

            scored.push(ScoredEntry {
                entry: candidate.entry,
                matched_by,
                score: Some(score),
            });
        }

        scored.sort_by(|a, b| {
            let (sa, sb) = (total(a), total(b));
            sb.total_cmp(&sa)
                .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        });
        scored
    }

    async fn degraded_mode(
        &self,
        owner_id: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredEntry>, MemoirError> {
        if !keywords.is_empty() {
            let hits = self
                .store
                .keyword_entries(owner_id, keywords, &[], limit)
                .await?;
            if !hits.is_empty() {
                debug!(owner_id, mode = "keyword", returned = hits.len(), "entries retrieved");
                return Ok(unscored(hits, MatchedBy::Keyword));
            }
        }

        let recent = self.store.recent_entries(owner_id, limit).await?;
        debug!(owner_id, mode = "recent", returned = recent.len(), "entries retrieved");
        Ok(unscored(recent, MatchedBy::Recent))
    }
}

fn total(s: &ScoredEntry) -> f64 {
    s.score.map(|b| b.total).unwrap_or(0.0)
}

fn unscored(entries: Vec<Entry>, matched_by: MatchedBy) -> Vec<ScoredEntry> {
    entries
        .into_iter()
        .map(|entry| ScoredEntry {
            entry,
            matched_by,
            score: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use memoir_test_utils::{FailingEmbedder, TestJournal};
    use tracing_test::traced_test;

    use crate::keywords::FrequencyKeywordExtractor;

    #[tokio::test]
    #[traced_test]
    async fn embedder_failure_degrades_and_is_logged() {
        let journal = TestJournal::new().await.unwrap();
        journal.entry("alice", "Beach", "sand", None, 1).await.unwrap();

        let retriever = HybridEntryRetriever::new(
            journal.entries(),
            SharedEmbedder::new(Arc::new(FailingEmbedder::new()), 8, Duration::from_millis(200)),
            Arc::new(FrequencyKeywordExtractor::new().unwrap()),
            journal.body_cipher(),
            RetrievalConfig::default(),
        );

        let results = retriever.retrieve("alice", "beach", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(logs_contain("query embedding failed, using degraded retrieval"));
    }
}

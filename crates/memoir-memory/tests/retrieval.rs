// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid entry retrieval against a real SQLite journal.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use memoir_config::model::MemoryConfig;
use memoir_core::{EmbeddingAdapter, EntryStore, MatchedBy};
use memoir_memory::{FrequencyKeywordExtractor, HybridEntryRetriever, ModelManager, SharedEmbedder};
use memoir_test_utils::{FailingEmbedder, HashEmbedder, TestJournal};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn shared(journal: &TestJournal, adapter: Arc<dyn EmbeddingAdapter>) -> SharedEmbedder {
    SharedEmbedder::new(
        adapter,
        journal.config.memory.embedding_dimensions,
        Duration::from_millis(500),
    )
}

fn retriever(journal: &TestJournal, embedder: SharedEmbedder) -> HybridEntryRetriever {
    HybridEntryRetriever::new(
        journal.entries(),
        embedder,
        Arc::new(FrequencyKeywordExtractor::new().unwrap()),
        journal.body_cipher(),
        journal.config.retrieval.clone(),
    )
}

/// A journal whose every entry and query embeds to the same vector, so
/// similarity is equal for all candidates.
async fn flat_journal() -> (TestJournal, SharedEmbedder, Vec<f32>) {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(HashEmbedder::constant(8)));
    let vector = embedder.embed_one("anything").await.unwrap();
    (journal, embedder, vector)
}

// ---- Owner isolation and limits ----

#[tokio::test]
async fn never_returns_another_owners_entries() {
    let (journal, embedder, vector) = flat_journal().await;
    for i in 0..4 {
        let a = journal
            .entry("alice", &format!("alice {i}"), "beach walk", None, i)
            .await
            .unwrap();
        journal.embed(&a, &vector).await.unwrap();
        let b = journal
            .entry("bob", &format!("bob {i}"), "beach walk", None, i)
            .await
            .unwrap();
        journal.embed(&b, &vector).await.unwrap();
    }

    let results = retriever(&journal, embedder)
        .retrieve("alice", "beach", 10)
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|e| e.owner_id == "alice"));
}

#[tokio::test]
async fn returns_at_most_limit_entries() {
    let (journal, embedder, vector) = flat_journal().await;
    for i in 0..12 {
        let e = journal
            .entry("alice", &format!("day {i}"), "ordinary day", None, i)
            .await
            .unwrap();
        journal.embed(&e, &vector).await.unwrap();
    }

    let retriever = retriever(&journal, embedder);
    assert_eq!(retriever.retrieve("alice", "day", 5).await.unwrap().len(), 5);
    assert!(retriever.retrieve("alice", "day", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn default_limit_comes_from_config() {
    let (journal, embedder, vector) = flat_journal().await;
    for i in 0..7 {
        let e = journal
            .entry("alice", &format!("day {i}"), "ordinary day", None, i)
            .await
            .unwrap();
        journal.embed(&e, &vector).await.unwrap();
    }

    let results = retriever(&journal, embedder)
        .retrieve_default("alice", "day")
        .await
        .unwrap();
    assert_eq!(results.len(), journal.config.retrieval.default_limit);
}

#[tokio::test]
async fn returned_bodies_stay_encrypted() {
    let (journal, embedder, vector) = flat_journal().await;
    let e = journal
        .entry("alice", "Secret", "nobody should read this", None, 1)
        .await
        .unwrap();
    journal.embed(&e, &vector).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve("alice", "secret", 3)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_ne!(results[0].body, "nobody should read this");
}

#[tokio::test]
async fn undecryptable_candidates_are_skipped() {
    let (journal, embedder, vector) = flat_journal().await;
    let good = journal.entry("alice", "Good", "fine", None, 1).await.unwrap();
    journal.embed(&good, &vector).await.unwrap();
    let bad = journal.corrupt_entry("alice", "Bad", 1).await.unwrap();
    journal.embed(&bad, &vector).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve("alice", "anything", 5)
        .await
        .unwrap();
    let ids: Vec<_> = results.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![good.id.as_str()]);
}

// ---- Ranking ----

#[tokio::test]
async fn keyword_match_outranks_a_more_recent_entry() {
    let (journal, embedder, vector) = flat_journal().await;
    let old = journal
        .entry_at("alice", "Ocean day", "Swam in the ocean.", None, at(2026, 1, 10))
        .await
        .unwrap();
    journal.embed(&old, &vector).await.unwrap();
    let new = journal
        .entry_at("alice", "Groceries", "Bought bread and milk.", None, at(2026, 5, 28))
        .await
        .unwrap();
    journal.embed(&new, &vector).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "ocean", 2, at(2026, 6, 1))
        .await
        .unwrap();

    assert_eq!(results[0].entry.id, old.id);
    assert_eq!(results[0].matched_by, MatchedBy::Both);
    assert_eq!(results[1].entry.id, new.id);
    assert_eq!(results[1].matched_by, MatchedBy::Vector);

    let top = results[0].score.unwrap();
    let second = results[1].score.unwrap();
    assert!(top.keyword_bonus > 0.0);
    assert!(top.recency < second.recency);
    assert!(top.total > second.total);
}

fn basis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; 8];
    v[i] = 1.0;
    v
}

#[tokio::test]
async fn oldest_entry_with_the_unique_keyword_ranks_first() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(
        &journal,
        Arc::new(HashEmbedder::new(8).pin("lighthouse", basis(0))),
    );

    let oldest = journal
        .entry("alice", "Coast", "Climbed the old lighthouse.", None, 400)
        .await
        .unwrap();
    journal.embed(&oldest, &basis(0)).await.unwrap();
    let middle = journal.entry("alice", "Work", "Deadline week.", None, 10).await.unwrap();
    journal.embed(&middle, &basis(1)).await.unwrap();
    let today = journal.entry("alice", "Today", "Cooked dinner.", None, 0).await.unwrap();
    journal.embed(&today, &basis(2)).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "lighthouse", 3, Utc::now())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].entry.id, oldest.id);
    assert_eq!(results[0].matched_by, MatchedBy::Both);
    let top = results[0].score.unwrap();
    assert!(results[1..].iter().all(|s| s.score.unwrap().recency > top.recency));
}

#[tokio::test]
async fn same_month_in_any_year_gets_the_seasonal_bonus() {
    let (journal, embedder, vector) = flat_journal().await;
    let this_march = journal
        .entry_at("alice", "Spring", "Cherry blossoms.", None, at(2026, 3, 2))
        .await
        .unwrap();
    let last_march = journal
        .entry_at("alice", "Last spring", "Rainy week.", None, at(2025, 3, 10))
        .await
        .unwrap();
    let november = journal
        .entry_at("alice", "Autumn", "Leaves everywhere.", None, at(2025, 11, 20))
        .await
        .unwrap();
    for e in [&this_march, &last_march, &november] {
        journal.embed(e, &vector).await.unwrap();
    }

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "memories", 3, at(2026, 3, 20))
        .await
        .unwrap();

    let ids: Vec<_> = results.iter().map(|s| s.entry.id.clone()).collect();
    assert_eq!(ids, vec![this_march.id, last_march.id, november.id]);
    assert!(results[0].score.unwrap().seasonality > 0.0);
    assert!(results[1].score.unwrap().seasonality > 0.0);
    assert_eq!(results[2].score.unwrap().seasonality, 0.0);
}

#[tokio::test]
async fn equal_scores_break_ties_by_newest() {
    let (journal, embedder, vector) = flat_journal().await;
    let earlier = journal
        .entry_at("alice", "One", "x", None, Utc.with_ymd_and_hms(2026, 4, 3, 8, 0, 0).unwrap())
        .await
        .unwrap();
    let later = journal
        .entry_at("alice", "Two", "y", None, Utc.with_ymd_and_hms(2026, 4, 3, 20, 0, 0).unwrap())
        .await
        .unwrap();
    journal.embed(&earlier, &vector).await.unwrap();
    journal.embed(&later, &vector).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "", 2, at(2026, 4, 10))
        .await
        .unwrap();
    assert_eq!(results[0].score.unwrap().total, results[1].score.unwrap().total);
    assert_eq!(results[0].entry.id, later.id);
}

#[tokio::test]
async fn keyword_only_candidates_join_vector_hits() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(HashEmbedder::new(8)));

    // Indexed keywords but no embedding yet.
    let pending = journal
        .entry("alice", "Untitled", "We hiked the ridge.", None, 3)
        .await
        .unwrap();
    journal
        .store
        .set_search_keywords(&pending.id, "hiked ridge")
        .await
        .unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "ridge", 5, Utc::now())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matched_by, MatchedBy::Keyword);
    assert_eq!(results[0].score.unwrap().similarity, 0.0);
}

// ---- Degraded mode ----

#[tokio::test]
async fn failing_embedder_falls_back_to_keyword_matches() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::new()));
    let beach = journal.entry("alice", "Beach trip", "sand", None, 30).await.unwrap();
    journal.entry("alice", "Office", "meetings", None, 1).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "beach", 5, Utc::now())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, beach.id);
    assert_eq!(results[0].matched_by, MatchedBy::Keyword);
    assert!(results[0].score.is_none());
}

#[tokio::test]
async fn capitalized_non_ascii_titles_match_their_keywords() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::new()));
    let summer = journal.entry("alice", "Été à Nice", "soleil", None, 30).await.unwrap();
    let leave = journal.entry("alice", "Отпуск", "горы", None, 20).await.unwrap();
    journal.entry("alice", "Office", "meetings", None, 1).await.unwrap();

    let retriever = retriever(&journal, embedder);

    let results = retriever
        .retrieve_scored("alice", "été", 5, Utc::now())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, summer.id);
    assert_eq!(results[0].matched_by, MatchedBy::Keyword);

    let results = retriever
        .retrieve_scored("alice", "ОТПУСК", 5, Utc::now())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].entry.id, leave.id);
    assert_eq!(results[0].matched_by, MatchedBy::Keyword);
}

#[tokio::test]
async fn failing_embedder_without_keyword_hits_returns_recent_entries() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::new()));
    journal.entry("alice", "Old", "a", None, 10).await.unwrap();
    let newest = journal.entry("alice", "New", "b", None, 0).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "volcano", 5, Utc::now())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].entry.id, newest.id);
    assert!(results.iter().all(|s| s.matched_by == MatchedBy::Recent));
}

#[tokio::test]
async fn blank_query_in_degraded_mode_returns_recent_entries() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::new()));
    journal.entry("alice", "Old", "a", None, 10).await.unwrap();
    let newest = journal.entry("alice", "New", "b", None, 0).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve_scored("alice", "  \n ", 5, Utc::now())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].entry.id, newest.id);
    assert!(results.iter().all(|s| s.matched_by == MatchedBy::Recent));
}

#[tokio::test]
async fn hanging_embedder_times_out_into_degraded_mode() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::hanging()));
    journal.entry("alice", "Kept", "x", None, 0).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve("alice", "kept", 5)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn stalled_model_download_degrades_within_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(600)))
        .mount(&server)
        .await;

    let journal = TestJournal::new().await.unwrap();
    let models = tempfile::tempdir().unwrap();
    let model = ModelManager::new(models.path(), "tiny").with_urls(
        format!("{}/model.onnx", server.uri()),
        format!("{}/tokenizer.json", server.uri()),
    );
    let embedder = SharedEmbedder::lazy_onnx(
        model,
        &MemoryConfig {
            embedding_dimensions: 8,
            embedding_timeout_secs: 1,
            ..MemoryConfig::default()
        },
    );
    let kept = journal.entry("alice", "Kept", "x", None, 0).await.unwrap();
    let retriever = retriever(&journal, embedder);

    for _ in 0..2 {
        let started = std::time::Instant::now();
        let results = retriever
            .retrieve_scored("alice", "kept", 5, Utc::now())
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, kept.id);
        assert_eq!(results[0].matched_by, MatchedBy::Keyword);
    }
}

#[tokio::test]
async fn store_without_vector_search_never_embeds_queries() {
    let journal = TestJournal::builder()
        .without_vector_search()
        .build()
        .await
        .unwrap();
    let hash = Arc::new(HashEmbedder::new(8));
    let embedder = shared(&journal, hash.clone());
    journal.entry("alice", "Lake", "x", None, 2).await.unwrap();

    let results = retriever(&journal, embedder)
        .retrieve("alice", "lake", 5)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(hash.calls(), 0);
}

#[tokio::test]
async fn empty_journal_returns_nothing() {
    let journal = TestJournal::new().await.unwrap();
    let embedder = shared(&journal, Arc::new(FailingEmbedder::new()));
    let results = retriever(&journal, embedder)
        .retrieve("alice", "anything", 5)
        .await
        .unwrap();
    assert!(results.is_empty());
}

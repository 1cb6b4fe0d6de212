// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ranking formula for hybrid entry retrieval.
//!
//! `final = similarity * w_sim + recency * w_rec + seasonality + keyword_bonus`
//! where `similarity = 1 / (1 + l2_distance)` (0 for keyword-only
//! candidates) and `recency = 1 / (1 + days / horizon)`.

use chrono::{DateTime, Datelike, Utc};
use memoir_config::model::RetrievalConfig;

/// Per-component scores for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub similarity: f64,
    pub recency: f64,
    pub seasonality: f64,
    pub keyword_bonus: f64,
    pub total: f64,
}

pub fn similarity(distance: Option<f64>) -> f64 {
    match distance {
        Some(d) if d.is_finite() => 1.0 / (1.0 + d.max(0.0)),
        _ => 0.0,
    }
}

/// Decays with whole calendar days elapsed. Future dates count as today.
pub fn recency(created_at: DateTime<Utc>, now: DateTime<Utc>, horizon_days: f64) -> f64 {
    let days = (now.date_naive() - created_at.date_naive()).num_days().max(0) as f64;
    1.0 / (1.0 + days / horizon_days)
}

/// Flat bonus when the entry was written in the current calendar month of any year.
pub fn seasonality(created_at: DateTime<Utc>, now: DateTime<Utc>, bonus: f64) -> f64 {
    if created_at.month() == now.month() { bonus } else { 0.0 }
}

/// Distinct keywords found in the title or body, case-insensitively.
pub fn keyword_matches(keywords: &[String], title: &str, body: &str) -> usize {
    let title = title.to_lowercase();
    let body = body.to_lowercase();
    let mut seen: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let k = keyword.trim().to_lowercase();
        if k.is_empty() || seen.contains(&k) {
            continue;
        }
        if title.contains(&k) || body.contains(&k) {
            seen.push(k);
        }
    }
    seen.len()
}

pub fn keyword_bonus(matches: usize, config: &RetrievalConfig) -> f64 {
    if matches == 0 {
        0.0
    } else {
        config.keyword_base_bonus + config.keyword_per_match_bonus * matches as f64
    }
}

/// Score one candidate.
pub fn score(
    distance: Option<f64>,
    created_at: DateTime<Utc>,
    keyword_matches: usize,
    now: DateTime<Utc>,
    config: &RetrievalConfig,
) -> ScoreBreakdown {
    let similarity = similarity(distance);
    let recency = recency(created_at, now, config.recency_horizon_days);
    let seasonality = seasonality(created_at, now, config.seasonality_bonus);
    let keyword_bonus = keyword_bonus(keyword_matches, config);
    ScoreBreakdown {
        similarity,
        recency,
        seasonality,
        keyword_bonus,
        total: similarity * config.similarity_weight
            + recency * config.recency_weight
            + seasonality
            + keyword_bonus,
    }
}

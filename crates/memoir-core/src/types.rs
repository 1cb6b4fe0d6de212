// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the journal memory system.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Keyword,
    Summarizer,
    Storage,
    Cipher,
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, one vector is produced per text.
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimension of every vector in `embeddings`.
    pub dimensions: usize,
}

// --- Journal types ---

/// One journal record belonging to one owner.
///
/// `body` is ciphertext. It is only ever turned into plaintext through a
/// [`BodyCipher`](crate::traits::BodyCipher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    /// Encrypted body envelope.
    pub body: String,
    /// Emotion label attached by the author, if any.
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Space-separated derived keyword index, maintained by the indexer.
    pub search_keywords: Option<String>,
}

impl Entry {
    /// Create a new entry with a random id and no derived keyword index.
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        mood: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            title: title.into(),
            body: body.into(),
            mood,
            created_at,
            search_keywords: None,
        }
    }

    /// Calendar date of creation (UTC).
    pub fn created_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// A leased entry re-index task from the durable queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTask {
    /// Queue row id, used to ack or fail the lease.
    pub id: i64,
    pub entry_id: String,
    /// Failed attempts before this lease.
    pub attempts: u32,
}

/// Length of a summarized window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PeriodType {
    Weekly,
    Monthly,
}

impl PeriodType {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Weekly => "WEEKLY",
            PeriodType::Monthly => "MONTHLY",
        }
    }

    /// Inclusive window of this period type that contains `date`.
    ///
    /// Weeks run Monday through Sunday; months are calendar months.
    pub fn window_containing(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            PeriodType::Weekly => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                let start = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
                (start, end)
            }
            PeriodType::Monthly => {
                let start = date.with_day(1).unwrap_or(date);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(date);
                (start, end)
            }
        }
    }

    /// The most recently completed window strictly before the one containing `today`.
    pub fn previous_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let (current_start, _) = self.window_containing(today);
        let last_day = current_start.pred_opt().unwrap_or(current_start);
        self.window_containing(last_day)
    }
}

/// A compressed digest of all entries in one weekly or monthly window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub owner_id: String,
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    /// Inclusive end of the window.
    pub end_date: NaiveDate,
    pub summary_text: String,
    /// Embedding of `summary_text`. `None` until the embedding step completes.
    #[serde(skip)]
    pub vector: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which retrieval path surfaced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MatchedBy {
    Vector,
    Keyword,
    Both,
    /// Degraded-mode fallback to the newest entries.
    Recent,
}

/// Transient carrier of provenance from candidate generation into scoring.
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    pub entry: Entry,
    /// Raw L2 distance. `None` for keyword-only candidates.
    pub distance: Option<f64>,
    pub matched_by: MatchedBy,
}

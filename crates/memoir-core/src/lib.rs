// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Memoir journal memory system.
//!
//! This crate provides the error type, the journal domain types (entries,
//! period summaries, retrieval candidates) and the collaborator traits that
//! the storage, vault and memory crates implement or consume.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MemoirError;
pub use types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, Entry, HealthStatus, IndexTask, MatchedBy,
    PeriodType, RetrievalCandidate, Summary,
};

pub use traits::{
    BodyCipher, EmbeddingAdapter, EntryStore, IndexQueue, KeywordAdapter, PluginAdapter,
    SummarizerAdapter, SummaryStore,
};

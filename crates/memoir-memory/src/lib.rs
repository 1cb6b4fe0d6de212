// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Journal memory for Memoir: retrieval, summarization and context assembly.
//!
//! ## Architecture
//!
//! - **OnnxEmbedder** / **ModelManager**: local 384-dim embeddings, downloaded on first use
//! - **SharedEmbedder**: one embedding handle per process, with timeouts and dimension checks
//! - **FrequencyKeywordExtractor**: frequency-ranked query and body keywords
//! - **HybridEntryRetriever**: vector + keyword candidates, re-ranked by similarity,
//!   recency, seasonality and keyword matches; degrades without an embedder
//! - **SummaryRetriever**: nearest period summaries, or the most recent ones
//! - **SummarizationJob** / **SummarySchedule**: weekly and monthly digests
//! - **EntryIndexer**: queued embedding and keyword recomputation after writes
//! - **RagContextAssembler**: summaries plus entries rendered for the conversational model

pub mod assembler;
pub mod embedder;
pub mod indexer;
pub mod keywords;
pub mod model_manager;
pub mod retriever;
pub mod schedule;
pub mod scoring;
pub mod shared;
pub mod summarizer;
pub mod summary_retriever;

pub use assembler::{ContextPayload, ContextSection, NO_RELEVANT_CONTEXT, RagContextAssembler};
pub use embedder::OnnxEmbedder;
pub use indexer::{EntryIndexer, IndexOutcome, IndexReport};
pub use keywords::FrequencyKeywordExtractor;
pub use model_manager::ModelManager;
pub use retriever::{HybridEntryRetriever, ScoredEntry};
pub use schedule::{ScheduleReport, SummarySchedule};
pub use shared::SharedEmbedder;
pub use summarizer::{JobState, SummarizationJob, SummaryOutcome};
pub use summary_retriever::SummaryRetriever;

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Async collaborators use `#[async_trait]` for dynamic dispatch
//! compatibility; every component receives them as `Arc<dyn Trait>`.

pub mod adapter;
pub mod cipher;
pub mod embedding;
pub mod keywords;
pub mod storage;
pub mod summarizer;

pub use adapter::PluginAdapter;
pub use cipher::BodyCipher;
pub use embedding::EmbeddingAdapter;
pub use keywords::KeywordAdapter;
pub use storage::{EntryStore, IndexQueue, SummaryStore};
pub use summarizer::SummarizerAdapter;

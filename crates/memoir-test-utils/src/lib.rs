// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Memoir integration tests.
//!
//! Provides deterministic stand-ins for the embedding and summarization
//! collaborators and a harness around a temporary journal database.
//!
//! # Components
//!
//! - [`HashEmbedder`] - Deterministic embeddings derived from the input text
//! - [`FailingEmbedder`] - Embedder that errors or never answers
//! - [`MockSummarizer`] - Summarizer with pre-configured responses
//! - [`TestJournal`] - Temp SQLite journal with a body cipher and entry factory

pub mod harness;
pub mod mock_embedder;
pub mod mock_summarizer;

pub use harness::TestJournal;
pub use mock_embedder::{FailingEmbedder, HashEmbedder};
pub use mock_summarizer::MockSummarizer;

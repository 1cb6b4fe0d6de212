// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword extraction trait.

use crate::error::MemoirError;

/// Extracts the most relevant keywords from free text.
///
/// Short or empty text yields an empty list, never an error.
pub trait KeywordAdapter: Send + Sync {
    /// Returns up to `top_n` keywords ordered by relevance, most relevant first.
    fn extract(&self, text: &str, top_n: usize) -> Result<Vec<String>, MemoirError>;
}

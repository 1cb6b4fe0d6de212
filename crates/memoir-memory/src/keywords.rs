// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frequency-ranked keyword extraction.

use std::collections::HashMap;

use memoir_core::{KeywordAdapter, MemoirError};
use regex::Regex;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "down", "during", "each", "few", "for", "from", "had", "has", "have", "having", "he",
    "her", "here", "hers", "him", "his", "how", "if", "in", "into", "is", "it", "its", "just",
    "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "our", "out", "over", "own", "same", "she", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "why", "will", "with", "would", "you", "your",
];

/// Ranks words by how often they occur.
///
/// Text is lowercased and split on non-word characters. Tokens shorter than
/// two characters, pure numbers and common English stopwords are dropped.
/// Ties keep first-occurrence order.
pub struct FrequencyKeywordExtractor {
    word: Regex,
}

impl FrequencyKeywordExtractor {
    pub fn new() -> Result<Self, MemoirError> {
        let word = Regex::new(r"\w+")
            .map_err(|e| MemoirError::Internal(format!("keyword pattern: {e}")))?;
        Ok(Self { word })
    }

    fn keep(token: &str) -> bool {
        token.chars().count() >= 2
            && !token.chars().all(|c| c.is_ascii_digit())
            && !STOPWORDS.contains(&token)
    }
}

impl KeywordAdapter for FrequencyKeywordExtractor {
    fn extract(&self, text: &str, top_n: usize) -> Result<Vec<String>, MemoirError> {
        let lowered = text.to_lowercase();

        // token -> (count, first position)
        let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
        for (pos, m) in self.word.find_iter(&lowered).enumerate() {
            let token = m.as_str();
            if Self::keep(token) {
                seen.entry(token).or_insert((0, pos)).0 += 1;
            }
        }

        let mut ranked: Vec<(&str, usize, usize)> =
            seen.into_iter().map(|(t, (n, first))| (t, n, first)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        Ok(ranked
            .into_iter()
            .take(top_n)
            .map(|(t, _, _)| t.to_string())
            .collect())
    }
}

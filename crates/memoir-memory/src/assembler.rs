// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the two-tier (summaries, then entries) context handed to the
//! conversational model.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use memoir_config::model::SummaryConfig;
use memoir_core::{BodyCipher, MemoirError, PeriodType};
use serde::Serialize;
use tracing::{debug, warn};

use crate::retriever::HybridEntryRetriever;
use crate::summary_retriever::SummaryRetriever;

/// Rendered in place of a context block when nothing relevant was found.
pub const NO_RELEVANT_CONTEXT: &str = "NO_RELEVANT_CONTEXT";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryItem {
    pub period_type: PeriodType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryItem {
    pub date: NaiveDate,
    pub title: String,
    /// Decrypted body.
    pub body: String,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ContextSection {
    Summaries(Vec<SummaryItem>),
    Entries(Vec<EntryItem>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "sections", rename_all = "snake_case")]
pub enum ContextPayload {
    NoRelevantContext,
    /// Summaries first when present, then entries. Never empty.
    Sections(Vec<ContextSection>),
}

impl ContextPayload {
    pub fn is_empty(&self) -> bool {
        matches!(self, ContextPayload::NoRelevantContext)
    }

    pub fn render(&self) -> String {
        let ContextPayload::Sections(sections) = self else {
            return NO_RELEVANT_CONTEXT.to_string();
        };

        let mut out = String::new();
        for section in sections {
            if !out.is_empty() {
                out.push('\n');
            }
            match section {
                ContextSection::Summaries(items) => {
                    out.push_str("=== Period Summaries ===\n");
                    for s in items {
                        let _ = writeln!(
                            out,
                            "- [{}] {}~{}: {}",
                            s.period_type,
                            s.start_date.format("%Y-%m-%d"),
                            s.end_date.format("%Y-%m-%d"),
                            s.text
                        );
                    }
                }
                ContextSection::Entries(items) => {
                    out.push_str("=== Journal Entries ===\n");
                    for e in items {
                        let _ = writeln!(
                            out,
                            "- [{}] {}: {} (Mood: {})",
                            e.date.format("%Y-%m-%d"),
                            e.title,
                            e.body,
                            e.mood.as_deref().unwrap_or("None")
                        );
                    }
                }
            }
        }
        out
    }
}

pub struct RagContextAssembler {
    summaries: SummaryRetriever,
    entries: HybridEntryRetriever,
    cipher: Arc<dyn BodyCipher>,
    config: SummaryConfig,
}

impl RagContextAssembler {
    pub fn new(
        summaries: SummaryRetriever,
        entries: HybridEntryRetriever,
        cipher: Arc<dyn BodyCipher>,
        config: SummaryConfig,
    ) -> Self {
        Self {
            summaries,
            entries,
            cipher,
            config,
        }
    }

    /// Gather summaries and entries for `query` concurrently.
    pub async fn build(&self, owner_id: &str, query: &str) -> Result<ContextPayload, MemoirError> {
        let (summaries, entries) = tokio::join!(
            self.summaries
                .retrieve(owner_id, query, self.config.context_summaries),
            self.entries
                .retrieve(owner_id, query, self.config.context_entries),
        );
        let (summaries, entries) = (summaries?, entries?);

        let summary_items: Vec<SummaryItem> = summaries
            .into_iter()
            .map(|s| SummaryItem {
                period_type: s.period_type,
                start_date: s.start_date,
                end_date: s.end_date,
                text: s.summary_text,
            })
            .collect();

        let entry_items: Vec<EntryItem> = entries
            .into_iter()
            .filter_map(|entry| match self.cipher.decrypt(&entry.body) {
                Ok(body) => Some(EntryItem {
                    date: entry.created_date(),
                    title: entry.title,
                    body,
                    mood: entry.mood,
                }),
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "dropping entry with undecryptable body from context");
                    None
                }
            })
            .collect();

        debug!(
            owner_id,
            summaries = summary_items.len(),
            entries = entry_items.len(),
            "context assembled"
        );

        let mut sections = Vec::with_capacity(2);
        if !summary_items.is_empty() {
            sections.push(ContextSection::Summaries(summary_items));
        }
        if !entry_items.is_empty() {
            sections.push(ContextSection::Entries(entry_items));
        }

        if sections.is_empty() {
            Ok(ContextPayload::NoRelevantContext)
        } else {
            Ok(ContextPayload::Sections(sections))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_payload_renders_marker() {
        assert_eq!(ContextPayload::NoRelevantContext.render(), "NO_RELEVANT_CONTEXT");
        assert!(ContextPayload::NoRelevantContext.is_empty());
    }

    #[test]
    fn renders_summaries_before_entries() {
        let payload = ContextPayload::Sections(vec![
            ContextSection::Summaries(vec![SummaryItem {
                period_type: PeriodType::Weekly,
                start_date: date("2026-03-02"),
                end_date: date("2026-03-08"),
                text: "A quiet week.".to_string(),
            }]),
            ContextSection::Entries(vec![EntryItem {
                date: date("2026-03-05"),
                title: "Swim".to_string(),
                body: "Swam 20 laps.".to_string(),
                mood: Some("calm".to_string()),
            }]),
        ]);

        assert_eq!(
            payload.render(),
            "=== Period Summaries ===\n\
             - [WEEKLY] 2026-03-02~2026-03-08: A quiet week.\n\
             \n\
             === Journal Entries ===\n\
             - [2026-03-05] Swim: Swam 20 laps. (Mood: calm)\n"
        );
    }

    #[test]
    fn entries_only_payload_has_no_summary_header() {
        let payload = ContextPayload::Sections(vec![ContextSection::Entries(vec![EntryItem {
            date: date("2026-01-01"),
            title: "New year".to_string(),
            body: "Fireworks.".to_string(),
            mood: None,
        }])]);
        let rendered = payload.render();
        assert!(!rendered.contains("Period Summaries"));
        assert!(rendered.ends_with("(Mood: None)\n"));
    }

    #[test]
    fn payload_serializes_with_tags() {
        let json = serde_json::to_value(ContextPayload::NoRelevantContext).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "no_relevant_context" }));

        let payload = ContextPayload::Sections(vec![ContextSection::Entries(vec![EntryItem {
            date: date("2026-01-01"),
            title: "New year".to_string(),
            body: "Fireworks.".to_string(),
            mood: None,
        }])]);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "sections");
        assert_eq!(json["sections"][0]["kind"], "entries");
        assert_eq!(json["sections"][0]["items"][0]["date"], "2026-01-01");
    }
}

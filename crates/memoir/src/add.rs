// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memoir add` command implementation.

use std::io::Read;

use chrono::{DateTime, NaiveDate, Utc};
use memoir_core::{Entry, MemoirError};

use crate::journal::Journal;

pub struct AddArgs {
    pub owner: String,
    pub title: String,
    pub mood: Option<String>,
    pub date: Option<String>,
    pub body: Option<String>,
    pub no_index: bool,
}

/// Save one entry, then index it unless `--no-index` was given.
///
/// Without `--body` the body is read from stdin.
pub async fn run_add(journal: &Journal, args: AddArgs) -> Result<Entry, MemoirError> {
    let body = match args.body {
        Some(body) => body,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| MemoirError::InvalidInput(format!("failed to read body from stdin: {e}")))?;
            buf
        }
    };
    if body.trim().is_empty() {
        return Err(MemoirError::InvalidInput("entry body is empty".to_string()));
    }

    let created_at = match args.date.as_deref() {
        Some(date) => parse_date(date)?,
        None => Utc::now(),
    };

    let indexer = journal.indexer();
    let entry = indexer
        .save_entry(&args.owner, &args.title, &body, args.mood, created_at)
        .await?;

    if !args.no_index {
        journal.load_embedder().await;
        indexer.drain().await?;
    }

    println!("{}", entry.id);
    Ok(entry)
}

/// Midday UTC on `date`, so the stored date does not shift near midnight.
fn parse_date(date: &str) -> Result<DateTime<Utc>, MemoirError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| MemoirError::InvalidInput(format!("invalid date {date:?}: {e}")))?;
    day.and_hms_opt(12, 0, 0)
        .map(|t| t.and_utc())
        .ok_or_else(|| MemoirError::InvalidInput(format!("invalid date {date:?}")))
}

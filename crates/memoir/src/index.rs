// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memoir index` command implementation.

use memoir_core::MemoirError;
use memoir_memory::IndexReport;

use crate::journal::Journal;

/// Drain the index queue and print the totals.
pub async fn run_index(journal: &Journal) -> Result<IndexReport, MemoirError> {
    journal.load_embedder().await;
    let report = journal.indexer().drain().await?;
    println!("indexed {} entries, {} failures", report.processed, report.failed);
    Ok(report)
}

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memoir context` command implementation.

use memoir_core::MemoirError;

use crate::journal::Journal;

/// Print the context block the conversational model would receive for `query`.
pub async fn run_context(
    journal: &Journal,
    owner: &str,
    query: &str,
    json: bool,
) -> Result<String, MemoirError> {
    let payload = journal.assembler().build(owner, query).await?;

    let out = if json {
        serde_json::to_string_pretty(&payload)
            .map_err(|e| MemoirError::Internal(format!("failed to serialize context: {e}")))?
    } else {
        payload.render()
    };
    println!("{out}");
    Ok(out)
}

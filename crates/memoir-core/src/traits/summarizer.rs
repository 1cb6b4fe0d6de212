// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarization adapter trait for period digests.

use async_trait::async_trait;

use crate::error::MemoirError;
use crate::traits::adapter::PluginAdapter;
use crate::types::PeriodType;

/// Adapter that condenses a context document into a short digest.
///
/// The period hint lets the implementation frame the digest as a weekly
/// or monthly retrospective. Failures abort only the current job run.
#[async_trait]
pub trait SummarizerAdapter: PluginAdapter {
    /// Summarize `document`, which covers one window of `period` length.
    async fn summarize(&self, document: &str, period: PeriodType) -> Result<String, MemoirError>;
}

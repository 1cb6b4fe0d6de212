// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock summarizer for deterministic testing.
//!
//! Responses are popped from a FIFO queue. When the queue is empty a
//! default "mock summary" text is returned.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use memoir_core::{AdapterType, HealthStatus, MemoirError, PeriodType, PluginAdapter, SummarizerAdapter};

pub struct MockSummarizer {
    responses: Arc<Mutex<VecDeque<String>>>,
    documents: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            documents: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// Every call returns [`MemoirError::Provider`].
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Documents received so far, in call order.
    pub async fn documents(&self) -> Vec<String> {
        self.documents.lock().await.clone()
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSummarizer {
    fn name(&self) -> &str {
        "mock-summarizer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Summarizer
    }

    async fn health_check(&self) -> Result<HealthStatus, MemoirError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemoirError> {
        Ok(())
    }
}

#[async_trait]
impl SummarizerAdapter for MockSummarizer {
    async fn summarize(&self, document: &str, _period: PeriodType) -> Result<String, MemoirError> {
        self.documents.lock().await.push(document.to_string());
        if self.fail {
            return Err(MemoirError::provider("summarizer quota exceeded"));
        }
        Ok(self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock summary".to_string()))
    }
}

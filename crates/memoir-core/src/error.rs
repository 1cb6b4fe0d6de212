// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Memoir journal memory system.

use thiserror::Error;

/// The primary error type used across all Memoir adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MemoirError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding provider errors (model load, tokenization, inference).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Summarization provider errors (network failure, quota, empty output).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Body encryption or decryption failed.
    #[error("vault error: {0}")]
    Vault(String),

    /// Caller supplied an argument that violates a data invariant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemoirError {
    /// Shorthand for an embedding failure without an underlying source.
    pub fn embedding(message: impl Into<String>) -> Self {
        MemoirError::Embedding {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a provider failure without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        MemoirError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true when retrying the same operation later may succeed.
    ///
    /// Collaborator failures and timeouts are retryable; invariant
    /// violations and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MemoirError::Embedding { .. }
                | MemoirError::Provider { .. }
                | MemoirError::Timeout { .. }
                | MemoirError::Storage { .. }
        )
    }
}

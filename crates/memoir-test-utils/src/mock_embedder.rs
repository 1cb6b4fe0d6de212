// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding stand-ins for deterministic tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use memoir_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MemoirError,
    PluginAdapter,
};

/// Embeds text by hashing it, so identical input gives an identical vector.
///
/// Exact texts can be pinned to chosen vectors with [`HashEmbedder::pin`],
/// and [`HashEmbedder::constant`] maps every text to the same vector so that
/// similarity drops out of the ranking.
pub struct HashEmbedder {
    dimensions: usize,
    constant: bool,
    pinned: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            constant: false,
            pinned: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn constant(dimensions: usize) -> Self {
        Self {
            constant: true,
            ..Self::new(dimensions)
        }
    }

    /// Return `vector` whenever exactly `text` is embedded.
    pub fn pin(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        if let Ok(mut pinned) = self.pinned.lock() {
            pinned.insert(text.into(), vector);
        }
        self
    }

    /// Number of texts embedded so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.lock().ok().and_then(|p| p.get(text).cloned()) {
            return v;
        }
        if self.constant {
            let v = 1.0 / (self.dimensions.max(1) as f32).sqrt();
            return vec![v; self.dimensions];
        }

        // FNV-1a over the text, then a per-dimension mix.
        let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            seed ^= u64::from(byte);
            seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let raw: Vec<f32> = (0..self.dimensions as u64)
            .map(|i| {
                let mixed = (seed ^ i.wrapping_mul(0x9e37_79b9_7f4a_7c15)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
                ((mixed >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            raw.iter().map(|v| v / norm).collect()
        } else {
            raw
        }
    }
}

#[async_trait]
impl PluginAdapter for HashEmbedder {
    fn name(&self) -> &str {
        "hash-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemoirError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MemoirError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for HashEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemoirError> {
        self.calls.fetch_add(input.texts.len(), Ordering::SeqCst);
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}

/// An embedder that never produces a vector.
pub struct FailingEmbedder {
    hang: bool,
}

impl FailingEmbedder {
    /// Every call returns [`MemoirError::Embedding`].
    pub fn new() -> Self {
        Self { hang: false }
    }

    /// Every call sleeps far longer than any test timeout.
    pub fn hanging() -> Self {
        Self { hang: true }
    }
}

impl Default for FailingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for FailingEmbedder {
    fn name(&self) -> &str {
        "failing-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemoirError> {
        Ok(HealthStatus::Unhealthy("always fails".to_string()))
    }

    async fn shutdown(&self) -> Result<(), MemoirError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for FailingEmbedder {
    async fn embed(&self, _input: EmbeddingInput) -> Result<EmbeddingOutput, MemoirError> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(MemoirError::embedding("embedding provider unavailable"))
    }
}

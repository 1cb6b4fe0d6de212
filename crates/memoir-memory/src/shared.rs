// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide embedding handle shared by every component.
//!
//! The underlying adapter is created at most once and is never torn down
//! while the process runs. Components receive a clone of the handle through
//! their constructors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use memoir_config::model::MemoryConfig;
use memoir_core::{EmbeddingAdapter, EmbeddingInput, MemoirError};
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::embedder::OnnxEmbedder;
use crate::model_manager::ModelManager;

/// How long a failed model load is remembered before another attempt.
const LOAD_RETRY_AFTER: Duration = Duration::from_secs(60);

type LoadResult = Result<Arc<dyn EmbeddingAdapter>, MemoirError>;

enum LoadState {
    Idle,
    Running(JoinHandle<LoadResult>),
    Failed { at: Instant, reason: String },
}

struct Inner {
    adapter: OnceCell<Arc<dyn EmbeddingAdapter>>,
    model: Option<Arc<ModelManager>>,
    load: Mutex<LoadState>,
    dimensions: usize,
    timeout: Duration,
}

/// Cheaply cloneable embedding handle with init-on-first-use semantics.
#[derive(Clone)]
pub struct SharedEmbedder {
    inner: Arc<Inner>,
}

impl SharedEmbedder {
    /// Wrap an already constructed adapter.
    pub fn new(adapter: Arc<dyn EmbeddingAdapter>, dimensions: usize, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                adapter: OnceCell::new_with(Some(adapter)),
                model: None,
                load: Mutex::new(LoadState::Idle),
                dimensions,
                timeout,
            }),
        }
    }

    /// Load the local ONNX model on first use, downloading it if needed.
    pub fn lazy_onnx(model: ModelManager, config: &MemoryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                adapter: OnceCell::new(),
                model: Some(Arc::new(model)),
                load: Mutex::new(LoadState::Idle),
                dimensions: config.embedding_dimensions,
                timeout: Duration::from_secs(config.embedding_timeout_secs),
            }),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    /// The adapter, waiting at most the configured timeout for a first-use
    /// load.
    ///
    /// The load runs as a background task, so a caller that times out does
    /// not cancel it and later callers pick up the same load. A failed load
    /// is reported without retrying for a minute.
    pub async fn adapter(&self) -> Result<Arc<dyn EmbeddingAdapter>, MemoirError> {
        if let Some(adapter) = self.inner.adapter.get() {
            return Ok(adapter.clone());
        }
        tokio::time::timeout(self.inner.timeout, self.wait_for_load())
            .await
            .map_err(|_| MemoirError::Timeout {
                duration: self.inner.timeout,
            })?
    }

    /// Wait for the adapter with no time limit.
    ///
    /// For batch work such as indexing, where a first-run model download
    /// should finish rather than time out.
    pub async fn preload(&self) -> Result<Arc<dyn EmbeddingAdapter>, MemoirError> {
        if let Some(adapter) = self.inner.adapter.get() {
            return Ok(adapter.clone());
        }
        self.wait_for_load().await
    }

    async fn wait_for_load(&self) -> LoadResult {
        let mut state = self.inner.load.lock().await;
        if let Some(adapter) = self.inner.adapter.get() {
            return Ok(adapter.clone());
        }

        if let LoadState::Failed { at, reason } = &*state
            && at.elapsed() < LOAD_RETRY_AFTER
        {
            return Err(MemoirError::embedding(format!(
                "embedding model unavailable: {reason}"
            )));
        }
        if !matches!(*state, LoadState::Running(_)) {
            *state = LoadState::Running(self.spawn_load()?);
        }

        let LoadState::Running(handle) = &mut *state else {
            return Err(MemoirError::Internal("embedder load not started".to_string()));
        };
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(MemoirError::Internal(format!("embedder load task failed: {e}"))),
        };

        match result {
            Ok(adapter) => {
                *state = LoadState::Idle;
                let _ = self.inner.adapter.set(adapter.clone());
                Ok(adapter)
            }
            Err(e) => {
                warn!(error = %e, "embedding model load failed");
                *state = LoadState::Failed {
                    at: Instant::now(),
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn spawn_load(&self) -> Result<JoinHandle<LoadResult>, MemoirError> {
        let model = self
            .inner
            .model
            .clone()
            .ok_or_else(|| MemoirError::embedding("no embedding adapter configured"))?;

        Ok(tokio::spawn(async move {
            let model_path = model.ensure_model().await?;
            let embedder = tokio::task::spawn_blocking(move || OnnxEmbedder::new(&model_path))
                .await
                .map_err(|e| MemoirError::Internal(format!("embedder load task failed: {e}")))??;

            info!("embedding model loaded");
            Ok(Arc::new(embedder) as Arc<dyn EmbeddingAdapter>)
        }))
    }

    /// Embed one text under the configured timeout.
    ///
    /// A response without exactly one vector of the configured dimension
    /// is an [`MemoirError::Embedding`] failure.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MemoirError> {
        let input = EmbeddingInput {
            texts: vec![text.to_string()],
        };

        // One deadline covers a first-use model load and the provider call.
        let output = tokio::time::timeout(self.inner.timeout, async {
            let adapter = self.preload().await?;
            adapter.embed(input).await
        })
        .await
        .map_err(|_| MemoirError::Timeout {
            duration: self.inner.timeout,
        })??;

        let mut embeddings = output.embeddings.into_iter();
        let vector = match (embeddings.next(), embeddings.next()) {
            (Some(v), None) => v,
            _ => return Err(MemoirError::embedding("expected exactly one embedding")),
        };

        if vector.len() != self.inner.dimensions {
            return Err(MemoirError::embedding(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.inner.dimensions
            )));
        }

        debug!(chars = text.chars().count(), "text embedded");
        Ok(vector)
    }
}

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local ONNX sentence embedder (all-MiniLM-L6-v2, 384 dimensions).
//!
//! Runs on CPU with a single intra-op thread. Token embeddings are mean
//! pooled under the attention mask and L2 normalized.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use tracing::debug;

use memoir_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MemoirError,
    PluginAdapter,
};

/// Output dimension of all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

fn onnx_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> MemoirError {
    move |e| MemoirError::embedding(format!("{context}: {e}"))
}

/// ONNX Runtime embedder.
///
/// Expects `model.onnx` and `tokenizer.json` side by side.
pub struct OnnxEmbedder {
    /// Session runs need `&mut`, so inference is serialized.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// SAFETY: the session is only reached through the Mutex and the tokenizer
// is only used for `&self` encoding.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, MemoirError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| MemoirError::embedding("model path has no parent directory"))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MemoirError::embedding(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(onnx_err("failed to create ONNX session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_err("failed to set optimization level"))?
            .with_intra_threads(1)
            .map_err(onnx_err("failed to set thread count"))?
            .commit_from_file(model_path)
            .map_err(|e| {
                MemoirError::embedding(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        debug!(model = %model_path.display(), "ONNX embedder loaded");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed one text into a unit-length vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MemoirError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(onnx_err("tokenization failed"))?;

        let widen = |ids: &[u32]| ids.iter().map(|&v| i64::from(v)).collect::<Vec<i64>>();
        let input_ids = widen(encoding.get_ids());
        let attention_mask = widen(encoding.get_attention_mask());
        let token_type_ids = widen(encoding.get_type_ids());
        let seq_len = input_ids.len();

        let input_ids = Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(onnx_err("bad input_ids shape"))?;
        let mask = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(onnx_err("bad attention_mask shape"))?;
        let token_types = Array2::from_shape_vec((1, seq_len), token_type_ids)
            .map_err(onnx_err("bad token_type_ids shape"))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MemoirError::embedding(format!("ONNX session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => TensorRef::from_array_view(&input_ids).map_err(onnx_err("input_ids tensor"))?,
                "attention_mask" => TensorRef::from_array_view(&mask).map_err(onnx_err("attention_mask tensor"))?,
                "token_type_ids" => TensorRef::from_array_view(&token_types).map_err(onnx_err("token_type_ids tensor"))?
            ])
            .map_err(onnx_err("ONNX inference failed"))?;

        // [1, seq_len, hidden]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err("failed to extract output tensor"))?;
        let hidden = shape
            .last()
            .copied()
            .and_then(|d| usize::try_from(d).ok())
            .ok_or_else(|| MemoirError::embedding("output tensor has no hidden dimension"))?;

        Ok(l2_normalize(&masked_mean_pool(
            data,
            &attention_mask,
            seq_len,
            hidden,
        )))
    }
}

/// Average the token vectors whose mask is set.
fn masked_mean_pool(tokens: &[f32], mask: &[i64], seq_len: usize, hidden: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden];
    let mut kept = 0usize;

    for (row, &m) in tokens.chunks_exact(hidden).take(seq_len).zip(mask) {
        if m > 0 {
            for (acc, v) in sum.iter_mut().zip(row) {
                *acc += v;
            }
            kept += 1;
        }
    }

    if kept > 0 {
        let n = kept as f32;
        sum.iter_mut().for_each(|v| *v /= n);
    }
    sum
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemoirError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("session lock poisoned: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), MemoirError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemoirError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_to_unit_length() {
        let n = l2_normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn pooling_ignores_masked_tokens() {
        let tokens = [
            9.0, 9.0, 9.0, // padding
            1.0, 2.0, 3.0,
        ];
        assert_eq!(masked_mean_pool(&tokens, &[0, 1], 2, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn pooling_averages_kept_tokens() {
        let tokens = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let pooled = masked_mean_pool(&tokens, &[1, 1, 1], 3, 2);
        assert_eq!(pooled, vec![3.0, 4.0]);
    }

    #[test]
    fn missing_model_is_embedding_error() {
        let err = OnnxEmbedder::new(Path::new("/nonexistent/memoir/model.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, MemoirError::Embedding { .. }));
    }
}

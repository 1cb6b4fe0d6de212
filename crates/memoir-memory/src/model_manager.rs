// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the embedding model into the data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use memoir_core::MemoirError;
use tokio::sync::OnceCell;
use tracing::info;

const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Resolves model file locations under `<data_dir>/models/<model_name>` and
/// fetches missing files once per process.
pub struct ModelManager {
    data_dir: PathBuf,
    model_name: String,
    model_url: String,
    tokenizer_url: String,
    ready: OnceCell<PathBuf>,
}

impl ModelManager {
    pub fn new(data_dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_name: model_name.into(),
            model_url: MODEL_URL.to_string(),
            tokenizer_url: TOKENIZER_URL.to_string(),
            ready: OnceCell::new(),
        }
    }

    /// Fetch the model and tokenizer from other locations, e.g. a mirror.
    pub fn with_urls(mut self, model_url: impl Into<String>, tokenizer_url: impl Into<String>) -> Self {
        self.model_url = model_url.into();
        self.tokenizer_url = tokenizer_url.into();
        self
    }

    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join(&self.model_name)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Return the model path, downloading missing files first.
    ///
    /// Concurrent callers share a single download.
    pub async fn ensure_model(&self) -> Result<PathBuf, MemoirError> {
        self.ready
            .get_or_try_init(|| self.fetch_missing())
            .await
            .cloned()
    }

    async fn fetch_missing(&self) -> Result<PathBuf, MemoirError> {
        if self.is_model_available() {
            return Ok(self.model_path());
        }

        let model_dir = self.model_dir();
        info!(model = %self.model_name, dir = %model_dir.display(), "embedding model not found, downloading");
        tokio::fs::create_dir_all(&model_dir).await.map_err(|e| {
            MemoirError::embedding(format!("failed to create {}: {e}", model_dir.display()))
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| MemoirError::Embedding {
                message: "failed to build download client".to_string(),
                source: Some(Box::new(e)),
            })?;

        for (filename, url) in [
            ("model.onnx", self.model_url.as_str()),
            ("tokenizer.json", self.tokenizer_url.as_str()),
        ] {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }
            match download_file(&client, url, &dest).await {
                Ok(size) => info!(file = filename, size, "downloaded"),
                Err(e) => {
                    // Partial files would be mistaken for a complete model next run.
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        }

        info!(dir = %model_dir.display(), "embedding model ready");
        Ok(self.model_path())
    }
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<usize, MemoirError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MemoirError::Embedding {
            message: format!("failed to download {url}"),
            source: Some(Box::new(e)),
        })?;

    if !response.status().is_success() {
        return Err(MemoirError::embedding(format!(
            "download of {url} failed with status {}",
            response.status()
        )));
    }

    let bytes = response.bytes().await.map_err(|e| MemoirError::Embedding {
        message: format!("failed to read body of {url}"),
        source: Some(Box::new(e)),
    })?;

    tokio::fs::write(dest, &bytes).await.map_err(|e| {
        MemoirError::embedding(format!("failed to write {}: {e}", dest.display()))
    })?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn paths_live_under_data_dir() {
        let mgr = ModelManager::new("/data/memoir", "all-MiniLM-L6-v2");
        assert_eq!(
            mgr.model_path(),
            PathBuf::from("/data/memoir/models/all-MiniLM-L6-v2/model.onnx")
        );
        assert_eq!(
            mgr.tokenizer_path(),
            PathBuf::from("/data/memoir/models/all-MiniLM-L6-v2/tokenizer.json")
        );
    }

    #[test]
    fn model_not_available_when_missing() {
        let mgr = ModelManager::new("/nonexistent/path", "all-MiniLM-L6-v2");
        assert!(!mgr.is_model_available());
    }

    #[tokio::test]
    async fn failed_download_leaves_no_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mgr = ModelManager::new(dir.path(), "tiny").with_urls(
            format!("{}/model.onnx", server.uri()),
            format!("{}/tokenizer.json", server.uri()),
        );
        let err = mgr.ensure_model().await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(!mgr.model_path().exists());
    }

    #[tokio::test]
    async fn present_files_skip_download() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ModelManager::new(dir.path(), "tiny");
        std::fs::create_dir_all(mgr.model_dir()).unwrap();
        std::fs::write(mgr.model_path(), b"onnx").unwrap();
        std::fs::write(mgr.tokenizer_path(), b"{}").unwrap();

        assert_eq!(mgr.ensure_model().await.unwrap(), mgr.model_path());
    }
}

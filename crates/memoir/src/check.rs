// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memoir check` command implementation.
//!
//! Runs quick diagnostics against the configured environment: database,
//! nearest-neighbor support, vault key derivation and the embedding model.

use std::time::{Duration, Instant};

use memoir_config::model::MemoirConfig;
use memoir_core::{BodyCipher, HealthStatus, PluginAdapter};
use memoir_storage::SqliteJournalStore;
use memoir_vault::AesBodyCipher;

use crate::journal::model_manager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print one line per result.
///
/// Returns the results; the caller decides the exit code.
pub async fn run_check(config: &MemoirConfig) -> Vec<CheckResult> {
    let results = vec![
        check_database(config).await,
        check_vault(config),
        check_model(config),
    ];

    println!();
    println!("  memoir check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        println!(
            "    {tag} {:<16} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }
    println!();

    results
}

pub fn has_failures(results: &[CheckResult]) -> bool {
    results.iter().any(|r| r.status == CheckStatus::Fail)
}

async fn check_database(config: &MemoirConfig) -> CheckResult {
    let start = Instant::now();
    let store =
        match SqliteJournalStore::open(&config.storage, config.memory.embedding_dimensions).await {
            Ok(store) => store,
            Err(e) => return CheckResult::new("database", CheckStatus::Fail, e.to_string(), start),
        };

    let result = match store.health_check().await {
        Ok(HealthStatus::Healthy) => CheckResult::new(
            "database",
            CheckStatus::Pass,
            format!("{} (vector search on)", config.storage.database_path),
            start,
        ),
        Ok(HealthStatus::Degraded(reason)) => {
            CheckResult::new("database", CheckStatus::Warn, reason, start)
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            CheckResult::new("database", CheckStatus::Fail, reason, start)
        }
        Err(e) => CheckResult::new("database", CheckStatus::Fail, e.to_string(), start),
    };

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "failed to close database after check");
    }
    result
}

fn check_vault(config: &MemoirConfig) -> CheckResult {
    let start = Instant::now();
    let cipher = match AesBodyCipher::from_config(&config.vault) {
        Ok(cipher) => cipher,
        Err(e) => return CheckResult::new("vault", CheckStatus::Fail, e.to_string(), start),
    };

    match cipher
        .encrypt("memoir check")
        .and_then(|sealed| cipher.decrypt(&sealed))
    {
        Ok(plain) if plain == "memoir check" => {
            CheckResult::new("vault", CheckStatus::Pass, "body key derived", start)
        }
        Ok(_) => CheckResult::new("vault", CheckStatus::Fail, "round trip mismatch", start),
        Err(e) => CheckResult::new("vault", CheckStatus::Fail, e.to_string(), start),
    }
}

fn check_model(config: &MemoirConfig) -> CheckResult {
    let start = Instant::now();
    let manager = model_manager(config);
    if manager.is_model_available() {
        CheckResult::new(
            "embedding model",
            CheckStatus::Pass,
            manager.model_dir().display().to_string(),
            start,
        )
    } else {
        CheckResult::new(
            "embedding model",
            CheckStatus::Warn,
            format!(
                "{} not downloaded yet, fetched on first use",
                config.memory.model_name
            ),
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> MemoirConfig {
        let mut config = MemoirConfig::default();
        config.storage.database_path = dir.join("journal.db").to_string_lossy().into_owned();
        config.agent.data_dir = dir.to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn fresh_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_database(&config_in(dir.path())).await;
        assert_ne!(result.status, CheckStatus::Fail);
    }

    #[test]
    fn missing_salt_fails_vault_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.vault.salt_hex = None;
        let result = check_vault(&config);
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("salt_hex"));
    }

    #[test]
    fn absent_model_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_model(&config_in(dir.path()));
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(!has_failures(&[result]));
    }
}

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! non-empty paths, positive caps, non-negative weights, KDF minimums.

use crate::diagnostic::ConfigError;
use crate::model::MemoirConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing fast.
pub fn validate_config(config: &MemoirConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.agent.log_level
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    validate_vault(config, &mut errors);

    if config.memory.embedding_dimensions == 0 {
        errors.push(ConfigError::validation(
            "memory.embedding_dimensions must be greater than 0",
        ));
    }
    if config.memory.embedding_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "memory.embedding_timeout_secs must be greater than 0",
        ));
    }

    let retrieval = &config.retrieval;
    for (name, value) in [
        ("similarity_weight", retrieval.similarity_weight),
        ("recency_weight", retrieval.recency_weight),
        ("seasonality_bonus", retrieval.seasonality_bonus),
        ("keyword_base_bonus", retrieval.keyword_base_bonus),
        ("keyword_per_match_bonus", retrieval.keyword_per_match_bonus),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::validation(format!(
                "retrieval.{name} must be a non-negative number, got {value}"
            )));
        }
    }
    if !(retrieval.recency_horizon_days > 0.0) {
        errors.push(ConfigError::validation(format!(
            "retrieval.recency_horizon_days must be positive, got {}",
            retrieval.recency_horizon_days
        )));
    }
    if retrieval.default_limit == 0 {
        errors.push(ConfigError::validation(
            "retrieval.default_limit must be greater than 0",
        ));
    }

    if config.summary.char_budget == 0 {
        errors.push(ConfigError::validation(
            "summary.char_budget must be greater than 0",
        ));
    }
    if config.summary.summarize_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "summary.summarize_timeout_secs must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_vault(config: &MemoirConfig, errors: &mut Vec<ConfigError>) {
    let vault = &config.vault;

    if vault.kdf_memory_cost < 32768 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            vault.kdf_memory_cost
        )));
    }
    if vault.kdf_iterations < 2 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            vault.kdf_iterations
        )));
    }
    if vault.kdf_parallelism == 0 {
        errors.push(ConfigError::validation(
            "vault.kdf_parallelism must be at least 1",
        ));
    }

    if let Some(salt) = &vault.salt_hex {
        let well_formed = salt.len() == 32 && salt.chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            errors.push(ConfigError::validation(
                "vault.salt_hex must be 32 hexadecimal characters (16 bytes)",
            ));
        }
    }

    if vault.passphrase_env.trim().is_empty() {
        errors.push(ConfigError::validation(
            "vault.passphrase_env must name an environment variable",
        ));
    }
}

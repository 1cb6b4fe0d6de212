// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memoir.toml` > `~/.config/memoir/memoir.toml` > `/etc/memoir/memoir.toml`
//! with environment variable overrides via `MEMOIR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MemoirConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &["agent", "storage", "vault", "memory", "retrieval", "summary"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memoir/memoir.toml` (system-wide)
/// 3. `~/.config/memoir/memoir.toml` (user XDG config)
/// 4. `./memoir.toml` (local directory)
/// 5. `MEMOIR_*` environment variables
pub fn load_config() -> Result<MemoirConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MemoirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemoirConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemoirConfig::default()))
        .merge(Toml::file("/etc/memoir/memoir.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("memoir/memoir.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("memoir.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MEMOIR_RETRIEVAL_KEYWORD_COUNT` must map to
/// `retrieval.keyword_count`, not `retrieval.keyword.count`.
fn env_provider() -> Env {
    Env::prefixed("MEMOIR_")
        .ignore(&["passphrase"])
        .map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("retrieval_keyword_count"), "retrieval.keyword_count");
        assert_eq!(map_env_key("storage_vector_search"), "storage.vector_search");
        assert_eq!(map_env_key("summary_char_budget"), "summary.char_budget");
        assert_eq!(map_env_key("agent_log_level"), "agent.log_level");
    }

    #[test]
    fn unknown_env_section_is_left_alone() {
        assert_eq!(map_env_key("somethingelse"), "somethingelse");
    }

    #[test]
    fn env_override_applies_to_nested_key() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("MEMOIR_RETRIEVAL_KEYWORD_COUNT", "4");
            jail.set_env("MEMOIR_STORAGE_VECTOR_SEARCH", "false");
            jail.set_env("MEMOIR_PASSPHRASE", "never-a-config-key");
            let config = load_config()?;
            assert_eq!(config.retrieval.keyword_count, 4);
            assert!(!config.storage.vector_search);
            Ok(())
        });
    }
}

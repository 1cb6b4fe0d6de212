// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Memoir.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use memoir_core::PeriodType;
use serde::{Deserialize, Serialize};

/// Top-level Memoir configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoirConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Body encryption settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Embedding and indexing settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Hybrid retrieval weights and caps.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Period summarization and context assembly settings.
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for downloaded models and other local state.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("memoir"))
        .unwrap_or_else(|| std::path::PathBuf::from(".memoir"))
        .to_string_lossy()
        .into_owned()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Allow nearest-neighbor queries through sqlite-vec.
    /// When false, retrieval always runs in degraded mode.
    #[serde(default = "default_vector_search")]
    pub vector_search: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            vector_search: default_vector_search(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("memoir").join("memoir.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("memoir.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_vector_search() -> bool {
    true
}

/// Body encryption configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Environment variable holding the journal passphrase.
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,

    /// Hex-encoded 16-byte Argon2id salt. Required to derive the body key.
    #[serde(default)]
    pub salt_hex: Option<String>,

    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            passphrase_env: default_passphrase_env(),
            salt_hex: None,
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_passphrase_env() -> String {
    "MEMOIR_PASSPHRASE".to_string()
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Embedding and indexing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Local embedding model name (determines the download directory).
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Fixed embedding dimension for every stored vector.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Timeout applied to each embedding call.
    #[serde(default = "default_embedding_timeout_secs")]
    pub embedding_timeout_secs: u64,

    /// Keywords stored in an entry's derived index by the indexer.
    #[serde(default = "default_index_keyword_count")]
    pub index_keyword_count: usize,

    /// Bodies shorter than this many characters get no derived keywords.
    #[serde(default = "default_index_min_chars")]
    pub index_min_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            embedding_dimensions: default_embedding_dimensions(),
            embedding_timeout_secs: default_embedding_timeout_secs(),
            index_keyword_count: default_index_keyword_count(),
            index_min_chars: default_index_min_chars(),
        }
    }
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_embedding_timeout_secs() -> u64 {
    10
}

fn default_index_keyword_count() -> usize {
    5
}

fn default_index_min_chars() -> usize {
    10
}

/// Hybrid retrieval weights and candidate caps.
///
/// Defaults reproduce the production ranking. Changing them is a
/// product decision.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Keywords extracted from the query.
    #[serde(default = "default_keyword_count")]
    pub keyword_count: usize,

    /// Nearest-neighbor candidates fetched in vector mode.
    #[serde(default = "default_vector_candidates")]
    pub vector_candidates: usize,

    /// Extra keyword-only candidates fetched in vector mode.
    #[serde(default = "default_keyword_candidates")]
    pub keyword_candidates: usize,

    /// Weight of `1 / (1 + distance)`.
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,

    /// Weight of `1 / (1 + days / horizon)`.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// Days over which recency decays to one half.
    #[serde(default = "default_recency_horizon_days")]
    pub recency_horizon_days: f64,

    /// Flat bonus when an entry's creation month matches the current month.
    #[serde(default = "default_seasonality_bonus")]
    pub seasonality_bonus: f64,

    /// Bonus for the first matching keyword.
    #[serde(default = "default_keyword_base_bonus")]
    pub keyword_base_bonus: f64,

    /// Additional bonus per distinct matching keyword.
    #[serde(default = "default_keyword_per_match_bonus")]
    pub keyword_per_match_bonus: f64,

    /// Result count when the caller does not specify one.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            keyword_count: default_keyword_count(),
            vector_candidates: default_vector_candidates(),
            keyword_candidates: default_keyword_candidates(),
            similarity_weight: default_similarity_weight(),
            recency_weight: default_recency_weight(),
            recency_horizon_days: default_recency_horizon_days(),
            seasonality_bonus: default_seasonality_bonus(),
            keyword_base_bonus: default_keyword_base_bonus(),
            keyword_per_match_bonus: default_keyword_per_match_bonus(),
            default_limit: default_limit(),
        }
    }
}

fn default_keyword_count() -> usize {
    3
}

fn default_vector_candidates() -> usize {
    30
}

fn default_keyword_candidates() -> usize {
    10
}

fn default_similarity_weight() -> f64 {
    0.6
}

fn default_recency_weight() -> f64 {
    0.2
}

fn default_recency_horizon_days() -> f64 {
    365.0
}

fn default_seasonality_bonus() -> f64 {
    0.15
}

fn default_keyword_base_bonus() -> f64 {
    0.2
}

fn default_keyword_per_match_bonus() -> f64 {
    0.05
}

fn default_limit() -> usize {
    5
}

/// Period summarization and context assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Maximum characters of the document handed to the summarizer.
    #[serde(default = "default_char_budget")]
    pub char_budget: usize,

    /// Timeout applied to each summarizer call.
    #[serde(default = "default_summarize_timeout_secs")]
    pub summarize_timeout_secs: u64,

    /// Period types the scheduler produces.
    #[serde(default = "default_periods")]
    pub periods: Vec<PeriodType>,

    /// Summaries included in an assembled context.
    #[serde(default = "default_context_summaries")]
    pub context_summaries: usize,

    /// Entries included in an assembled context.
    #[serde(default = "default_context_entries")]
    pub context_entries: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            char_budget: default_char_budget(),
            summarize_timeout_secs: default_summarize_timeout_secs(),
            periods: default_periods(),
            context_summaries: default_context_summaries(),
            context_entries: default_context_entries(),
        }
    }
}

fn default_char_budget() -> usize {
    15_000
}

fn default_summarize_timeout_secs() -> u64 {
    60
}

fn default_periods() -> Vec<PeriodType> {
    vec![PeriodType::Weekly, PeriodType::Monthly]
}

fn default_context_summaries() -> usize {
    2
}

fn default_context_entries() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_defaults_match_production_ranking() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.keyword_count, 3);
        assert_eq!(cfg.vector_candidates + cfg.keyword_candidates, 40);
        assert!((cfg.similarity_weight - 0.6).abs() < f64::EPSILON);
        assert!((cfg.recency_weight - 0.2).abs() < f64::EPSILON);
        assert!((cfg.seasonality_bonus - 0.15).abs() < f64::EPSILON);
        assert!((cfg.keyword_base_bonus - 0.2).abs() < f64::EPSILON);
        assert!((cfg.keyword_per_match_bonus - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_defaults() {
        let cfg = SummaryConfig::default();
        assert_eq!(cfg.char_budget, 15_000);
        assert_eq!(cfg.context_summaries, 2);
        assert_eq!(cfg.context_entries, 5);
        assert_eq!(cfg.periods, vec![PeriodType::Weekly, PeriodType::Monthly]);
    }

    #[test]
    fn database_path_defaults_under_memoir_dir() {
        let cfg = StorageConfig::default();
        assert!(cfg.database_path.ends_with("memoir.db"));
        assert!(cfg.vector_search);
    }
}

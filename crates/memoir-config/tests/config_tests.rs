// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Memoir configuration system.

use std::io::Write;

use memoir_config::diagnostic::ConfigError;
use memoir_config::model::MemoirConfig;
use memoir_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use memoir_core::PeriodType;

/// Valid TOML with all sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_memoir_config() {
    let toml = r#"
[agent]
log_level = "debug"

[storage]
database_path = "/tmp/journal.db"
wal_mode = false
vector_search = false

[vault]
salt_hex = "00112233445566778899aabbccddeeff"
kdf_iterations = 4

[memory]
embedding_dimensions = 8
index_keyword_count = 7

[retrieval]
keyword_count = 2
vector_candidates = 20
similarity_weight = 0.5

[summary]
char_budget = 500
periods = ["MONTHLY"]
context_entries = 3
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/journal.db");
    assert!(!config.storage.wal_mode);
    assert!(!config.storage.vector_search);
    assert_eq!(
        config.vault.salt_hex.as_deref(),
        Some("00112233445566778899aabbccddeeff")
    );
    assert_eq!(config.vault.kdf_iterations, 4);
    assert_eq!(config.memory.embedding_dimensions, 8);
    assert_eq!(config.memory.index_keyword_count, 7);
    assert_eq!(config.retrieval.keyword_count, 2);
    assert_eq!(config.retrieval.vector_candidates, 20);
    assert!((config.retrieval.similarity_weight - 0.5).abs() < f64::EPSILON);
    // Unset keys keep their defaults.
    assert_eq!(config.retrieval.keyword_candidates, 10);
    assert_eq!(config.summary.char_budget, 500);
    assert_eq!(config.summary.periods, vec![PeriodType::Monthly]);
    assert_eq!(config.summary.context_entries, 3);
    assert_eq!(config.summary.context_summaries, 2);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults should be valid");
    let defaults = MemoirConfig::default();
    assert_eq!(config.retrieval.keyword_count, defaults.retrieval.keyword_count);
    assert_eq!(config.summary.char_budget, 15_000);
    assert_eq!(config.memory.embedding_dimensions, 384);
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[retrieval]
keywrod_count = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "keywrod_count");
            assert_eq!(suggestion.as_deref(), Some("keyword_count"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn invalid_period_type_is_rejected() {
    let toml = r#"
[summary]
periods = ["DAILY"]
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[retrieval]
vector_candidates = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_runs_after_parse() {
    let toml = r#"
[retrieval]
recency_weight = -0.2
"#;
    let errors = load_and_validate_str(toml).expect_err("negative weight is invalid");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memoir.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[summary]\ncontext_summaries = 1").unwrap();

    let config = load_and_validate_path(&path).expect("file config should load");
    assert_eq!(config.summary.context_summaries, 1);
}

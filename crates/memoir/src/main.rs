// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memoir - an encrypted journal with hybrid retrieval and period summaries.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod add;
mod check;
mod context;
mod index;
mod journal;

use clap::{Parser, Subcommand};
use memoir_core::MemoirError;

use crate::journal::Journal;

/// Memoir - an encrypted journal with hybrid retrieval and period summaries.
#[derive(Parser, Debug)]
#[command(name = "memoir", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a journal entry. The body is read from stdin unless --body is given.
    Add {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        mood: Option<String>,
        /// Entry date as YYYY-MM-DD (defaults to now).
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Leave the entry queued instead of indexing it now.
        #[arg(long)]
        no_index: bool,
    },
    /// Process queued entry indexing work.
    Index,
    /// Print the retrieval context for a query.
    Context {
        #[arg(long)]
        owner: String,
        /// Emit the structured payload as JSON.
        #[arg(long)]
        json: bool,
        query: String,
    },
    /// Run diagnostic checks against the configured environment.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match memoir_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            memoir_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Commands::Check = cli.command {
        let results = check::run_check(&config).await;
        if check::has_failures(&results) {
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Commands,
    config: memoir_config::MemoirConfig,
) -> Result<(), MemoirError> {
    let journal = Journal::open(config).await?;

    match command {
        Commands::Add {
            owner,
            title,
            mood,
            date,
            body,
            no_index,
        } => {
            add::run_add(
                &journal,
                add::AddArgs {
                    owner,
                    title,
                    mood,
                    date,
                    body,
                    no_index,
                },
            )
            .await?;
        }
        Commands::Index => {
            index::run_index(&journal).await?;
        }
        Commands::Context { owner, json, query } => {
            context::run_context(&journal, &owner, &query, json).await?;
        }
        Commands::Check => {}
    }
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memoir={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use memoir_memory::{NO_RELEVANT_CONTEXT, SharedEmbedder};
    use memoir_storage::SqliteJournalStore;
    use memoir_test_utils::HashEmbedder;
    use memoir_vault::AesBodyCipher;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    #[serial_test::serial]
    fn binary_loads_config_defaults() {
        let config = memoir_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.memory.embedding_dimensions, 384);
    }

    #[test]
    fn cli_parses_context_query() {
        let cli = Cli::try_parse_from(["memoir", "context", "--owner", "alice", "how was march"])
            .unwrap();
        match cli.command {
            Commands::Context { owner, json, query } => {
                assert_eq!(owner, "alice");
                assert!(!json);
                assert_eq!(query, "how was march");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_owner_for_add() {
        assert!(Cli::try_parse_from(["memoir", "add", "--title", "t"]).is_err());
    }

    async fn test_journal(dir: &std::path::Path) -> Journal {
        let mut config = memoir_config::MemoirConfig::default();
        config.storage.database_path = dir.join("journal.db").to_string_lossy().into_owned();
        config.memory.embedding_dimensions = 8;
        let store = SqliteJournalStore::open(&config.storage, 8).await.unwrap();
        let embedder = SharedEmbedder::new(
            Arc::new(HashEmbedder::new(8)),
            8,
            Duration::from_secs(1),
        );
        Journal::from_parts(
            store,
            Arc::new(AesBodyCipher::ephemeral().unwrap()),
            embedder,
            config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn add_then_context_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let journal = test_journal(dir.path()).await;

        let empty = context::run_context(&journal, "alice", "garden", false)
            .await
            .unwrap();
        assert_eq!(empty, NO_RELEVANT_CONTEXT);

        add::run_add(
            &journal,
            add::AddArgs {
                owner: "alice".to_string(),
                title: "Garden".to_string(),
                mood: Some("calm".to_string()),
                date: Some("2026-04-12".to_string()),
                body: Some("Planted tomatoes in the garden.".to_string()),
                no_index: false,
            },
        )
        .await
        .unwrap();

        let rendered = context::run_context(&journal, "alice", "garden", false)
            .await
            .unwrap();
        assert!(rendered.contains("[2026-04-12] Garden: Planted tomatoes in the garden. (Mood: calm)"));

        let json = context::run_context(&journal, "alice", "garden", true)
            .await
            .unwrap();
        assert!(json.contains("\"status\": \"sections\""));
    }

    #[tokio::test]
    async fn add_without_indexing_leaves_work_queued() {
        let dir = tempfile::tempdir().unwrap();
        let journal = test_journal(dir.path()).await;

        add::run_add(
            &journal,
            add::AddArgs {
                owner: "alice".to_string(),
                title: "Later".to_string(),
                mood: None,
                date: None,
                body: Some("Index me later please.".to_string()),
                no_index: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(journal.indexer().pending_count().await.unwrap(), 1);

        let report = index::run_index(&journal).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(journal.indexer().pending_count().await.unwrap(), 0);
    }
}

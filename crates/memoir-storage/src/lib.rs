// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for Memoir.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, L2 nearest-neighbor search through
//! the statically linked sqlite-vec extension, and a durable work queue for
//! entry re-indexing.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteJournalStore;
pub use database::Database;
pub use models::*;

// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::sync::Once;

use memoir_config::model::StorageConfig;
use memoir_core::MemoirError;
use rusqlite::functions::FunctionFlags;
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::migrations::run_migrations;

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec as an auto-extension so every new connection gets
/// `vec_distance_l2` and friends. Statically linked, no extension loading.
fn register_sqlite_vec() {
    VEC_EXTENSION.call_once(|| {
        // SAFETY: `sqlite3_vec_init` is the extension entry point exported by
        // the statically linked sqlite-vec crate.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )));
        }
        debug!("sqlite-vec auto-extension registered");
    });
}

/// Register `fold_case(text)`, a Unicode-aware `lower()`. SQLite's built-in
/// `lower()` only folds ASCII. NULL stays NULL.
fn register_fold_case(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// Convert a tokio-rusqlite error into [`MemoirError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MemoirError {
    MemoirError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the journal database.
///
/// Cheap to clone: clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    vector_search: bool,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode and vector
    /// search enabled when available, running pending migrations.
    pub async fn open(path: &str) -> Result<Self, MemoirError> {
        Self::open_with(path, true, true).await
    }

    /// Open the database described by a [`StorageConfig`].
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, MemoirError> {
        Self::open_with(&config.database_path, config.wal_mode, config.vector_search).await
    }

    async fn open_with(path: &str, wal_mode: bool, vector_search: bool) -> Result<Self, MemoirError> {
        register_sqlite_vec();

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MemoirError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| MemoirError::Storage {
                source: Box::new(e),
            })?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update_and_check(None, "journal_mode", journal_mode, |row| {
                row.get::<_, String>(0)
            })?;
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            register_fold_case(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<Result<(), MemoirError>, rusqlite::Error> {
            Ok(run_migrations(conn))
        })
        .await
        .map_err(map_tr_err)??;

        let vec_version = conn
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("SELECT vec_version()", [], |row| row.get(0))
            })
            .await;

        let vector_search = match (vector_search, vec_version) {
            (false, _) => {
                info!("vector search disabled by configuration");
                false
            }
            (true, Ok(version)) => {
                debug!(%version, "sqlite-vec available");
                true
            }
            (true, Err(e)) => {
                warn!(error = %e, "sqlite-vec unavailable, retrieval will run in degraded mode");
                false
            }
        };

        info!(path, vector_search, "database opened");
        Ok(Self {
            conn,
            vector_search,
        })
    }

    /// The shared async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether nearest-neighbor queries can run on this database.
    pub fn supports_vector_search(&self) -> bool {
        self.vector_search
    }

    /// Checkpoint the WAL and close the background connection.
    ///
    /// Other clones of this handle stop working afterwards.
    pub async fn close(self) -> Result<(), MemoirError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");

        self.conn.close().await.map_err(|e| MemoirError::Storage {
            source: e.to_string().into(),
        })
    }
}

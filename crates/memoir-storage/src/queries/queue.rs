// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable work queue with at-least-once delivery.
//!
//! A dequeued item is leased for five minutes. Items whose lease expired
//! without an ack or fail are handed out again.

use memoir_core::MemoirError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::models::QueueEntry;

/// Enqueue an item unless an identical payload is already pending.
///
/// Returns the id of the new row, or `None` when deduplicated.
pub async fn enqueue_unique(
    db: &Database,
    queue_name: &str,
    payload: &str,
) -> Result<Option<i64>, MemoirError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let tx = conn.transaction()?;
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM queue
                     WHERE queue_name = ?1 AND payload = ?2 AND status = 'pending'
                     LIMIT 1",
                    params![queue_name, payload],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                tx.commit()?;
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO queue (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Some(id))
        })
        .await
        .map_err(map_tr_err)
}

/// Lease the oldest deliverable item from the named queue.
///
/// Deliverable means pending, or processing with an expired lease.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<QueueEntry>, MemoirError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let tx = conn.transaction()?;

            let entry = tx
                .query_row(
                    "SELECT id, queue_name, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM queue
                     WHERE queue_name = ?1
                       AND (status = 'pending'
                            OR (status = 'processing'
                                AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                     ORDER BY id ASC
                     LIMIT 1",
                    params![queue_name],
                    |row| {
                        Ok(QueueEntry {
                            id: row.get(0)?,
                            queue_name: row.get(1)?,
                            payload: row.get(2)?,
                            status: row.get(3)?,
                            attempts: row.get(4)?,
                            max_attempts: row.get(5)?,
                            created_at: row.get(6)?,
                            updated_at: row.get(7)?,
                            locked_until: row.get(8)?,
                        })
                    },
                )
                .optional()?;

            let Some(entry) = entry else {
                tx.commit()?;
                return Ok(None);
            };

            let locked_until: String = tx.query_row(
                "UPDATE queue SET status = 'processing',
                 locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1
                 RETURNING locked_until",
                params![entry.id],
                |row| row.get(0),
            )?;
            tx.commit()?;

            Ok(Some(QueueEntry {
                status: "processing".to_string(),
                locked_until: Some(locked_until),
                ..entry
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an item completed.
pub async fn ack(db: &Database, id: i64) -> Result<(), MemoirError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed attempt.
///
/// The item returns to pending until `max_attempts` is reached, after which
/// it is parked as failed. Returns true if the item will be retried.
pub async fn fail(db: &Database, id: i64) -> Result<bool, MemoirError> {
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let retry = new_attempts < max_attempts;
            conn.execute(
                "UPDATE queue SET status = ?1, attempts = ?2,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![if retry { "pending" } else { "failed" }, new_attempts, id],
            )?;
            Ok(retry)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of items waiting in the named queue.
pub async fn pending_count(db: &Database, queue_name: &str) -> Result<usize, MemoirError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM queue WHERE queue_name = ?1 AND status = 'pending'",
                params![queue_name],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
        .await
        .map_err(map_tr_err)
}

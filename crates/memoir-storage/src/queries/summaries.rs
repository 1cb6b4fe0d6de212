// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Period summary queries.

use std::str::FromStr;

use chrono::NaiveDate;
use memoir_core::{MemoirError, PeriodType, Summary};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{blob_to_vec, date_from_sql, date_to_sql, ts_from_sql, ts_to_sql, vec_to_blob};

const SUMMARY_COLUMNS: &str =
    "owner_id, period_type, start_date, end_date, summary_text, vector, created_at, updated_at";

fn row_to_summary(row: &Row) -> Result<Summary, rusqlite::Error> {
    let period: String = row.get(1)?;
    let start: String = row.get(2)?;
    let end: String = row.get(3)?;
    let vector: Option<Vec<u8>> = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(Summary {
        owner_id: row.get(0)?,
        period_type: PeriodType::from_str(&period)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?,
        start_date: date_from_sql(2, &start)?,
        end_date: date_from_sql(3, &end)?,
        summary_text: row.get(4)?,
        vector: vector.map(|blob| blob_to_vec(&blob)),
        created_at: ts_from_sql(6, &created_at)?,
        updated_at: ts_from_sql(7, &updated_at)?,
    })
}

/// Insert or overwrite the summary for `(owner_id, period_type, start_date)`.
///
/// On conflict the text, end date, vector and `updated_at` are replaced;
/// the original `created_at` is kept. Returns the stored row.
pub async fn upsert(db: &Database, summary: &Summary) -> Result<Summary, MemoirError> {
    let summary = summary.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "INSERT INTO summaries
                    (owner_id, period_type, start_date, end_date, summary_text, vector, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(owner_id, period_type, start_date) DO UPDATE SET
                    end_date = excluded.end_date,
                    summary_text = excluded.summary_text,
                    vector = excluded.vector,
                    updated_at = excluded.updated_at
                 RETURNING {SUMMARY_COLUMNS}"
            );
            conn.query_row(
                &sql,
                params![
                    summary.owner_id,
                    summary.period_type.as_str(),
                    date_to_sql(&summary.start_date),
                    date_to_sql(&summary.end_date),
                    summary.summary_text,
                    summary.vector.as_deref().map(vec_to_blob),
                    ts_to_sql(&summary.created_at),
                    ts_to_sql(&summary.updated_at),
                ],
                row_to_summary,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one summary by its natural key.
pub async fn get(
    db: &Database,
    owner_id: &str,
    period_type: PeriodType,
    start_date: NaiveDate,
) -> Result<Option<Summary>, MemoirError> {
    let owner_id = owner_id.to_string();
    let start = date_to_sql(&start_date);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "SELECT {SUMMARY_COLUMNS} FROM summaries
                 WHERE owner_id = ?1 AND period_type = ?2 AND start_date = ?3"
            );
            conn.query_row(&sql, params![owner_id, period_type.as_str(), start], row_to_summary)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// L2 nearest summaries. Rows without a vector, or with a vector of a
/// different dimension, are skipped.
pub async fn nearest(
    db: &Database,
    owner_id: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<(Summary, f64)>, MemoirError> {
    let owner_id = owner_id.to_string();
    let blob = vec_to_blob(query);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "SELECT {SUMMARY_COLUMNS}, vec_distance_l2(vector, ?2) AS distance
                 FROM summaries
                 WHERE owner_id = ?1 AND vector IS NOT NULL AND length(vector) = length(?2)
                 ORDER BY distance ASC, end_date DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![owner_id, blob, limit as i64], |row| {
                    Ok((row_to_summary(row)?, row.get::<_, f64>(8)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent summaries by end date, then start date, descending.
pub async fn recent(db: &Database, owner_id: &str, limit: usize) -> Result<Vec<Summary>, MemoirError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "SELECT {SUMMARY_COLUMNS} FROM summaries WHERE owner_id = ?1
                 ORDER BY end_date DESC, start_date DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![owner_id, limit as i64], row_to_summary)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count(db: &Database, owner_id: &str) -> Result<usize, MemoirError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM summaries WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_for_owner(db: &Database, owner_id: &str) -> Result<usize, MemoirError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute("DELETE FROM summaries WHERE owner_id = ?1", params![owner_id])
        })
        .await
        .map_err(map_tr_err)
}

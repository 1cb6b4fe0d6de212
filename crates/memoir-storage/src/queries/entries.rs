// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry and entry-embedding queries.
//!
//! Every read is scoped by `owner_id`. Keyword matching is a
//! case-insensitive substring test over the title and the derived keyword
//! index; the encrypted body is never searched in SQL.

use chrono::NaiveDate;
use memoir_core::{Entry, MemoirError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};
use crate::models::{date_to_sql, ts_from_sql, ts_to_sql, vec_to_blob};

const ENTRY_COLUMNS: &str = "id, owner_id, title, body, mood, created_at, search_keywords";

fn row_to_entry(row: &Row) -> Result<Entry, rusqlite::Error> {
    let created_at: String = row.get(5)?;
    Ok(Entry {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        mood: row.get(4)?,
        created_at: ts_from_sql(5, &created_at)?,
        search_keywords: row.get(6)?,
    })
}

/// Numbered placeholders `?{first}, ?{first+1}, ...` for an `IN` list.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert an entry, or update its mutable columns if the id exists.
///
/// `created_at` is immutable and is not touched on update. The existing
/// embedding row survives the update.
pub async fn save(db: &Database, entry: &Entry) -> Result<(), MemoirError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO entries (id, owner_id, title, body, mood, created_at, search_keywords)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    body = excluded.body,
                    mood = excluded.mood,
                    search_keywords = excluded.search_keywords",
                params![
                    entry.id,
                    entry.owner_id,
                    entry.title,
                    entry.body,
                    entry.mood,
                    ts_to_sql(&entry.created_at),
                    entry.search_keywords
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch one entry by id.
pub async fn get(db: &Database, entry_id: &str) -> Result<Option<Entry>, MemoirError> {
    let entry_id = entry_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
            conn.query_row(&sql, params![entry_id], row_to_entry)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the owner's entries among `ids`. Order is unspecified.
pub async fn get_many(
    db: &Database,
    owner_id: &str,
    ids: &[String],
) -> Result<Vec<Entry>, MemoirError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut values: Vec<Value> = vec![Value::Text(owner_id.to_string())];
    values.extend(ids.iter().cloned().map(Value::Text));
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE owner_id = ?1 AND id IN ({})",
        placeholders(2, ids.len())
    );

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params_from_iter(values.iter()), row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an entry. The embedding row goes with it via `ON DELETE CASCADE`.
pub async fn delete(db: &Database, entry_id: &str) -> Result<bool, MemoirError> {
    let entry_id = entry_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let n = conn.execute("DELETE FROM entries WHERE id = ?1", params![entry_id])?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// L2 nearest neighbors over entry embeddings via sqlite-vec.
///
/// Embeddings whose byte length differs from the query are filtered out
/// before the distance is computed.
pub async fn nearest(
    db: &Database,
    owner_id: &str,
    query: &[f32],
    limit: usize,
) -> Result<Vec<(String, f64)>, MemoirError> {
    let owner_id = owner_id.to_string();
    let blob = vec_to_blob(query);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT e.id, vec_distance_l2(ee.vector, ?2) AS distance
                 FROM entry_embeddings ee
                 JOIN entries e ON e.id = ee.entry_id
                 WHERE e.owner_id = ?1 AND length(ee.vector) = length(?2)
                 ORDER BY distance ASC, e.created_at DESC
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(params![owner_id, blob, limit as i64], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Entries whose title or keyword index contains any keyword, newest first.
pub async fn keyword_matches(
    db: &Database,
    owner_id: &str,
    keywords: &[String],
    exclude: &[String],
    limit: usize,
) -> Result<Vec<Entry>, MemoirError> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() || limit == 0 {
        return Ok(vec![]);
    }

    let mut values: Vec<Value> = vec![Value::Text(owner_id.to_string())];
    let mut clauses = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        values.push(Value::Text(keyword));
        let i = values.len();
        clauses.push(format!(
            "instr(fold_case(title), ?{i}) > 0 OR instr(fold_case(coalesce(search_keywords, '')), ?{i}) > 0"
        ));
    }

    let mut sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE owner_id = ?1 AND ({})",
        clauses.join(" OR ")
    );
    if !exclude.is_empty() {
        sql.push_str(&format!(
            " AND id NOT IN ({})",
            placeholders(values.len() + 1, exclude.len())
        ));
        values.extend(exclude.iter().cloned().map(Value::Text));
    }
    values.push(Value::Integer(limit as i64));
    sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ?{}", values.len()));

    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params_from_iter(values.iter()), row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// The owner's most recent entries, newest first.
pub async fn recent(db: &Database, owner_id: &str, limit: usize) -> Result<Vec<Entry>, MemoirError> {
    let owner_id = owner_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM entries WHERE owner_id = ?1
                 ORDER BY created_at DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params![owner_id, limit as i64], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Entries whose creation date lies in `[start, end]`, oldest first.
pub async fn between(
    db: &Database,
    owner_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Entry>, MemoirError> {
    let owner_id = owner_id.to_string();
    let (start, end) = (date_to_sql(&start), date_to_sql(&end));
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM entries
                 WHERE owner_id = ?1 AND substr(created_at, 1, 10) BETWEEN ?2 AND ?3
                 ORDER BY created_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params![owner_id, start, end], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Distinct owners with an entry in `[start, end]`.
pub async fn owners_between(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<String>, MemoirError> {
    let (start, end) = (date_to_sql(&start), date_to_sql(&end));
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT owner_id FROM entries
                 WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2
                 ORDER BY owner_id",
            )?;
            let owners = stmt
                .query_map(params![start, end], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(owners)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the embedding for an entry.
pub async fn upsert_embedding(
    db: &Database,
    entry_id: &str,
    vector: &[f32],
) -> Result<(), MemoirError> {
    let entry_id = entry_id.to_string();
    let blob = vec_to_blob(vector);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO entry_embeddings (entry_id, vector) VALUES (?1, ?2)
                 ON CONFLICT(entry_id) DO UPDATE SET
                    vector = excluded.vector,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![entry_id, blob],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the derived keyword index of an entry.
pub async fn set_search_keywords(
    db: &Database,
    entry_id: &str,
    keywords: &str,
) -> Result<(), MemoirError> {
    let entry_id = entry_id.to_string();
    let keywords = keywords.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "UPDATE entries SET search_keywords = ?1 WHERE id = ?2",
                params![keywords, entry_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn entry(owner: &str, title: &str, days_ago: i64) -> Entry {
        Entry::new(
            owner,
            title,
            "ciphertext",
            Some("calm".to_string()),
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[tokio::test]
    async fn save_and_get_round_trip() {
        let (db, _dir) = setup_db().await;
        let e = entry("alice", "Morning run", 0);
        save(&db, &e).await.unwrap();

        let loaded = get(&db, &e.id).await.unwrap().unwrap();
        assert_eq!(loaded, e);
        assert!(get(&db, "missing").await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn save_updates_without_touching_created_at() {
        let (db, _dir) = setup_db().await;
        let mut e = entry("alice", "Draft", 3);
        save(&db, &e).await.unwrap();
        upsert_embedding(&db, &e.id, &[1.0, 0.0]).await.unwrap();

        let original_created = e.created_at;
        e.title = "Final".to_string();
        e.created_at = Utc::now();
        save(&db, &e).await.unwrap();

        let loaded = get(&db, &e.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Final");
        assert_eq!(loaded.created_at, original_created);
        // Embedding survives the update.
        assert_eq!(nearest(&db, "alice", &[1.0, 0.0], 5).await.unwrap().len(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_cascades_to_embedding() {
        let (db, _dir) = setup_db().await;
        let e = entry("alice", "Temp", 0);
        save(&db, &e).await.unwrap();
        upsert_embedding(&db, &e.id, &[0.5, 0.5]).await.unwrap();

        assert!(delete(&db, &e.id).await.unwrap());
        assert!(!delete(&db, &e.id).await.unwrap());

        let remaining: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM entry_embeddings", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn nearest_orders_by_distance_and_scopes_owner() {
        let (db, _dir) = setup_db().await;
        let near = entry("alice", "near", 1);
        let far = entry("alice", "far", 1);
        let other = entry("bob", "other owner", 1);
        for e in [&near, &far, &other] {
            save(&db, e).await.unwrap();
        }
        upsert_embedding(&db, &near.id, &[1.0, 0.0, 0.0]).await.unwrap();
        upsert_embedding(&db, &far.id, &[0.0, 1.0, 0.0]).await.unwrap();
        upsert_embedding(&db, &other.id, &[1.0, 0.0, 0.0]).await.unwrap();

        let hits = nearest(&db, "alice", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, near.id);
        assert!(hits[0].1.abs() < 1e-6);
        assert!((hits[1].1 - 2f64.sqrt()).abs() < 1e-4);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn nearest_ignores_mismatched_dimensions() {
        let (db, _dir) = setup_db().await;
        let good = entry("alice", "good", 1);
        let stale = entry("alice", "stale", 1);
        save(&db, &good).await.unwrap();
        save(&db, &stale).await.unwrap();
        upsert_embedding(&db, &good.id, &[0.1, 0.2]).await.unwrap();
        upsert_embedding(&db, &stale.id, &[0.1, 0.2, 0.3]).await.unwrap();

        let hits = nearest(&db, "alice", &[0.1, 0.2], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, good.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keyword_matches_title_and_index_case_insensitively() {
        let (db, _dir) = setup_db().await;
        let by_title = entry("alice", "Summer Vacation plans", 5);
        let mut by_index = entry("alice", "Untitled", 1);
        by_index.search_keywords = Some("beach vacation sunscreen".to_string());
        let unrelated = entry("alice", "Groceries", 0);
        let foreign = entry("bob", "vacation", 0);
        for e in [&by_title, &by_index, &unrelated, &foreign] {
            save(&db, e).await.unwrap();
        }

        let hits = keyword_matches(&db, "alice", &["VACATION".to_string()], &[], 10)
            .await
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
        // Newest first.
        assert_eq!(ids, vec![by_index.id.as_str(), by_title.id.as_str()]);

        let excluded = keyword_matches(
            &db,
            "alice",
            &["vacation".to_string()],
            &[by_index.id.clone()],
            10,
        )
        .await
        .unwrap();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].id, by_title.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keyword_matches_fold_non_ascii_case() {
        let (db, _dir) = setup_db().await;
        let french = entry("alice", "Été à Nice", 3);
        let russian = entry("alice", "Отпуск в горах", 2);
        let mut greek = entry("alice", "Untitled", 1);
        greek.search_keywords = Some("ΘΆΛΑΣΣΑ ήλιος".to_string());
        for e in [&french, &russian, &greek] {
            save(&db, e).await.unwrap();
        }

        let hits = keyword_matches(&db, "alice", &["été".to_string()], &[], 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, french.id);

        let hits = keyword_matches(&db, "alice", &["ОТПУСК".to_string()], &[], 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, russian.id);

        let hits = keyword_matches(&db, "alice", &["θάλασσα".to_string()], &[], 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, greek.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keyword_matches_with_no_keywords_is_empty() {
        let (db, _dir) = setup_db().await;
        save(&db, &entry("alice", "anything", 0)).await.unwrap();
        assert!(keyword_matches(&db, "alice", &[], &[], 5).await.unwrap().is_empty());
        assert!(
            keyword_matches(&db, "alice", &["  ".to_string()], &[], 5)
                .await
                .unwrap()
                .is_empty()
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn recent_and_between_ordering() {
        let (db, _dir) = setup_db().await;
        let old = entry("alice", "old", 20);
        let mid = entry("alice", "mid", 10);
        let new = entry("alice", "new", 0);
        for e in [&mid, &new, &old] {
            save(&db, e).await.unwrap();
        }

        let recent_two = recent(&db, "alice", 2).await.unwrap();
        assert_eq!(recent_two[0].id, new.id);
        assert_eq!(recent_two[1].id, mid.id);

        let range = between(&db, "alice", old.created_date(), mid.created_date())
            .await
            .unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[0].id, old.id);
        assert_eq!(range[1].id, mid.id);

        let owners = owners_between(&db, old.created_date(), new.created_date())
            .await
            .unwrap();
        assert_eq!(owners, vec!["alice".to_string()]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_many_respects_owner() {
        let (db, _dir) = setup_db().await;
        let mine = entry("alice", "mine", 0);
        let theirs = entry("bob", "theirs", 0);
        save(&db, &mine).await.unwrap();
        save(&db, &theirs).await.unwrap();

        let got = get_many(&db, "alice", &[mine.id.clone(), theirs.id.clone()])
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, mine.id);

        db.close().await.unwrap();
    }
}

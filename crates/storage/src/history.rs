//! Selection log and user feedback.

use crate::models::{NewSelection, SelectionRow};
use sqlx::SqlitePool;
use tracing::debug;

pub async fn record_selection(pool: &SqlitePool, selection: &NewSelection) -> anyhow::Result<i64> {
    let id = sqlx::query(
        "INSERT INTO selections (created_at, query, intent, meme_id, asset_path, score)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(chrono::Utc::now().timestamp())
    .bind(&selection.query)
    .bind(&selection.intent)
    .bind(&selection.meme_id)
    .bind(&selection.asset_path)
    .bind(selection.score as f64)
    .execute(pool)
    .await?
    .last_insert_rowid();
    debug!(id, meme = %selection.meme_id, "recorded selection");
    Ok(id)
}

/// Most recent selections first, with feedback tallies.
pub async fn recent_selections(pool: &SqlitePool, limit: i64) -> anyhow::Result<Vec<SelectionRow>> {
    let rows = sqlx::query_as::<_, SelectionRow>(
        r#"
        SELECT s.id, s.created_at, s.query, s.intent, s.meme_id, s.asset_path, s.score,
               COALESCE(SUM(CASE WHEN f.liked = 1 THEN 1 ELSE 0 END), 0) AS likes,
               COALESCE(SUM(CASE WHEN f.liked = 0 THEN 1 ELSE 0 END), 0) AS dislikes
        FROM selections s
        LEFT JOIN feedback f ON f.selection_id = s.id
        GROUP BY s.id
        ORDER BY s.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Attach a like or dislike to a logged selection. Returns `false` when no
/// selection has that id.
pub async fn record_feedback(pool: &SqlitePool, selection_id: i64, liked: bool) -> anyhow::Result<bool> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM selections WHERE id = ?")
        .bind(selection_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }
    sqlx::query("INSERT INTO feedback (selection_id, liked, created_at) VALUES (?, ?, ?)")
        .bind(selection_id)
        .bind(liked)
        .bind(chrono::Utc::now().timestamp())
        .execute(pool)
        .await?;
    debug!(selection_id, liked, "recorded feedback");
    Ok(true)
}

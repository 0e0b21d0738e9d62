use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct NewSelection {
    pub query: String,
    pub intent: String,
    pub meme_id: String,
    pub asset_path: String,
    pub score: f32,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SelectionRow {
    pub id: i64,
    pub created_at: i64,
    pub query: String,
    pub intent: String,
    pub meme_id: String,
    pub asset_path: String,
    pub score: f64,
    pub likes: i64,
    pub dislikes: i64,
}

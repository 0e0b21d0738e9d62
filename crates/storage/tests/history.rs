use storage::history::{recent_selections, record_feedback, record_selection};
use storage::models::NewSelection;

fn selection(query: &str, meme: &str) -> NewSelection {
    NewSelection {
        query: query.to_string(),
        intent: "victory".to_string(),
        meme_id: meme.to_string(),
        asset_path: format!("{meme}.jpg"),
        score: 1.25,
    }
}

#[tokio::test]
async fn selections_are_listed_newest_first_with_feedback() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("history.db");
    let pool = storage::open(&db_path.to_string_lossy()).await.unwrap();

    let first = record_selection(&pool, &selection("we won", "success_kid"))
        .await
        .unwrap();
    let second = record_selection(&pool, &selection("nailed it", "gru"))
        .await
        .unwrap();
    assert!(second > first);

    assert!(record_feedback(&pool, first, true).await.unwrap());
    assert!(record_feedback(&pool, first, true).await.unwrap());
    assert!(record_feedback(&pool, first, false).await.unwrap());
    assert!(!record_feedback(&pool, 9999, true).await.unwrap());

    let rows = recent_selections(&pool, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, second);
    assert_eq!(rows[0].likes, 0);
    assert_eq!(rows[1].meme_id, "success_kid");
    assert_eq!(rows[1].likes, 2);
    assert_eq!(rows[1].dislikes, 1);
    assert!((rows[1].score - 1.25).abs() < 1e-6);

    let limited = recent_selections(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("twice.db");
    let url = db_path.to_string_lossy().into_owned();
    let pool = storage::open(&url).await.unwrap();
    storage::migrate(&pool).await.unwrap();
    assert!(recent_selections(&pool, 5).await.unwrap().is_empty());
}

use memerag_cli::session::{run_chat, Reply, Session};
use memerag_cli::wiring;
use memerag_core::config::AppConfig;
use memerag_core::{
    Embedder, IntentClassifier, MemeCatalog, MemeEntry, MemeRecord, RagManager, Selector,
};
use providers::{EmbedResponse, EmbeddingProvider, ProviderError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use storage::history;

const CATALOG: &str = r#"
[[memes]]
id = "success_kid"
asset = "success_kid.jpg"
caption = "Nailed it, total victory"
tags = ["victory", "proud"]

[[memes]]
id = "wave"
asset = "wave.gif"
caption = "hello hello friend"
tags = ["greeting"]

[[memes]]
id = "facepalm"
asset = "facepalm.jpg"
caption = "why would you do that"
tags = ["exasperation"]
"#;

fn write_config(dir: &Path) -> AppConfig {
    let catalog_path = dir.join("memes.toml");
    fs::write(&catalog_path, CATALOG).unwrap();
    let asset_dir = dir.join("memes");
    fs::create_dir_all(&asset_dir).unwrap();
    fs::write(asset_dir.join("wave.gif"), b"GIF89a").unwrap();

    let mut cfg = AppConfig::default();
    cfg.catalog.path = catalog_path.to_string_lossy().into_owned();
    cfg.catalog.asset_dir = asset_dir.to_string_lossy().into_owned();
    cfg.embeddings.dimension = 128;
    cfg.history.database = dir.join("history.db").to_string_lossy().into_owned();
    cfg
}

async fn session_for(cfg: &AppConfig) -> Session {
    let registry = wiring::build_registry_with_key(cfg, None);
    let manager = wiring::build_manager(cfg, &registry).await.unwrap();
    let pool = storage::open(&cfg.history.database).await.unwrap();
    Session::new(manager, &cfg.catalog.asset_dir).with_history(pool)
}

#[tokio::test]
async fn submit_returns_meme_and_logs_it() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = write_config(temp.path());
    let session = session_for(&cfg).await;

    let reply = session.submit("Hello there, friend!").await;
    let meme = match reply {
        Reply::Meme(m) => m,
        other => panic!("expected a meme, got {other:?}"),
    };
    assert_eq!(meme.id, "wave");
    assert_eq!(meme.intent, "greeting");
    assert!(meme.asset_found);
    let history_id = meme.history_id.expect("selection should be logged");

    assert!(session.feedback(history_id, true).await.unwrap());
    assert!(!session.feedback(history_id + 100, true).await.unwrap());

    let pool = storage::open(&cfg.history.database).await.unwrap();
    let rows = history::recent_selections(&pool, 5).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].meme_id, "wave");
    assert_eq!(rows[0].query, "Hello there, friend!");
    assert_eq!(rows[0].likes, 1);
}

#[tokio::test]
async fn missing_asset_is_flagged_not_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = write_config(temp.path());
    let session = session_for(&cfg).await;

    match session.submit("nailed it! victory").await {
        Reply::Meme(m) => {
            assert_eq!(m.id, "success_kid");
            assert!(!m.asset_found);
            assert!(m.asset.ends_with("success_kid.jpg"));
        }
        other => panic!("expected a meme, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_loop_skips_blank_lines_and_stops_at_quit() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = write_config(temp.path());
    let session = session_for(&cfg).await;

    let input = "hello friend\n\n   \nwhy would you do that\nQUIT\nnailed it\n".as_bytes();
    let mut output = Vec::new();
    let served = run_chat(&session, input, &mut output).await.unwrap();
    assert_eq!(served, 2);
    let transcript = String::from_utf8(output).unwrap();
    assert!(transcript.contains("meme: wave"));
    assert!(transcript.contains("meme: facepalm"));
    assert!(!transcript.contains("success_kid"));
}

#[tokio::test]
async fn chat_loop_ends_at_end_of_input() {
    let temp = tempfile::tempdir().unwrap();
    let cfg = write_config(temp.path());
    let session = session_for(&cfg).await;

    let (client, server) = tokio::io::duplex(256);
    let writer = tokio::spawn(async move {
        let mut client = client;
        tokio::io::AsyncWriteExt::write_all(&mut client, b"hello friend\n")
            .await
            .unwrap();
        // dropping the client closes the stream
    });
    let mut output = Vec::new();
    let served = run_chat(&session, tokio::io::BufReader::new(server), &mut output)
        .await
        .unwrap();
    writer.await.unwrap();
    assert_eq!(served, 1);
    let transcript = String::from_utf8(output).unwrap();
    assert!(transcript.starts_with("MemeRAG chat ready."));
    assert!(transcript.contains("meme: wave"));
}

#[tokio::test]
async fn openai_without_key_is_a_configuration_error() {
    let temp = tempfile::tempdir().unwrap();
    let mut cfg = write_config(temp.path());
    cfg.embeddings.provider = "openai".to_string();
    let registry = wiring::build_registry_with_key(&cfg, None);
    assert!(wiring::build_embedder(&cfg, &registry).is_err());

    let registry = wiring::build_registry_with_key(&cfg, Some("sk-test".to_string()));
    assert!(wiring::build_embedder(&cfg, &registry).is_ok());
}

struct Offline;

#[async_trait::async_trait]
impl EmbeddingProvider for Offline {
    async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::RequestFailed("connection refused".into()))
    }
}

fn static_catalog() -> Arc<MemeCatalog> {
    Arc::new(
        MemeCatalog::from_entries(vec![MemeEntry::new(
            MemeRecord {
                id: "a".into(),
                asset_path: "a.png".into(),
                caption: "a".into(),
                tags: vec![],
            },
            vec![1.0, 0.0],
        )])
        .unwrap(),
    )
}

#[tokio::test]
async fn provider_outage_becomes_retryable_message() {
    let manager = RagManager::new(
        static_catalog(),
        Embedder::new(Arc::new(Offline), 2),
        IntentClassifier::new(),
        Selector::default(),
    );
    let session = Session::new(manager, "memes");
    match session.submit("hello").await {
        Reply::Failed { message, retryable } => {
            assert!(retryable);
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    // history disabled
    assert!(!session.feedback(1, true).await.unwrap());
}

#[tokio::test]
async fn empty_catalog_reports_no_memes() {
    let manager = RagManager::new(
        Arc::new(MemeCatalog::default()),
        Embedder::new(Arc::new(providers::hashing::HashingProvider::new(8)), 8),
        IntentClassifier::new(),
        Selector::default(),
    );
    let session = Session::new(manager, "memes");
    let reply = session.submit("anything").await;
    assert!(matches!(reply, Reply::NoMemes));
    assert_eq!(reply.to_string(), "no memes available");
}

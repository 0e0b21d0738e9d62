//! One user's conversation: submit text, get a meme or a message back.

use anyhow::Result;
use memerag_core::{RagError, RagManager, SelectionResult};
use serde::Serialize;
use sqlx::SqlitePool;
use std::fmt;
use std::path::{Path, PathBuf};
use storage::history;
use storage::models::NewSelection;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, warn};

#[derive(Debug, Clone, Serialize)]
pub struct MemeReply {
    pub id: String,
    pub caption: String,
    pub asset: PathBuf,
    pub asset_found: bool,
    pub intent: String,
    pub score: f32,
    /// Row id in the selection history, usable for feedback.
    pub history_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Meme(MemeReply),
    NoMemes,
    Failed { message: String, retryable: bool },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Meme(m) => {
                writeln!(f, "meme: {} [{}, score {:.3}]", m.id, m.intent, m.score)?;
                writeln!(f, "caption: {}", m.caption)?;
                write!(f, "asset: {}", m.asset.display())?;
                if !m.asset_found {
                    write!(f, " (missing)")?;
                }
                if let Some(id) = m.history_id {
                    write!(f, "\nhistory id: {id}")?;
                }
                Ok(())
            }
            Reply::NoMemes => write!(f, "no memes available"),
            Reply::Failed { message, retryable } => {
                write!(f, "error: {message}")?;
                if *retryable {
                    write!(f, " (try again)")?;
                }
                Ok(())
            }
        }
    }
}

pub struct Session {
    manager: RagManager,
    asset_dir: PathBuf,
    history: Option<SqlitePool>,
}

impl Session {
    pub fn new(manager: RagManager, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            manager,
            asset_dir: asset_dir.into(),
            history: None,
        }
    }

    pub fn with_history(mut self, pool: SqlitePool) -> Self {
        self.history = Some(pool);
        self
    }

    pub fn manager(&self) -> &RagManager {
        &self.manager
    }

    pub fn asset_path(&self, asset: &str) -> PathBuf {
        let path = Path::new(asset);
        if path.is_absolute() || asset.contains("://") {
            path.to_path_buf()
        } else {
            self.asset_dir.join(path)
        }
    }

    pub async fn submit(&self, text: &str) -> Reply {
        match self.manager.respond(text).await {
            Ok(selection) => Reply::Meme(self.meme_reply(text, &selection).await),
            Err(RagError::NoMemesAvailable) => Reply::NoMemes,
            Err(e) => {
                if matches!(e, RagError::DimensionMismatch { .. }) {
                    error!(error = %e, "catalog and embedder disagree");
                }
                Reply::Failed {
                    retryable: e.is_transient(),
                    message: e.to_string(),
                }
            }
        }
    }

    async fn meme_reply(&self, text: &str, selection: &SelectionResult<'_>) -> MemeReply {
        let entry = selection.entry;
        let asset = self.asset_path(&entry.asset_path);
        let asset_found = entry.asset_path.contains("://") || asset.exists();
        if !asset_found {
            warn!(path = %asset.display(), "meme asset not found");
        }
        let history_id = match &self.history {
            Some(pool) => {
                let row = NewSelection {
                    query: text.to_string(),
                    intent: selection.intent.to_string(),
                    meme_id: entry.id.clone(),
                    asset_path: entry.asset_path.clone(),
                    score: selection.score,
                };
                match history::record_selection(pool, &row).await {
                    Ok(id) => Some(id),
                    Err(e) => {
                        warn!(error = %e, "failed to record selection");
                        None
                    }
                }
            }
            None => None,
        };
        MemeReply {
            id: entry.id.clone(),
            caption: selection.caption.to_string(),
            asset,
            asset_found,
            intent: selection.intent.to_string(),
            score: selection.score,
            history_id,
        }
    }

    /// Returns `false` if history is disabled or the id is unknown.
    pub async fn feedback(&self, history_id: i64, liked: bool) -> Result<bool> {
        match &self.history {
            Some(pool) => history::record_feedback(pool, history_id, liked).await,
            None => Ok(false),
        }
    }
}

/// Console loop: one request per line until `quit`, `exit` or end of input.
/// Returns the number of requests served.
pub async fn run_chat<R, W>(session: &Session, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(b"MemeRAG chat ready. Type 'quit' to exit.\n")
        .await?;
    let mut served = 0usize;
    let mut lines = input.lines();
    loop {
        output.write_all(b"\nyou: ").await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }
        let reply = session.submit(text).await;
        output.write_all(format!("{reply}\n").as_bytes()).await?;
        served += 1;
    }
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(served)
}

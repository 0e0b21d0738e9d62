use anyhow::{bail, Result};
use clap::{ArgGroup, Parser, Subcommand};
use memerag_cli::session::{run_chat, Session};
use memerag_cli::{logging, wiring};
use memerag_core::config::{self, AppConfig};
use storage::history;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    logging::init(&cfg.logging.level);

    match cli.command {
        Commands::Chat => run_chat_loop(cfg).await,
        Commands::Ask {
            text,
            json,
            explain,
        } => run_ask(cfg, &text.join(" "), json, explain).await,
        Commands::Catalog { json } => run_catalog(cfg, json).await,
        Commands::History { limit, json } => run_history(cfg, limit, json).await,
        Commands::Feedback { id, like, .. } => run_feedback(cfg, id, like).await,
    }
}

#[derive(Parser)]
#[command(name = "memerag")]
#[command(about = "Answer messages with the best matching meme", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive console chat
    Chat,
    /// Answer a single message
    Ask {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Show detected intent and the ranked candidates
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
    /// List the memes in the catalog
    Catalog {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recent selections
    History {
        /// Number of rows
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Like or dislike a past selection
    #[command(group(ArgGroup::new("verdict").required(true).args(["like", "dislike"])))]
    Feedback {
        /// History id printed with the selection
        id: i64,
        #[arg(long)]
        like: bool,
        #[arg(long)]
        dislike: bool,
    },
}

async fn build_session(cfg: &AppConfig) -> Result<Session> {
    let registry = wiring::build_registry(cfg)?;
    let manager = wiring::build_manager(cfg, &registry).await?;
    let mut session = Session::new(manager, &cfg.catalog.asset_dir);
    if cfg.history.enabled {
        match storage::open(&cfg.history.database).await {
            Ok(pool) => session = session.with_history(pool),
            Err(e) => tracing::warn!(error = %e, "selection history disabled"),
        }
    }
    Ok(session)
}

async fn run_chat_loop(cfg: AppConfig) -> Result<()> {
    let session = build_session(&cfg).await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let served = run_chat(&session, stdin, tokio::io::stdout()).await?;
    tracing::info!(served, "chat ended");
    Ok(())
}

async fn run_ask(cfg: AppConfig, text: &str, json: bool, explain: bool) -> Result<()> {
    let session = build_session(&cfg).await?;
    if explain {
        let explanation = session.manager().explain(text).await?;
        let ranked: Vec<serde_json::Value> = explanation
            .ranked
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.entry.id,
                    "similarity": c.similarity,
                    "boost": c.boost,
                    "score": c.final_score(),
                    "tags": c.entry.tags,
                })
            })
            .collect();
        if json {
            let out = serde_json::json!({
                "query": explanation.query.text,
                "intent": explanation.query.intent,
                "matched_keywords": explanation.matched_keywords,
                "candidates": ranked,
                "selected": explanation.selection.entry.id,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!(
                "intent: {} (keywords: {})",
                explanation.query.intent,
                explanation.matched_keywords.join(", ")
            );
            for (rank, c) in explanation.ranked.iter().enumerate() {
                println!(
                    "{:>2}. {:<24} sim {:>6.3} boost {:>4.2} score {:>6.3}",
                    rank + 1,
                    c.entry.id,
                    c.similarity,
                    c.boost,
                    c.final_score()
                );
            }
            println!("selected: {}", explanation.selection.entry.id);
        }
        return Ok(());
    }

    let reply = session.submit(text).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{reply}");
    }
    Ok(())
}

async fn run_catalog(cfg: AppConfig, json: bool) -> Result<()> {
    let registry = wiring::build_registry(&cfg)?;
    let embedder = wiring::build_embedder(&cfg, &registry)?;
    let catalog = wiring::load_catalog(&cfg, &embedder).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(catalog.entries())?);
        return Ok(());
    }
    for entry in catalog.entries() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        println!("{:<24} {:<32} [{}]", entry.id, entry.asset_path, tags.join(", "));
        println!("    {}", entry.caption);
    }
    println!("{} memes", catalog.len());
    Ok(())
}

async fn run_history(cfg: AppConfig, limit: i64, json: bool) -> Result<()> {
    let pool = storage::open(&cfg.history.database).await?;
    let rows = history::recent_selections(&pool, limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        let when = chrono::DateTime::from_timestamp(row.created_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| row.created_at.to_string());
        println!(
            "#{:<5} {} {:<14} {:<24} +{} -{}  {}",
            row.id, when, row.intent, row.meme_id, row.likes, row.dislikes, row.query
        );
    }
    Ok(())
}

async fn run_feedback(cfg: AppConfig, id: i64, like: bool) -> Result<()> {
    let pool = storage::open(&cfg.history.database).await?;
    if !history::record_feedback(&pool, id, like).await? {
        bail!("no selection with history id {id}");
    }
    println!("recorded {} for #{id}", if like { "like" } else { "dislike" });
    Ok(())
}

//! Core library: meme catalog, embeddings, intent classification, retrieval
//! and selection.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod manager;
pub mod models;
pub mod retriever;
pub mod selector;

pub use catalog::MemeCatalog;
pub use classifier::IntentClassifier;
pub use embeddings::Embedder;
pub use error::RagError;
pub use manager::{Explanation, RagManager};
pub use models::{Intent, MemeEntry, MemeRecord, Query, ScoredCandidate, SelectionResult};
pub use selector::{BoostCombine, BoostPolicy, Selector};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A catalog row as read from disk, before it has an embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeRecord {
    pub id: String,
    #[serde(alias = "asset", alias = "image")]
    pub asset_path: String,
    pub caption: String,
    #[serde(default, alias = "context_tags")]
    pub tags: Vec<String>,
}

impl MemeRecord {
    /// Text handed to the embedder for this meme: caption, then tags.
    pub fn embedding_text(&self) -> String {
        if self.tags.is_empty() {
            return self.caption.clone();
        }
        format!("{} {}", self.caption, self.tags.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemeEntry {
    pub id: String,
    pub asset_path: String,
    pub caption: String,
    pub tags: BTreeSet<String>,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl MemeEntry {
    pub fn new(record: MemeRecord, embedding: Vec<f32>) -> Self {
        Self {
            id: record.id,
            asset_path: record.asset_path,
            caption: record.caption,
            tags: record
                .tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            embedding,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Communicative purpose of a user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Celebration,
    Angry,
    Sad,
    Happy,
    Shocked,
    Confused,
    Agreement,
    Rejection,
    Questioning,
    Skeptical,
    Mockery,
    Victory,
    Dismissive,
    Challenging,
    Revelation,
    Thoughtful,
    Choice,
    Comparison,
    Contradiction,
    Sarcastic,
    Exasperation,
    Awkward,
    Coping,
    Reality,
    Confident,
    Proud,
    Clever,
    Dramatic,
    Supportive,
    Strategy,
    Reaction,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 33] = [
        Intent::Greeting,
        Intent::Celebration,
        Intent::Angry,
        Intent::Sad,
        Intent::Happy,
        Intent::Shocked,
        Intent::Confused,
        Intent::Agreement,
        Intent::Rejection,
        Intent::Questioning,
        Intent::Skeptical,
        Intent::Mockery,
        Intent::Victory,
        Intent::Dismissive,
        Intent::Challenging,
        Intent::Revelation,
        Intent::Thoughtful,
        Intent::Choice,
        Intent::Comparison,
        Intent::Contradiction,
        Intent::Sarcastic,
        Intent::Exasperation,
        Intent::Awkward,
        Intent::Coping,
        Intent::Reality,
        Intent::Confident,
        Intent::Proud,
        Intent::Clever,
        Intent::Dramatic,
        Intent::Supportive,
        Intent::Strategy,
        Intent::Reaction,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Celebration => "celebration",
            Intent::Angry => "angry",
            Intent::Sad => "sad",
            Intent::Happy => "happy",
            Intent::Shocked => "shocked",
            Intent::Confused => "confused",
            Intent::Agreement => "agreement",
            Intent::Rejection => "rejection",
            Intent::Questioning => "questioning",
            Intent::Skeptical => "skeptical",
            Intent::Mockery => "mockery",
            Intent::Victory => "victory",
            Intent::Dismissive => "dismissive",
            Intent::Challenging => "challenging",
            Intent::Revelation => "revelation",
            Intent::Thoughtful => "thoughtful",
            Intent::Choice => "choice",
            Intent::Comparison => "comparison",
            Intent::Contradiction => "contradiction",
            Intent::Sarcastic => "sarcastic",
            Intent::Exasperation => "exasperation",
            Intent::Awkward => "awkward",
            Intent::Coping => "coping",
            Intent::Reality => "reality",
            Intent::Confident => "confident",
            Intent::Proud => "proud",
            Intent::Clever => "clever",
            Intent::Dramatic => "dramatic",
            Intent::Supportive => "supportive",
            Intent::Strategy => "strategy",
            Intent::Reaction => "reaction",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| format!("unknown intent label: {s}"))
    }
}

/// One user request after classification and embedding.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub embedding: Vec<f32>,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub entry: &'a MemeEntry,
    pub similarity: f32,
    pub boost: f32,
}

impl<'a> ScoredCandidate<'a> {
    pub fn new(entry: &'a MemeEntry, similarity: f32) -> Self {
        Self {
            entry,
            similarity,
            boost: 0.0,
        }
    }

    pub fn final_score(&self) -> f32 {
        self.similarity + self.boost
    }
}

/// The meme chosen for one request.
#[derive(Debug, Clone, Copy)]
pub struct SelectionResult<'a> {
    pub entry: &'a MemeEntry,
    pub intent: Intent,
    pub similarity: f32,
    pub boost: f32,
    pub score: f32,
    pub caption: &'a str,
}

//! Intent-aware re-ranking of retrieved candidates.

use crate::error::RagError;
use crate::models::{Intent, MemeEntry, ScoredCandidate, SelectionResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Tags that count as a match for an intent in addition to its own label.
pub const DEFAULT_INTENT_TAGS: &[(Intent, &[&str])] = &[
    (Intent::Mockery, &["sarcastic", "funny"]),
    (Intent::Shocked, &["shock", "surprised"]),
    (Intent::Clever, &["smart"]),
    (Intent::Thoughtful, &["thinking"]),
    (Intent::Supportive, &["approving"]),
    (Intent::Victory, &["celebration"]),
    (Intent::Celebration, &["victory", "party"]),
    (Intent::Happy, &["celebration"]),
    (Intent::Greeting, &["hello"]),
];

/// How several matching tags on one meme combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostCombine {
    /// One boost, however many tags match.
    #[default]
    Max,
    /// One boost per matching tag.
    Additive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPolicy {
    pub amount: f32,
    pub combine: BoostCombine,
}

impl Default for BoostPolicy {
    fn default() -> Self {
        Self {
            amount: 0.5,
            combine: BoostCombine::Max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selector {
    policy: BoostPolicy,
    intent_tags: HashMap<Intent, BTreeSet<String>>,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(BoostPolicy::default())
    }
}

impl Selector {
    pub fn new(policy: BoostPolicy) -> Self {
        let mut selector = Self {
            policy,
            intent_tags: HashMap::new(),
        };
        for (intent, tags) in DEFAULT_INTENT_TAGS {
            selector.add_tags(*intent, tags.iter().map(|t| t.to_string()));
        }
        selector
    }

    /// Selector whose only boost tag per intent is the intent's own label.
    pub fn without_mapping(policy: BoostPolicy) -> Self {
        Self {
            policy,
            intent_tags: HashMap::new(),
        }
    }

    pub fn with_intent_tags(mut self, extra: &HashMap<Intent, Vec<String>>) -> Self {
        for (intent, tags) in extra {
            self.add_tags(*intent, tags.iter().cloned());
        }
        self
    }

    fn add_tags(&mut self, intent: Intent, tags: impl IntoIterator<Item = String>) {
        let slot = self.intent_tags.entry(intent).or_default();
        slot.extend(
            tags.into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
    }

    pub fn policy(&self) -> BoostPolicy {
        self.policy
    }

    /// Intents that can boost at least one meme carrying any of `tags`,
    /// through their own label or a mapped tag.
    pub fn boostable_intents<'t>(
        &self,
        tags: impl IntoIterator<Item = &'t str>,
    ) -> BTreeSet<Intent> {
        let tags: BTreeSet<&str> = tags.into_iter().collect();
        Intent::ALL
            .iter()
            .copied()
            .filter(|intent| *intent != Intent::Unknown)
            .filter(|intent| {
                tags.contains(intent.as_str())
                    || self
                        .intent_tags
                        .get(intent)
                        .map(|mapped| mapped.iter().any(|t| tags.contains(t.as_str())))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Boost earned by `entry` under `intent`. [`Intent::Unknown`] earns none.
    pub fn boost(&self, intent: Intent, entry: &MemeEntry) -> f32 {
        if intent == Intent::Unknown {
            return 0.0;
        }
        let mut matches = usize::from(entry.has_tag(intent.as_str()));
        if let Some(tags) = self.intent_tags.get(&intent) {
            matches += tags
                .iter()
                .filter(|t| t.as_str() != intent.as_str() && entry.has_tag(t))
                .count();
        }
        match (matches, self.policy.combine) {
            (0, _) => 0.0,
            (_, BoostCombine::Max) => self.policy.amount,
            (n, BoostCombine::Additive) => self.policy.amount * n as f32,
        }
    }

    /// Apply boosts and re-sort by final score. The sort is stable, so
    /// candidates with equal final scores keep their retrieval order.
    pub fn rerank<'a>(
        &self,
        candidates: &[ScoredCandidate<'a>],
        intent: Intent,
    ) -> Vec<ScoredCandidate<'a>> {
        let mut ranked: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .map(|c| ScoredCandidate {
                boost: self.boost(intent, c.entry),
                ..*c
            })
            .collect();
        ranked.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));
        ranked
    }

    pub fn select<'a>(
        &self,
        candidates: &[ScoredCandidate<'a>],
        intent: Intent,
    ) -> Result<SelectionResult<'a>, RagError> {
        Self::top_of(&self.rerank(candidates, intent), intent)
    }

    /// First entry of an already re-ranked list.
    pub fn top_of<'a>(
        ranked: &[ScoredCandidate<'a>],
        intent: Intent,
    ) -> Result<SelectionResult<'a>, RagError> {
        let top = ranked.first().ok_or(RagError::EmptyCandidateSet)?;
        Ok(SelectionResult {
            entry: top.entry,
            intent,
            similarity: top.similarity,
            boost: top.boost,
            score: top.final_score(),
            caption: top.entry.caption.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemeRecord;

    fn entry(id: &str, tags: &[&str]) -> MemeEntry {
        MemeEntry::new(
            MemeRecord {
                id: id.into(),
                asset_path: format!("{id}.gif"),
                caption: format!("caption {id}"),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            vec![1.0],
        )
    }

    #[test]
    fn empty_input_is_an_error() {
        let selector = Selector::default();
        assert_eq!(
            selector.select(&[], Intent::Happy).unwrap_err(),
            RagError::EmptyCandidateSet
        );
    }

    #[test]
    fn boostable_intents_follow_labels_and_mapped_tags() {
        let selector = Selector::default();
        let intents = selector.boostable_intents(["sad", "party", "nothing-maps-here"]);
        assert!(intents.contains(&Intent::Sad));
        // "party" is a mapped tag of celebration only
        assert!(intents.contains(&Intent::Celebration));
        assert!(!intents.contains(&Intent::Victory));
        assert!(!intents.contains(&Intent::Unknown));
        assert_eq!(intents.len(), 2);
        assert!(selector.boostable_intents(std::iter::empty()).is_empty());
    }

    #[test]
    fn top_of_takes_ranked_head_without_reranking() {
        let a = entry("a", &["victory"]);
        let b = entry("b", &[]);
        let ranked = [
            ScoredCandidate {
                boost: 0.5,
                ..ScoredCandidate::new(&a, 0.2)
            },
            ScoredCandidate::new(&b, 0.6),
        ];
        let result = Selector::top_of(&ranked, Intent::Victory).unwrap();
        assert_eq!(result.entry.id, "a");
        assert!((result.score - 0.7).abs() < 1e-6);
        assert_eq!(
            Selector::top_of(&[], Intent::Victory).unwrap_err(),
            RagError::EmptyCandidateSet
        );
    }

    #[test]
    fn matching_tag_overtakes_higher_similarity() {
        let a = entry("a", &["sad"]);
        let b = entry("b", &["victory"]);
        let candidates = [ScoredCandidate::new(&a, 0.9), ScoredCandidate::new(&b, 0.6)];
        let result = Selector::default()
            .select(&candidates, Intent::Victory)
            .unwrap();
        assert_eq!(result.entry.id, "b");
        assert!((result.score - 1.1).abs() < 1e-6);
        assert_eq!(result.boost, 0.5);
        assert_eq!(result.caption, "caption b");
    }

    #[test]
    fn mapped_tags_also_boost() {
        let a = entry("a", &[]);
        let b = entry("b", &["sarcastic"]);
        let candidates = [ScoredCandidate::new(&a, 0.8), ScoredCandidate::new(&b, 0.7)];
        let result = Selector::default()
            .select(&candidates, Intent::Mockery)
            .unwrap();
        assert_eq!(result.entry.id, "b");

        let plain = Selector::without_mapping(BoostPolicy::default());
        assert_eq!(plain.select(&candidates, Intent::Mockery).unwrap().entry.id, "a");
    }

    #[test]
    fn unknown_intent_never_boosts() {
        let a = entry("a", &["unknown", "reaction"]);
        assert_eq!(Selector::default().boost(Intent::Unknown, &a), 0.0);
    }

    #[test]
    fn combine_max_versus_additive() {
        let meme = entry("m", &["mockery", "sarcastic", "funny"]);
        let max = Selector::default();
        let additive = Selector::new(BoostPolicy {
            amount: 0.25,
            combine: BoostCombine::Additive,
        });
        assert_eq!(max.boost(Intent::Mockery, &meme), 0.5);
        assert_eq!(additive.boost(Intent::Mockery, &meme), 0.75);
    }

    #[test]
    fn configured_tags_extend_the_mapping() {
        let meme = entry("m", &["gg"]);
        let mut extra = HashMap::new();
        extra.insert(Intent::Victory, vec![" GG ".to_string()]);
        let selector = Selector::default().with_intent_tags(&extra);
        assert_eq!(selector.boost(Intent::Victory, &meme), 0.5);
        assert_eq!(Selector::default().boost(Intent::Victory, &meme), 0.0);
    }

    #[test]
    fn equal_final_scores_keep_retrieval_order() {
        let a = entry("a", &[]);
        let b = entry("b", &["happy"]);
        let c = entry("c", &[]);
        let d = entry("d", &["happy"]);
        // b and d end up level with a and c after boosting
        let candidates = [
            ScoredCandidate::new(&a, 0.75),
            ScoredCandidate::new(&c, 0.75),
            ScoredCandidate::new(&b, 0.25),
            ScoredCandidate::new(&d, 0.25),
        ];
        let ranked = Selector::default().rerank(&candidates, Intent::Happy);
        let order: Vec<&str> = ranked.iter().map(|c| c.entry.id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }
}

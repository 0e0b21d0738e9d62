//! Keyword intent classification.
//!
//! Text and keywords are both reduced to token sequences (lower-case, split
//! on anything that is not alphanumeric or an apostrophe) and a keyword
//! matches when its tokens occur contiguously in the text. The label with the
//! most distinct keyword hits wins; ties go to the label listed first.

use crate::models::Intent;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Built-in label → keyword table. Order matters for tie-breaking.
pub const DEFAULT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Greeting,
        &["hello", "hi", "hey", "howdy", "greetings", "good morning", "good evening", "sup", "yo"],
    ),
    (
        Intent::Celebration,
        &["congrats", "congratulations", "celebrate", "party", "birthday", "hooray", "cheers", "woohoo"],
    ),
    (
        Intent::Angry,
        &["angry", "mad", "furious", "rage", "pissed", "annoyed", "irritated", "frustrated"],
    ),
    (
        Intent::Sad,
        &["sad", "depressed", "down", "disappointed", "upset", "crying", "lonely"],
    ),
    (
        Intent::Happy,
        &["happy", "excited", "joyful", "glad", "cheerful", "delighted", "pleased"],
    ),
    (
        Intent::Shocked,
        &["shocked", "surprised", "stunned", "amazed", "astonished", "wow", "wtf", "omg"],
    ),
    (
        Intent::Confused,
        &["confused", "puzzled", "unsure", "uncertain", "don't understand", "unclear"],
    ),
    (
        Intent::Agreement,
        &["yes", "agree", "correct", "right", "absolutely", "exactly", "sure", "ok"],
    ),
    (
        Intent::Rejection,
        &["no", "disagree", "wrong", "incorrect", "nope", "not true", "nah"],
    ),
    (
        Intent::Questioning,
        &["why", "how", "when", "what if", "curious", "wonder"],
    ),
    (
        Intent::Skeptical,
        &["doubt", "skeptical", "not sure", "questionable", "suspicious", "hmm"],
    ),
    (
        Intent::Mockery,
        &["lol", "haha", "noob", "funny", "joke", "ridiculous", "silly", "lmao"],
    ),
    (
        Intent::Victory,
        &["win", "success", "achievement", "accomplished", "nailed it", "victory", "done"],
    ),
    (
        Intent::Dismissive,
        &["whatever", "don't care", "meh", "boring", "irrelevant", "stupid"],
    ),
    (
        Intent::Challenging,
        &["try me", "prove it", "challenge", "bet", "dare", "come on", "fight me"],
    ),
    (
        Intent::Revelation,
        &["realized", "suddenly", "discovery", "found out", "epiphany", "aha moment"],
    ),
    (
        Intent::Thoughtful,
        &["thinking", "considering", "reflecting", "pondering", "contemplating"],
    ),
    (
        Intent::Choice,
        &["choose", "decision", "options", "dilemma", "either", "or", "alternatives"],
    ),
    (
        Intent::Comparison,
        &["better", "worse", "versus", "compared to", "difference", "contrast"],
    ),
    (
        Intent::Contradiction,
        &["but", "however", "despite", "although", "contrary", "opposite"],
    ),
    (
        Intent::Sarcastic,
        &["sure thing", "yeah right", "obviously", "of course", "how nice"],
    ),
    (
        Intent::Exasperation,
        &["seriously", "again", "enough", "can't take it", "exhausted"],
    ),
    (
        Intent::Awkward,
        &["awkward", "uncomfortable", "embarrassed", "cringe", "yikes"],
    ),
    (
        Intent::Coping,
        &["dealing with", "handling", "coping", "managing", "surviving", "getting by"],
    ),
    (
        Intent::Reality,
        &["truth", "fact", "reality", "actually", "in fact", "really"],
    ),
    (
        Intent::Confident,
        &["confident", "certain", "sure", "positive", "definitely", "absolutely"],
    ),
    (
        Intent::Proud,
        &["proud", "achievement", "accomplished", "did it", "made it", "success"],
    ),
    (
        Intent::Clever,
        &["smart", "clever", "brilliant", "genius", "intelligent", "big brain"],
    ),
    (
        Intent::Dramatic,
        &["dramatic", "intense", "serious", "dire", "critical", "extreme"],
    ),
    (
        Intent::Supportive,
        &["support", "help", "encourage", "there for you", "backing you"],
    ),
    (
        Intent::Strategy,
        &["plan", "strategy", "approach", "organize", "method", "system"],
    ),
    (
        Intent::Reaction,
        &["react", "response", "reply", "answer", "comeback"],
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone)]
struct IntentRule {
    intent: Intent,
    keywords: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let table = DEFAULT_KEYWORDS
            .iter()
            .map(|(intent, words)| (*intent, words.iter().map(|w| w.to_string()).collect()))
            .collect();
        Self::with_table(table)
    }

    /// Build from an explicit ordered table. Keywords that normalise to
    /// nothing are dropped, as are rules for [`Intent::Unknown`].
    pub fn with_table(table: Vec<(Intent, Vec<String>)>) -> Self {
        let mut classifier = Self { rules: Vec::new() };
        for (intent, words) in table {
            classifier.add_keywords(intent, &words);
        }
        classifier
    }

    /// Merge extra keywords into the table, appending a new rule at the end
    /// when the label has none yet.
    pub fn extend(mut self, extra: &HashMap<Intent, Vec<String>>) -> Self {
        let mut labels: Vec<&Intent> = extra.keys().collect();
        labels.sort();
        for intent in labels {
            self.add_keywords(*intent, &extra[intent]);
        }
        self
    }

    /// Keep only the rules for `allowed` labels. An empty set leaves the
    /// table untouched, so a catalog with no usable tags still classifies.
    pub fn restrict_to(mut self, allowed: &BTreeSet<Intent>) -> Self {
        if allowed.is_empty() {
            return self;
        }
        self.rules.retain(|r| allowed.contains(&r.intent));
        self
    }

    pub fn labels(&self) -> Vec<Intent> {
        self.rules.iter().map(|r| r.intent).collect()
    }

    fn add_keywords(&mut self, intent: Intent, words: &[String]) {
        if intent == Intent::Unknown {
            return;
        }
        let idx = match self.rules.iter().position(|r| r.intent == intent) {
            Some(idx) => idx,
            None => {
                self.rules.push(IntentRule {
                    intent,
                    keywords: Vec::new(),
                });
                self.rules.len() - 1
            }
        };
        let rule = &mut self.rules[idx];
        for word in words {
            let tokens = tokenize(word);
            if !tokens.is_empty() && !rule.keywords.contains(&tokens) {
                rule.keywords.push(tokens);
            }
        }
    }

    pub fn classify(&self, text: &str) -> Intent {
        self.classify_detailed(text).intent
    }

    pub fn classify_detailed(&self, text: &str) -> Classification {
        let tokens = tokenize(text);
        let mut best: Option<(Intent, Vec<String>)> = None;
        for rule in &self.rules {
            let matched: Vec<String> = rule
                .keywords
                .iter()
                .filter(|kw| contains_sequence(&tokens, kw))
                .map(|kw| kw.join(" "))
                .collect();
            if matched.is_empty() {
                continue;
            }
            let better = best
                .as_ref()
                .map(|(_, prev)| matched.len() > prev.len())
                .unwrap_or(true);
            if better {
                best = Some((rule.intent, matched));
            }
        }
        let (intent, matched_keywords) = best.unwrap_or((Intent::Unknown, Vec::new()));
        debug!(%intent, hits = matched_keywords.len(), "classified message");
        Classification {
            intent,
            matched_keywords,
        }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

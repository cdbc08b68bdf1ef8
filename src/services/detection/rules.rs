// Rule Engine
// Deterministic lexicon lookup. The cheapest and most trusted signal:
// a hit is scored at fixed high confidence.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::models::{RulesBreakdown, SignalResult};

/// Confidence assigned when at least one lexicon entry matches.
pub const RULE_HIT_CONFIDENCE: f64 = 0.95;

/// Built-in abuse lexicon. Entries may be single tokens or multi-word
/// phrases; matching is word-bounded on normalized text.
const DEFAULT_LEXICON: &[&str] = &[
    "idiot",
    "stupid",
    "hate",
    "kill",
    "fool",
    "shut up",
    "loser",
    "moron",
    "dumb",
    "pathetic",
    "trash",
    "disgusting",
    "ugly",
    "murder",
    "attack",
    "destroy",
    "beat you",
    "nude",
    "sexy",
    "boob",
    "breast",
];

/// Immutable token/phrase lexicon compiled once at startup and shared
/// read-only across requests.
pub struct RuleLexicon {
    entries: Vec<String>,
    matcher: Regex,
}

impl RuleLexicon {
    pub fn new(entries: Vec<String>) -> Self {
        let entries: Vec<String> = entries
            .into_iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let pattern = format!(
            r"\b(?:{})\b",
            entries
                .iter()
                .map(|e| regex::escape(e))
                .collect::<Vec<_>>()
                .join("|")
        );
        // An empty lexicon compiles to a never-matching pattern.
        let matcher = if entries.is_empty() {
            Regex::new(r"\b\B").expect("empty lexicon regex")
        } else {
            Regex::new(&pattern).expect("lexicon regex")
        };

        Self { entries, matcher }
    }

    pub fn default_lexicon() -> Self {
        Self::new(DEFAULT_LEXICON.iter().map(|s| s.to_string()).collect())
    }

    /// Load a lexicon from a JSON array of strings, falling back to the
    /// built-in list if the file is missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(entries) if !entries.is_empty() => Self::new(entries),
                Ok(_) => {
                    warn!("[RULES] lexicon file {} is empty, using built-in list", path.display());
                    Self::default_lexicon()
                }
                Err(e) => {
                    warn!("[RULES] lexicon parse failed for {}: {}", path.display(), e);
                    Self::default_lexicon()
                }
            },
            Err(e) => {
                warn!("[RULES] lexicon read failed for {}: {}", path.display(), e);
                Self::default_lexicon()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matched entries in order of first occurrence, duplicates removed.
    pub fn find_matches(&self, clean_text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        for m in self.matcher.find_iter(clean_text) {
            let word = m.as_str().to_string();
            if seen.insert(word.clone()) {
                hits.push(word);
            }
        }
        hits
    }
}

/// Evaluate the rule engine against normalized text. Never fails.
pub fn evaluate(lexicon: &RuleLexicon, clean_text: &str) -> (SignalResult, RulesBreakdown) {
    let hits = lexicon.find_matches(clean_text);
    let triggered = !hits.is_empty();
    let confidence = if triggered { RULE_HIT_CONFIDENCE } else { 0.0 };

    let signal = SignalResult {
        toxic: triggered,
        confidence,
        label: None,
        detected_phrases: hits.clone(),
        metadata: Default::default(),
    };

    let breakdown = RulesBreakdown {
        triggered,
        abusive_words: hits,
        confidence,
    };

    (signal, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::text_processor::normalize;

    #[test]
    fn test_hit_confidence_and_order() {
        let lexicon = RuleLexicon::default_lexicon();
        let clean = normalize("You STUPID idiot, so stupid");
        let (signal, breakdown) = evaluate(&lexicon, &clean);

        assert!(signal.toxic);
        assert_eq!(signal.confidence, 0.95);
        // First occurrence order, duplicates removed.
        assert_eq!(breakdown.abusive_words, vec!["stupid", "idiot"]);
    }

    #[test]
    fn test_no_match_is_neutral() {
        let lexicon = RuleLexicon::default_lexicon();
        let (signal, breakdown) = evaluate(&lexicon, "have a wonderful day");
        assert!(!signal.toxic);
        assert_eq!(signal.confidence, 0.0);
        assert!(!breakdown.triggered);
        assert!(breakdown.abusive_words.is_empty());
    }

    #[test]
    fn test_word_boundary_no_substring_hit() {
        let lexicon = RuleLexicon::new(vec!["hit".to_string()]);
        let (signal, _) = evaluate(&lexicon, "the white wall");
        assert!(!signal.toxic);
        let (signal, _) = evaluate(&lexicon, "i will hit back");
        assert!(signal.toxic);
    }

    #[test]
    fn test_multiword_phrase() {
        let lexicon = RuleLexicon::default_lexicon();
        let (_, breakdown) = evaluate(&lexicon, "oh just shut up already");
        assert_eq!(breakdown.abusive_words, vec!["shut up"]);
    }

    #[test]
    fn test_empty_lexicon_never_matches() {
        let lexicon = RuleLexicon::new(vec![]);
        let (signal, _) = evaluate(&lexicon, "idiot");
        assert!(!signal.toxic);
    }
}

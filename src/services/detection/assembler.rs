// Response Assembler
// Final shaping of the verdict payload: word-frequency statistics over the
// detected phrases plus remediation suggestions. Pure and side-effect-free.

use std::collections::HashMap;

use crate::models::{
    round3, LlmBreakdown, MlBreakdown, RulesBreakdown, SentimentResult, Severity, Verdict,
    VerdictSource,
};

use super::suggestions;

/// Occurrence count of each distinct phrase as submitted. No re-scan of the
/// original text happens here.
pub fn word_frequency(abusive_words: &[String]) -> HashMap<String, u32> {
    let mut freq: HashMap<String, u32> = HashMap::new();
    for word in abusive_words {
        *freq.entry(word.clone()).or_insert(0) += 1;
    }
    freq
}

/// Everything the merge step decided, before response shaping.
pub struct VerdictParts {
    pub toxic: bool,
    pub confidence: f64,
    pub severity: Severity,
    pub reason: String,
    pub abusive_words: Vec<String>,
    pub sentiment: Option<SentimentResult>,
    pub source: VerdictSource,
    pub rules: Option<RulesBreakdown>,
    pub ml: Option<MlBreakdown>,
    pub llm: Option<LlmBreakdown>,
}

/// Assemble the final verdict from merged signals.
pub fn build_verdict(parts: VerdictParts) -> Verdict {
    let word_frequency = word_frequency(&parts.abusive_words);
    let suggestions = suggestions::synthesize(&parts.abusive_words);

    Verdict {
        toxic: parts.toxic,
        confidence: round3(parts.confidence),
        severity: parts.severity,
        reason: parts.reason,
        abusive_words: parts.abusive_words,
        word_frequency,
        suggestions,
        sentiment: parts.sentiment,
        source: parts.source,
        rules: parts.rules,
        ml: parts.ml,
        llm: parts.llm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_frequency_multiset() {
        let words = vec![
            "idiot".to_string(),
            "loser".to_string(),
            "idiot".to_string(),
        ];
        let freq = word_frequency(&words);
        assert_eq!(freq["idiot"], 2);
        assert_eq!(freq["loser"], 1);
        assert_eq!(freq.values().sum::<u32>() as usize, words.len());
    }

    #[test]
    fn test_build_verdict_attaches_suggestions() {
        let verdict = build_verdict(VerdictParts {
            toxic: true,
            confidence: 0.9512,
            severity: Severity::High,
            reason: "test".to_string(),
            abusive_words: vec!["idiot".to_string()],
            sentiment: None,
            source: VerdictSource::Rules,
            rules: None,
            ml: None,
            llm: None,
        });

        assert_eq!(verdict.confidence, 0.951);
        assert_eq!(verdict.word_frequency["idiot"], 1);
        assert!(verdict.suggestions.contains_key("idiot"));
    }

    #[test]
    fn test_empty_words_empty_maps() {
        let freq = word_frequency(&[]);
        assert!(freq.is_empty());
    }
}

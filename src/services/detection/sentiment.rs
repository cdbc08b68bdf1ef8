// Sentiment Engine
// Lexicon-based polarity/subjectivity scoring. Auxiliary signal only: it
// never marks text toxic, it just explains tone on the final verdict.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{round3, SentimentLabel, SentimentResult};
use crate::services::text_processor::tokenize;

/// Polarity past this magnitude flips the label away from neutral.
const LABEL_THRESHOLD: f64 = 0.15;

/// Negators flip and dampen the valence of the following word.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "cannot", "can't", "don't", "doesn't", "didn't", "isn't", "wasn't",
    "aren't", "won't",
];

/// (valence, subjectivity) per word.
fn valence_table() -> &'static HashMap<&'static str, (f64, f64)> {
    static TABLE: OnceLock<HashMap<&'static str, (f64, f64)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            // positive
            ("good", (0.7, 0.6)),
            ("great", (0.8, 0.75)),
            ("excellent", (1.0, 1.0)),
            ("wonderful", (1.0, 1.0)),
            ("amazing", (0.6, 0.9)),
            ("love", (0.5, 0.6)),
            ("lovely", (0.75, 0.95)),
            ("beautiful", (0.85, 1.0)),
            ("nice", (0.6, 1.0)),
            ("happy", (0.8, 1.0)),
            ("kind", (0.6, 0.9)),
            ("friendly", (0.4, 0.6)),
            ("respectful", (0.5, 0.5)),
            ("brilliant", (0.9, 0.9)),
            ("helpful", (0.5, 0.5)),
            ("perfect", (1.0, 1.0)),
            ("thanks", (0.4, 0.4)),
            ("thank", (0.4, 0.4)),
            // negative
            ("bad", (-0.7, 0.67)),
            ("terrible", (-1.0, 1.0)),
            ("awful", (-1.0, 1.0)),
            ("horrible", (-1.0, 1.0)),
            ("hate", (-0.8, 0.9)),
            ("stupid", (-0.6, 0.85)),
            ("idiot", (-0.8, 0.9)),
            ("fool", (-0.6, 0.8)),
            ("dumb", (-0.6, 0.8)),
            ("ugly", (-0.7, 1.0)),
            ("disgusting", (-0.9, 1.0)),
            ("worthless", (-0.8, 0.9)),
            ("pathetic", (-0.8, 0.9)),
            ("loser", (-0.7, 0.85)),
            ("trash", (-0.6, 0.8)),
            ("garbage", (-0.6, 0.8)),
            ("annoying", (-0.5, 0.7)),
            ("angry", (-0.6, 0.9)),
            ("sad", (-0.5, 1.0)),
            ("wrong", (-0.5, 0.5)),
            ("worst", (-1.0, 1.0)),
        ])
    })
}

/// Raw (polarity, subjectivity) for normalized text. Words outside the
/// valence table contribute nothing; an all-unknown text scores (0, 0).
pub fn score(clean_text: &str) -> (f64, f64) {
    let tokens = tokenize(clean_text);
    let mut valence_sum = 0.0;
    let mut subjectivity_sum = 0.0;
    let mut scored = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        let Some(&(valence, subjectivity)) = valence_table().get(*token) else {
            continue;
        };
        let negated = i > 0 && NEGATORS.contains(&tokens[i - 1]);
        let valence = if negated { valence * -0.5 } else { valence };
        valence_sum += valence;
        subjectivity_sum += subjectivity;
        scored += 1;
    }

    if scored == 0 {
        return (0.0, 0.0);
    }

    let polarity = (valence_sum / scored as f64).clamp(-1.0, 1.0);
    let subjectivity = (subjectivity_sum / scored as f64).clamp(0.0, 1.0);
    (polarity, subjectivity)
}

/// Evaluate the sentiment engine. Never fails and never decides toxicity.
pub fn evaluate(clean_text: &str) -> SentimentResult {
    let (polarity, subjectivity) = score(clean_text);

    let label = if polarity > LABEL_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity < -LABEL_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    SentimentResult {
        polarity: round3(polarity),
        subjectivity: round3(subjectivity),
        label,
        confidence: round3(polarity.abs().min(1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        let result = evaluate("what a wonderful and lovely day");
        assert_eq!(result.label, SentimentLabel::Positive);
        assert!(result.polarity > 0.15);
        assert!(result.subjectivity > 0.0);
    }

    #[test]
    fn test_negative_text() {
        let result = evaluate("you are a pathetic worthless idiot");
        assert_eq!(result.label, SentimentLabel::Negative);
        assert!(result.polarity < -0.15);
    }

    #[test]
    fn test_unknown_words_are_neutral() {
        let result = evaluate("the quarterly report covers fiscal drift");
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.polarity, 0.0);
        assert_eq!(result.subjectivity, 0.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_negation_flips_valence() {
        let plain = score("good").0;
        let negated = score("not good").0;
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_confidence_is_abs_polarity() {
        let result = evaluate("terrible awful horrible");
        assert_eq!(result.confidence, result.polarity.abs());
        assert!(result.confidence <= 1.0);
    }
}

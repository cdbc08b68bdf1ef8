// Suggestion Engine
// Maps detected offending phrases to remediation text by category lookup.
// Category check order is fixed (sexual -> harassment -> threat -> default)
// because a phrase may match several keyword sets.

use std::collections::HashMap;

const SEXUAL_TERMS: &[&str] = &[
    "boob", "breast", "sex", "nude", "squeeze", "hot", "sexy", "kiss", "bed",
];

const HARASSMENT_TERMS: &[&str] = &[
    "idiot", "stupid", "hate", "kill", "fool", "shut up", "loser",
];

const THREAT_TERMS: &[&str] = &["hit", "beat", "murder", "attack", "destroy"];

const SEXUAL_SUGGESTION: &str =
    "You can express appreciation respectfully without referring to body parts.";
const HARASSMENT_SUGGESTION: &str = "Please express your opinion politely and respectfully.";
const THREAT_SUGGESTION: &str = "Avoid violent language and communicate calmly.";
const DEFAULT_SUGGESTION: &str = "Consider using respectful and neutral language.";

fn suggestion_for(phrase: &str) -> &'static str {
    let p = phrase.to_lowercase();

    if SEXUAL_TERMS.iter().any(|w| p.contains(w)) {
        SEXUAL_SUGGESTION
    } else if HARASSMENT_TERMS.iter().any(|w| p.contains(w)) {
        HARASSMENT_SUGGESTION
    } else if THREAT_TERMS.iter().any(|w| p.contains(w)) {
        THREAT_SUGGESTION
    } else {
        DEFAULT_SUGGESTION
    }
}

/// Build safe replacement suggestions for the detected phrases.
pub fn synthesize(detected_phrases: &[String]) -> HashMap<String, String> {
    detected_phrases
        .iter()
        .map(|phrase| (phrase.clone(), suggestion_for(phrase).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harassment_category() {
        let suggestions = synthesize(&["idiot".to_string()]);
        assert_eq!(suggestions["idiot"], HARASSMENT_SUGGESTION);
    }

    #[test]
    fn test_threat_category() {
        let suggestions = synthesize(&["attack".to_string()]);
        assert_eq!(suggestions["attack"], THREAT_SUGGESTION);
    }

    #[test]
    fn test_default_category() {
        let suggestions = synthesize(&["nonsense".to_string()]);
        assert_eq!(suggestions["nonsense"], DEFAULT_SUGGESTION);
    }

    #[test]
    fn test_category_order_sexual_wins() {
        // "sexy" matches the sexual set, "stupid" the harassment set; the
        // sexual check runs first so a phrase containing both keeps that
        // category.
        let suggestions = synthesize(&["sexy stupid comment".to_string()]);
        assert_eq!(suggestions["sexy stupid comment"], SEXUAL_SUGGESTION);
    }

    #[test]
    fn test_harassment_beats_threat() {
        // "kill" sits in the harassment set even though it reads violent;
        // the harassment check runs before the threat check.
        let suggestions = synthesize(&["kill".to_string()]);
        assert_eq!(suggestions["kill"], HARASSMENT_SUGGESTION);
    }

    #[test]
    fn test_phrase_substring_containment() {
        let suggestions = synthesize(&["you absolute fool".to_string()]);
        assert_eq!(suggestions["you absolute fool"], HARASSMENT_SUGGESTION);
    }
}

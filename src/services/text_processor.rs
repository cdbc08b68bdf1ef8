// Text Processing Service
// Normalization collaborator for the detection engines. Deterministic and
// idempotent: normalize(normalize(x)) == normalize(x).

use regex::Regex;
use std::sync::OnceLock;

fn space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\u{3000}\u{00A0}]").expect("space regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0C\x0B]+").expect("whitespace regex"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9']+").expect("token regex"))
}

/// Normalize a raw submission into the form all engines consume:
/// case-folded, smart punctuation flattened, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text.to_lowercase();

    // Replace smart quotes
    s = s.replace('\u{201c}', "\"")
         .replace('\u{201d}', "\"")
         .replace('\u{2018}', "'")
         .replace('\u{2019}', "'");

    // Replace em dash
    s = s.replace('\u{2014}', "-");

    // Replace ideographic space and non-breaking space
    s = space_re().replace_all(&s, " ").to_string();

    // Normalize line endings
    s = s.replace("\r\n", "\n").replace('\r', "\n");

    // Collapse horizontal whitespace
    s = ws_re().replace_all(&s, " ").to_string();

    // Strip each line
    s = s.lines()
         .map(|ln| ln.trim())
         .collect::<Vec<_>>()
         .join("\n");

    s.trim().to_string()
}

/// Word tokens of normalized text, in order of occurrence.
pub fn tokenize(clean_text: &str) -> Vec<&str> {
    token_re().find_iter(clean_text).map(|m| m.as_str()).collect()
}

/// Empty or whitespace-only input short-circuits the whole pipeline.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_folds_and_collapses() {
        let out = normalize("  You\u{2019}re   an IDIOT\u{2014}really  ");
        assert_eq!(out, "you're an idiot-really");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("Some \u{201c}Quoted\u{201d}\tText\r\nSecond line");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_tokenize_order() {
        let clean = normalize("Shut up, you idiot!");
        let tokens = tokenize(&clean);
        assert_eq!(tokens, vec!["shut", "up", "you", "idiot"]);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \n \t"));
        assert!(!is_blank("x"));
    }
}

// ToxiGuard Data Models
// Request/response contract plus the normalized signal types shared by all
// detection engines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============ Analyze Request ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

// ============ Severity ============

/// Coarse three-tier bucketing of confidence for display purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    /// Pure, monotonic bucketing of a confidence score.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.85 {
            Severity::High
        } else if confidence > 0.6 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn parse(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

// ============ Verdict Source ============

/// Which engine (or combination) produced the final verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerdictSource {
    #[default]
    None,
    Rules,
    #[serde(rename = "rules+ml")]
    RulesMl,
    Ml,
    Sentiment,
    Llm,
    Hybrid,
}

// ============ Signal Result ============

/// Normalized output of one detection engine. Every engine produces this
/// shape; a faulting engine produces `neutral()` instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SignalResult {
    pub toxic: bool,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub detected_phrases: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SignalResult {
    pub fn new(toxic: bool, confidence: f64) -> Self {
        Self {
            toxic,
            confidence: confidence.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// The fail-open value substituted when an engine faults.
    pub fn neutral() -> Self {
        Self::default()
    }
}

// ============ Sentiment ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SentimentResult {
    /// Polarity in [-1, 1]; negative values mean negative tone.
    pub polarity: f64,
    /// Subjectivity in [0, 1]; 0 is fully objective.
    pub subjectivity: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

// ============ Per-Engine Breakdowns ============

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RulesBreakdown {
    pub triggered: bool,
    pub abusive_words: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MlBreakdown {
    /// Arg-max label over the full label set. May be a non-toxic category
    /// even while the toxic-class probability is elevated.
    pub label: String,
    /// Probability of the toxic class specifically, not of the arg-max label.
    pub toxicity_probability: f64,
    #[serde(default)]
    pub all_probabilities: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmBreakdown {
    pub toxic: bool,
    pub severity: Severity,
    pub reason: String,
    pub confidence: f64,
    #[serde(default)]
    pub detected_phrases: Vec<String>,
}

impl LlmBreakdown {
    /// Fail-safe fallback when the upstream judge is unreachable or returned
    /// an unusable payload.
    pub fn unavailable() -> Self {
        Self {
            toxic: false,
            severity: Severity::Low,
            reason: "LLM unavailable".to_string(),
            confidence: 0.0,
            detected_phrases: Vec::new(),
        }
    }

    pub fn to_signal(&self) -> SignalResult {
        let mut signal = SignalResult::new(self.toxic, self.confidence);
        signal.detected_phrases = self.detected_phrases.clone();
        signal
    }
}

// ============ Verdict ============

/// The final decision returned for one text submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub toxic: bool,
    pub confidence: f64,
    pub severity: Severity,
    pub reason: String,
    pub abusive_words: Vec<String>,
    pub word_frequency: HashMap<String, u32>,
    pub suggestions: HashMap<String, String>,
    pub sentiment: Option<SentimentResult>,
    pub source: VerdictSource,
    pub rules: Option<RulesBreakdown>,
    pub ml: Option<MlBreakdown>,
    pub llm: Option<LlmBreakdown>,
}

// ============ Cascade Policy ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStrategy {
    /// Always consult every engine and merge.
    #[default]
    FullEnsemble,
    /// Rules first, classifier second, judge only for the ambiguous rest.
    Cascading,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmInvokeCondition {
    #[default]
    Always,
    OnAmbiguous,
    Never,
}

/// Orchestration policy. Constructed once at startup, immutable thereafter,
/// shared read-only across requests. Threshold values are policy constants,
/// not invariants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadePolicy {
    #[serde(default)]
    pub strategy: CascadeStrategy,
    /// A rule hit alone forces toxic=true regardless of other engines.
    #[serde(default = "default_true")]
    pub rules_hard_override: bool,
    /// Classifier verdict short-circuits the cascade above this probability.
    #[serde(default = "default_ml_confidence")]
    pub ml_confidence_threshold: f64,
    /// Lower band where the classifier still decides without the judge.
    #[serde(default = "default_ml_contextual")]
    pub ml_contextual_threshold: f64,
    #[serde(default)]
    pub llm_invoke_condition: LlmInvokeCondition,
}

impl Default for CascadePolicy {
    fn default() -> Self {
        Self {
            strategy: CascadeStrategy::default(),
            rules_hard_override: true,
            ml_confidence_threshold: default_ml_confidence(),
            ml_contextual_threshold: default_ml_contextual(),
            llm_invoke_condition: LlmInvokeCondition::default(),
        }
    }
}

// ============ Health ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub judge_configured: bool,
}

// ============ Default Value Functions ============

fn default_true() -> bool { true }
fn default_ml_confidence() -> f64 { 0.85 }
fn default_ml_contextual() -> f64 { 0.55 }

/// Round a score to three decimals for the response payload.
pub fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_confidence(0.0), Severity::Low);
        assert_eq!(Severity::from_confidence(0.6), Severity::Low);
        assert_eq!(Severity::from_confidence(0.61), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.85), Severity::Medium);
        assert_eq!(Severity::from_confidence(0.86), Severity::High);
        assert_eq!(Severity::from_confidence(1.0), Severity::High);
    }

    #[test]
    fn test_severity_monotonic_and_idempotent() {
        let mut prev = Severity::Low;
        for i in 0..=100 {
            let c = i as f64 / 100.0;
            let s = Severity::from_confidence(c);
            assert!(s >= prev);
            assert_eq!(s, Severity::from_confidence(c));
            prev = s;
        }
    }

    #[test]
    fn test_signal_confidence_clamped() {
        assert_eq!(SignalResult::new(true, 1.7).confidence, 1.0);
        assert_eq!(SignalResult::new(false, -0.2).confidence, 0.0);
    }

    #[test]
    fn test_neutral_signal() {
        let n = SignalResult::neutral();
        assert!(!n.toxic);
        assert_eq!(n.confidence, 0.0);
        assert!(n.detected_phrases.is_empty());
    }

    #[test]
    fn test_policy_defaults() {
        let policy = CascadePolicy::default();
        assert!(policy.rules_hard_override);
        assert_eq!(policy.ml_confidence_threshold, 0.85);
        assert_eq!(policy.ml_contextual_threshold, 0.55);
        assert_eq!(policy.strategy, CascadeStrategy::FullEnsemble);
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&VerdictSource::RulesMl).unwrap();
        assert_eq!(json, "\"rules+ml\"");
        let json = serde_json::to_string(&VerdictSource::Hybrid).unwrap();
        assert_eq!(json, "\"hybrid\"");
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.9996), 1.0);
    }
}

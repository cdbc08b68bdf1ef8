// Decision Orchestrator
// Sequences the detection engines according to the cascade policy and merges
// their heterogeneous signals into one deterministic, explainable verdict.
// Two strategies: full ensemble (consult everything, merge by max) and
// cascading (cheap engines first, the remote judge only for the ambiguous
// remainder). The cascade trades a small accuracy risk for large latency
// savings; both strategies are selectable and independently testable.

use std::collections::HashSet;
use tracing::debug;

use crate::models::{
    CascadeStrategy, LlmBreakdown, LlmInvokeCondition, SentimentResult, Severity, SignalResult,
    Verdict, VerdictSource,
};
use crate::services::text_processor::{is_blank, normalize};

use super::assembler::{build_verdict, VerdictParts};
use super::registry::AnalyzerRegistry;
use super::{classifier, rules, sentiment};

/// Floor confidence assigned to a cascade verdict decided by a rule hit.
const RULE_VERDICT_FLOOR: f64 = 0.85;

/// Linear progress of one request through the cascade. Transitions never go
/// backwards; `Decided` is always reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CascadeState {
    Idle,
    RuleChecked,
    MlChecked,
    Decided,
}

/// Produce a verdict for one submission. Never fails: engine faults have
/// already been absorbed into neutral signals by the time they reach the
/// merge step.
pub async fn analyze(registry: &AnalyzerRegistry, raw_text: &str) -> Verdict {
    if is_blank(raw_text) {
        return empty_verdict();
    }

    let clean_text = normalize(raw_text);

    // Cheap and purely informational; runs exactly once per request in both
    // strategies and rides along on every verdict.
    let senti = sentiment::evaluate(&clean_text);

    match registry.policy.strategy {
        CascadeStrategy::FullEnsemble => {
            full_ensemble(registry, &clean_text, raw_text, senti).await
        }
        CascadeStrategy::Cascading => cascade(registry, &clean_text, raw_text, senti).await,
    }
}

/// Fixed response for blank input; no engine is consulted.
fn empty_verdict() -> Verdict {
    build_verdict(VerdictParts {
        toxic: false,
        confidence: 0.0,
        severity: Severity::Low,
        reason: "Empty input".to_string(),
        abusive_words: Vec::new(),
        sentiment: None,
        source: VerdictSource::None,
        rules: None,
        ml: None,
        llm: None,
    })
}

/// Consult all engines, merge by max score.
async fn full_ensemble(
    registry: &AnalyzerRegistry,
    clean_text: &str,
    raw_text: &str,
    senti: SentimentResult,
) -> Verdict {
    let (rule_signal, rules_bd) = rules::evaluate(&registry.lexicon, clean_text);
    let (ml_signal, ml_bd) = classifier::evaluate(registry.model.as_ref(), clean_text);

    let llm_bd = match (&registry.judge, registry.policy.llm_invoke_condition) {
        (Some(judge), LlmInvokeCondition::Always | LlmInvokeCondition::OnAmbiguous) => {
            judge.evaluate(raw_text).await
        }
        _ => LlmBreakdown::unavailable(),
    };
    let llm_signal = llm_bd.to_signal();

    let confidence = rule_signal
        .confidence
        .max(ml_signal.confidence)
        .max(llm_signal.confidence);

    let mut toxic = confidence >= 0.5;
    if registry.policy.rules_hard_override && rules_bd.triggered {
        toxic = true;
    }

    let abusive_words = merge_phrases(&rule_signal.detected_phrases, &llm_signal.detected_phrases);

    let reason = format!(
        "Rules: {} | ML prob: {:.2} | LLM: {}",
        rules_bd.triggered, ml_signal.confidence, llm_bd.reason
    );

    build_verdict(VerdictParts {
        toxic,
        confidence,
        severity: Severity::from_confidence(confidence),
        reason,
        abusive_words,
        sentiment: Some(senti),
        source: VerdictSource::Hybrid,
        rules: Some(rules_bd),
        ml: ml_bd,
        llm: Some(llm_bd),
    })
}

/// Fail-fast cascade: rules, then classifier, then the judge only when
/// neither reached a confident verdict.
async fn cascade(
    registry: &AnalyzerRegistry,
    clean_text: &str,
    raw_text: &str,
    senti: SentimentResult,
) -> Verdict {
    let policy = &registry.policy;
    let mut state = CascadeState::Idle;
    debug!(state = ?state, "cascade.start");

    let (_rule_signal, rules_bd) = rules::evaluate(&registry.lexicon, clean_text);
    state = CascadeState::RuleChecked;
    debug!(state = ?state, triggered = rules_bd.triggered, "cascade.rules");

    if rules_bd.triggered {
        // A rule hit is final. When a hit alone is not trusted outright the
        // classifier corroborates the score, but the judge is never consulted
        // past this point.
        let (ml_signal, ml_bd) = if policy.rules_hard_override {
            (SignalResult::neutral(), None)
        } else {
            classifier::evaluate(registry.model.as_ref(), clean_text)
        };

        let confidence = RULE_VERDICT_FLOOR.max(ml_signal.confidence);
        let severity = if confidence > 0.9 {
            Severity::High
        } else {
            Severity::Medium
        };
        let source = if ml_bd.is_some() {
            VerdictSource::RulesMl
        } else {
            VerdictSource::Rules
        };

        state = CascadeState::Decided;
        debug!(state = ?state, source = ?source, confidence, "cascade.decided");

        let abusive_words = rules_bd.abusive_words.clone();
        return build_verdict(VerdictParts {
            toxic: true,
            confidence,
            severity,
            reason: "Matched abusive lexicon entries".to_string(),
            abusive_words,
            sentiment: Some(senti),
            source,
            rules: Some(rules_bd),
            ml: ml_bd,
            llm: None,
        });
    }

    let (ml_signal, ml_bd) = classifier::evaluate(registry.model.as_ref(), clean_text);
    state = CascadeState::MlChecked;
    debug!(state = ?state, "cascade.ml");

    if let Some(ml) = &ml_bd {
        let p = ml_signal.confidence;
        let argmax_toxic = registry
            .model
            .as_ref()
            .map(|m| m.is_toxic_label(&ml.label))
            .unwrap_or(false);

        if p > policy.ml_confidence_threshold && argmax_toxic {
            let severity = if p >= 0.9 { Severity::High } else { Severity::Medium };
            state = CascadeState::Decided;
            debug!(state = ?state, source = ?VerdictSource::Ml, confidence = p, "cascade.decided");
            return build_verdict(VerdictParts {
                toxic: true,
                confidence: p,
                severity,
                reason: format!("ML verdict: label={} probability={:.2}", ml.label, p),
                abusive_words: Vec::new(),
                sentiment: Some(senti),
                source: VerdictSource::Ml,
                rules: Some(rules_bd),
                ml: ml_bd.clone(),
                llm: None,
            });
        }

        if p > policy.ml_contextual_threshold {
            let severity = if p < 0.8 { Severity::Medium } else { Severity::High };
            state = CascadeState::Decided;
            debug!(state = ?state, source = ?VerdictSource::Ml, confidence = p, "cascade.decided");
            return build_verdict(VerdictParts {
                toxic: p >= 0.5,
                confidence: p,
                severity,
                reason: format!("ML contextual verdict: label={} probability={:.2}", ml.label, p),
                abusive_words: Vec::new(),
                sentiment: Some(senti),
                source: VerdictSource::Ml,
                rules: Some(rules_bd),
                ml: ml_bd.clone(),
                llm: None,
            });
        }
    }

    // Ambiguous remainder: only now is the slow remote judge worth its
    // latency. Its verdict is taken verbatim.
    if policy.llm_invoke_condition != LlmInvokeCondition::Never {
        if let Some(judge) = &registry.judge {
            let llm_bd = judge.evaluate(raw_text).await;
            let confidence = llm_bd.confidence;
            state = CascadeState::Decided;
            debug!(state = ?state, source = ?VerdictSource::Llm, confidence, "cascade.decided");
            return build_verdict(VerdictParts {
                toxic: confidence >= 0.5,
                confidence,
                severity: llm_bd.severity,
                reason: llm_bd.reason.clone(),
                abusive_words: llm_bd.detected_phrases.clone(),
                sentiment: Some(senti),
                source: VerdictSource::Llm,
                rules: Some(rules_bd),
                ml: ml_bd,
                llm: Some(llm_bd),
            });
        }
    }

    // No judge available (or policy forbids it): resolve from what the local
    // engines produced.
    let confidence = ml_signal.confidence;
    let source = if ml_bd.is_some() {
        VerdictSource::Ml
    } else {
        VerdictSource::Hybrid
    };
    state = CascadeState::Decided;
    debug!(state = ?state, source = ?source, confidence, "cascade.decided");

    build_verdict(VerdictParts {
        toxic: confidence >= 0.5,
        confidence,
        severity: Severity::from_confidence(confidence),
        reason: "No confident verdict from local engines".to_string(),
        abusive_words: Vec::new(),
        sentiment: Some(senti),
        source,
        rules: Some(rules_bd),
        ml: ml_bd,
        llm: None,
    })
}

/// Union of rule and judge phrases, first occurrence kept, duplicates
/// removed.
fn merge_phrases(rule_phrases: &[String], llm_phrases: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for phrase in rule_phrases.iter().chain(llm_phrases.iter()) {
        if seen.insert(phrase.clone()) {
            merged.push(phrase.clone());
        }
    }
    merged
}

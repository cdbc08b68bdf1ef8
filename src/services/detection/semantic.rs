// LLM Engine
// Remote semantic judge: strict JSON-shaped moderation verdict from an
// upstream reasoning model. Slowest and least deterministic engine, so the
// cascade policy gates it and every fault degrades to the neutral result.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::models::{LlmBreakdown, Severity};
use crate::services::providers::CompletionTransport;

fn build_prompt(text: &str) -> String {
    format!(
        r#"You are a strict content moderation system.

Analyze the text below and respond ONLY with valid JSON:

{{
  "toxic": true or false,
  "severity": "low" or "medium" or "high",
  "reason": "short explanation",
  "confidence": number between 0 and 1,
  "detected_phrases": ["exact offending phrases from the text"]
}}

Text:
{}"#,
        text
    )
}

/// Raw upstream payload. Every field defaults so a sparse response still
/// parses.
#[derive(Debug, serde::Deserialize, Default)]
struct JudgePayload {
    #[serde(default)]
    toxic: bool,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    detected_phrases: Vec<String>,
}

pub struct SemanticJudge {
    transport: Arc<dyn CompletionTransport>,
    timeout: Duration,
}

impl SemanticJudge {
    pub fn new(transport: Arc<dyn CompletionTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Ask the upstream judge about one submission. Never fails: transport
    /// errors, timeouts and unparseable payloads all come back as the
    /// unavailable fallback.
    pub async fn evaluate(&self, raw_text: &str) -> LlmBreakdown {
        let prompt = build_prompt(raw_text);

        let content = match tokio::time::timeout(self.timeout, self.transport.complete(&prompt)).await
        {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                warn!("[SEMANTIC] judge call failed: {}", e);
                return LlmBreakdown::unavailable();
            }
            Err(_) => {
                warn!("[SEMANTIC] judge call timed out after {:?}", self.timeout);
                return LlmBreakdown::unavailable();
            }
        };

        match parse_judgment(&content) {
            Some(judgment) => judgment,
            None => {
                warn!("[SEMANTIC] unparseable judge payload: {}", preview(&content));
                LlmBreakdown::unavailable()
            }
        }
    }
}

fn preview(s: &str) -> String {
    let mut out: String = s.chars().take(120).collect();
    if s.chars().count() > 120 {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Parse the judge response, tolerating prose around the JSON object.
fn parse_judgment(content: &str) -> Option<LlmBreakdown> {
    let content = content.trim();

    let payload: JudgePayload = match serde_json::from_str(content) {
        Ok(p) => p,
        Err(_) => {
            let span = first_json_object(content)?;
            serde_json::from_str(span).ok()?
        }
    };

    let reason = if payload.reason.trim().is_empty() {
        "Unspecified".to_string()
    } else {
        payload.reason
    };

    Some(LlmBreakdown {
        toxic: payload.toxic,
        severity: Severity::parse(&payload.severity),
        reason,
        confidence: payload.confidence.clamp(0.0, 1.0),
        detected_phrases: payload.detected_phrases,
    })
}

/// First balanced-brace span in the content, string- and escape-aware.
fn first_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{BoxFuture, ProviderError};

    struct FixedTransport(String);

    impl CompletionTransport for FixedTransport {
        fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
            let body = self.0.clone();
            Box::pin(async move { Ok(body) })
        }
    }

    struct FailingTransport;

    impl CompletionTransport for FailingTransport {
        fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
            Box::pin(async move { Err(ProviderError::MissingContent) })
        }
    }

    fn judge(transport: impl CompletionTransport + 'static) -> SemanticJudge {
        SemanticJudge::new(Arc::new(transport), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_direct_json_payload() {
        let body = r#"{"toxic": true, "severity": "high", "reason": "direct insult", "confidence": 0.92, "detected_phrases": ["idiot"]}"#;
        let result = judge(FixedTransport(body.to_string())).evaluate("you idiot").await;
        assert!(result.toxic);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.reason, "direct insult");
        assert_eq!(result.detected_phrases, vec!["idiot"]);
    }

    #[tokio::test]
    async fn test_prose_wrapped_payload() {
        let body = "Sure, here is my analysis:\n```json\n{\"toxic\": true, \"severity\": \"medium\", \"reason\": \"hostile tone\", \"confidence\": 0.7}\n```\nLet me know if you need more.";
        let result = judge(FixedTransport(body.to_string())).evaluate("whatever").await;
        assert!(result.toxic);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_neutral() {
        let result = judge(FixedTransport("no json here at all".to_string()))
            .evaluate("whatever")
            .await;
        assert_eq!(result, LlmBreakdown::unavailable());
    }

    #[tokio::test]
    async fn test_transport_error_is_neutral() {
        let result = judge(FailingTransport).evaluate("whatever").await;
        assert_eq!(result, LlmBreakdown::unavailable());
        assert_eq!(result.confidence, 0.0);
        assert!(!result.toxic);
    }

    #[test]
    fn test_first_json_object_nested_and_string_braces() {
        let content = r#"prefix {"a": {"b": "with } brace"}, "c": 1} suffix"#;
        let span = first_json_object(content).unwrap();
        assert_eq!(span, r#"{"a": {"b": "with } brace"}, "c": 1}"#);
    }

    #[test]
    fn test_confidence_clamped_and_reason_defaulted() {
        let parsed = parse_judgment(r#"{"toxic": false, "confidence": 3.5}"#).unwrap();
        assert_eq!(parsed.confidence, 1.0);
        assert_eq!(parsed.reason, "Unspecified");
        assert_eq!(parsed.severity, Severity::Low);
    }
}

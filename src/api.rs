// API Layer
// The operation contract consumed by whatever serving boundary sits on top.
// Analysis never fails: the pipeline degrades to a best-effort verdict as
// engines drop out.

use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::models::{AnalyzeRequest, HealthStatus, Verdict};
use crate::services::detection::{orchestrator, AnalyzerRegistry};

/// Analyze one text submission and return the merged verdict.
pub async fn analyze_text(registry: &AnalyzerRegistry, request: AnalyzeRequest) -> Verdict {
    let request_id = Uuid::new_v4();
    let started = Instant::now();

    let verdict = orchestrator::analyze(registry, &request.text).await;

    info!(
        request_id = %request_id,
        elapsed_ms = started.elapsed().as_millis() as i64,
        toxic = verdict.toxic,
        confidence = verdict.confidence,
        severity = ?verdict.severity,
        source = ?verdict.source,
        "analyze.complete"
    );

    verdict
}

/// Liveness and collaborator status.
pub fn health(registry: &AnalyzerRegistry) -> HealthStatus {
    HealthStatus {
        status: "ToxiGuard API running".to_string(),
        model_loaded: registry.model_loaded(),
        judge_configured: registry.judge_configured(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CascadePolicy, VerdictSource};

    #[tokio::test]
    async fn test_analyze_text_is_total() {
        let registry = AnalyzerRegistry::local_only(CascadePolicy::default());
        let verdict = analyze_text(
            &registry,
            AnalyzeRequest {
                text: "you idiot".to_string(),
            },
        )
        .await;
        assert!(verdict.toxic);
        assert_eq!(verdict.source, VerdictSource::Hybrid);
    }

    #[test]
    fn test_health_reports_collaborators() {
        let registry = AnalyzerRegistry::local_only(CascadePolicy::default());
        let status = health(&registry);
        assert_eq!(status.status, "ToxiGuard API running");
        assert!(!status.model_loaded);
        assert!(!status.judge_configured);
    }
}

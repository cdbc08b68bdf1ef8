// Analyzer Registry
// The immutable process-wide handle set: lexicon, classifier artifact,
// semantic judge and cascade policy. Built once at startup and passed by
// reference into the orchestrator; concurrent reads need no locking.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::CascadePolicy;
use crate::services::config_store::AppConfig;
use crate::services::providers::{get_api_key, ProviderClient};

use super::classifier::ToxicityModel;
use super::rules::RuleLexicon;
use super::semantic::SemanticJudge;

pub struct AnalyzerRegistry {
    pub lexicon: RuleLexicon,
    pub model: Option<ToxicityModel>,
    pub judge: Option<SemanticJudge>,
    pub policy: CascadePolicy,
}

impl AnalyzerRegistry {
    /// Resolve every handle from configuration. Missing or broken
    /// collaborators degrade to `None`; the pipeline fails open around them.
    pub fn from_config(config: &AppConfig) -> Self {
        let lexicon = match &config.lexicon_path {
            Some(path) => RuleLexicon::load_or_default(path),
            None => RuleLexicon::default_lexicon(),
        };
        info!("[REGISTRY] rule lexicon ready: {} entries", lexicon.len());

        let model = match &config.model_path {
            Some(path) => match ToxicityModel::load(path) {
                Ok(model) => {
                    info!(
                        "[REGISTRY] classifier loaded from {} ({} labels)",
                        path.display(),
                        model.labels().len()
                    );
                    Some(model)
                }
                Err(e) => {
                    warn!("[REGISTRY] classifier load failed: {}", e);
                    None
                }
            },
            None => None,
        };

        let judge = match get_api_key("openrouter") {
            Some(key) => {
                let transport = Arc::new(ProviderClient::new(&config.judge, key));
                info!("[REGISTRY] semantic judge ready, model={}", transport.model());
                Some(SemanticJudge::new(
                    transport,
                    Duration::from_secs(config.judge.timeout_secs.max(1)),
                ))
            }
            None => {
                warn!("[REGISTRY] no judge API key configured, LLM engine disabled");
                None
            }
        };

        Self {
            lexicon,
            model,
            judge,
            policy: config.policy.clone(),
        }
    }

    /// Registry with only the local engines, no network collaborator.
    pub fn local_only(policy: CascadePolicy) -> Self {
        Self {
            lexicon: RuleLexicon::default_lexicon(),
            model: None,
            judge: None,
            policy,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn judge_configured(&self) -> bool {
        self.judge.is_some()
    }
}

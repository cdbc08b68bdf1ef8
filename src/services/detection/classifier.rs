// ML Engine
// Linear bag-of-words classifier over a trained artifact. Training happens
// elsewhere; this module only loads the exported weights and scores text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::models::{round3, MlBreakdown, SignalResult};
use crate::services::text_processor::tokenize;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Serialized form of the trained classifier: per-label bias plus per-token
/// per-label log-weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub labels: Vec<String>,
    pub bias: Vec<f64>,
    pub vocabulary: HashMap<String, Vec<f64>>,
    /// Labels counted as toxic when they win the arg-max.
    #[serde(default = "default_toxic_labels")]
    pub toxic_labels: Vec<String>,
}

fn default_toxic_labels() -> Vec<String> {
    vec!["toxic".to_string()]
}

/// Immutable classifier handle loaded once at startup.
pub struct ToxicityModel {
    artifact: ModelArtifact,
}

impl ToxicityModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&content)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        if artifact.labels.is_empty() {
            return Err(ModelError::Invalid("empty label set".to_string()));
        }
        if artifact.bias.len() != artifact.labels.len() {
            return Err(ModelError::Invalid(format!(
                "bias length {} does not match {} labels",
                artifact.bias.len(),
                artifact.labels.len()
            )));
        }
        if artifact.vocabulary.is_empty() {
            return Err(ModelError::Invalid("empty vocabulary".to_string()));
        }
        for (token, weights) in &artifact.vocabulary {
            if weights.len() != artifact.labels.len() {
                return Err(ModelError::Invalid(format!(
                    "token {:?} has {} weights for {} labels",
                    token,
                    weights.len(),
                    artifact.labels.len()
                )));
            }
        }
        Ok(Self { artifact })
    }

    pub fn labels(&self) -> &[String] {
        &self.artifact.labels
    }

    /// Map a class index back to its label.
    pub fn inverse_transform(&self, index: usize) -> &str {
        &self.artifact.labels[index]
    }

    pub fn is_toxic_label(&self, label: &str) -> bool {
        self.artifact.toxic_labels.iter().any(|l| l == label)
    }

    /// Probability distribution over the label set for one normalized text.
    pub fn predict_proba(&self, clean_text: &str) -> Vec<f64> {
        let mut scores = self.artifact.bias.clone();
        for token in tokenize(clean_text) {
            if let Some(weights) = self.artifact.vocabulary.get(token) {
                for (s, w) in scores.iter_mut().zip(weights.iter()) {
                    *s += w;
                }
            }
        }
        softmax(&scores)
    }

    /// Probability of the literal "toxic" label when the label set has one,
    /// otherwise the maximum class probability.
    pub fn toxic_probability(&self, probs: &[f64]) -> f64 {
        self.artifact
            .labels
            .iter()
            .position(|l| l == "toxic")
            .map(|i| probs[i])
            .unwrap_or_else(|| probs.iter().cloned().fold(0.0, f64::max))
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum.max(1e-12)).collect()
}

/// Evaluate the ML engine. An absent or faulted model degrades to the
/// neutral signal; the fault stays inside this boundary.
pub fn evaluate(
    model: Option<&ToxicityModel>,
    clean_text: &str,
) -> (SignalResult, Option<MlBreakdown>) {
    let Some(model) = model else {
        return (SignalResult::neutral(), None);
    };

    let probs = model.predict_proba(clean_text);
    let Some(argmax) = probs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
    else {
        warn!("[CLASSIFIER] empty probability vector, falling back to neutral");
        return (SignalResult::neutral(), None);
    };

    let label = model.inverse_transform(argmax).to_string();
    let toxic_probability = model.toxic_probability(&probs);

    let all_probabilities: HashMap<String, f64> = model
        .labels()
        .iter()
        .zip(probs.iter())
        .map(|(l, p)| (l.clone(), round3(*p)))
        .collect();

    let signal = SignalResult {
        toxic: toxic_probability >= 0.5,
        confidence: toxic_probability.clamp(0.0, 1.0),
        label: Some(label.clone()),
        detected_phrases: Vec::new(),
        metadata: Default::default(),
    };

    let breakdown = MlBreakdown {
        label,
        toxicity_probability: round3(toxic_probability),
        all_probabilities,
    };

    (signal, Some(breakdown))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Two-label model where abusive tokens push hard toward "toxic".
    pub fn tiny_model() -> ToxicityModel {
        let mut vocabulary = HashMap::new();
        vocabulary.insert("garbage".to_string(), vec![-2.0, 2.0]);
        vocabulary.insert("worthless".to_string(), vec![-2.5, 2.5]);
        vocabulary.insert("lovely".to_string(), vec![2.0, -2.0]);
        ToxicityModel::from_artifact(ModelArtifact {
            labels: vec!["clean".to_string(), "toxic".to_string()],
            bias: vec![0.5, -0.5],
            vocabulary,
            toxic_labels: vec!["toxic".to_string()],
        })
        .expect("tiny model")
    }

    /// Model without a literal "toxic" label, for the fallback path.
    pub fn unlabeled_model() -> ToxicityModel {
        let mut vocabulary = HashMap::new();
        vocabulary.insert("garbage".to_string(), vec![-1.0, 3.0]);
        ToxicityModel::from_artifact(ModelArtifact {
            labels: vec!["neutral".to_string(), "abusive".to_string()],
            bias: vec![0.0, 0.0],
            vocabulary,
            toxic_labels: vec!["abusive".to_string()],
        })
        .expect("unlabeled model")
    }
}

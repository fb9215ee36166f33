// src/services/gate.rs

use affect::types::{ClassificationResult, Emotion};
use thiserror::Error;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("confidence threshold must be within [0, 1], got {0}")]
pub struct InvalidThreshold(pub f64);

/// Demotes low-confidence predictions to neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// What callers see.
    pub result: ClassificationResult,
    /// The model's own top label, before gating.
    pub model_emotion: Emotion,
    pub demoted: bool,
}

impl ConfidenceGate {
    pub fn new(threshold: f64) -> Result<Self, InvalidThreshold> {
        if (0.0..=1.0).contains(&threshold) {
            Ok(Self { threshold })
        } else {
            Err(InvalidThreshold(threshold))
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Label becomes neutral when `confidence < threshold`. Confidence and
    /// top3 are kept as the model reported them.
    pub fn apply(&self, result: ClassificationResult) -> GateOutcome {
        let model_emotion = result.emotion;
        let demoted = result.confidence < self.threshold && model_emotion != Emotion::Neutral;
        let result = if result.confidence < self.threshold {
            ClassificationResult {
                emotion: Emotion::Neutral,
                ..result
            }
        } else {
            result
        };
        GateOutcome {
            result,
            model_emotion,
            demoted,
        }
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

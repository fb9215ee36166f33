// src/services/classifier.rs
//! Emotion classifier service.
//!
//! - Loads model, tokenizer and label encoder lazily, at most once per instance.
//! - A failed load is not remembered: the next call tries again and fails again
//!   until the artifacts are fixed.
//! - Empty text never touches the model.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use affect::types::{round4, ClassificationResult, Emotion, RankedLabels};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::services::onnx::OnnxBackend;

/// Number of ranked labels reported with every prediction.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Tokenizer,
    LabelEncoder,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Tokenizer => "tokenizer",
            ArtifactKind::LabelEncoder => "label encoder",
        })
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("{kind} not found at {}", path.display())]
    MissingArtifact { kind: ArtifactKind, path: PathBuf },
    #[error("failed to load {kind}: {message}")]
    Load { kind: ArtifactKind, message: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced {logits} logits but the label encoder has {classes} classes")]
    ShapeMismatch { logits: usize, classes: usize },
}

// ----------------- Backend seam -----------------

/// Produces raw logits for one normalized text.
pub trait InferenceBackend: Send + Sync {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;

    /// Where inference runs, for logging.
    fn device(&self) -> &str {
        "cpu"
    }
}

/// Class names in model output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<Emotion>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<Emotion>) -> Result<Self, ClassifierError> {
        let invalid = |message: String| ClassifierError::Load {
            kind: ArtifactKind::LabelEncoder,
            message,
        };
        if classes.is_empty() {
            return Err(invalid("no classes".to_string()));
        }
        for (i, c) in classes.iter().enumerate() {
            if classes[..i].contains(c) {
                return Err(invalid(format!("duplicate class {c}")));
            }
        }
        Ok(Self { classes })
    }

    /// Read a JSON array of class names, e.g. `["affection", "anger_disgust", ...]`.
    pub fn from_file(path: &Path) -> Result<Self, ClassifierError> {
        require(ArtifactKind::LabelEncoder, path)?;
        let invalid = |message: String| ClassifierError::Load {
            kind: ArtifactKind::LabelEncoder,
            message: format!("{}: {message}", path.display()),
        };
        let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let names: Vec<String> = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        let classes = names
            .iter()
            .map(|n| n.parse::<Emotion>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.to_string()))?;
        Self::new(classes)
    }

    pub fn classes(&self) -> &[Emotion] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Everything a prediction needs once loading has succeeded.
pub struct LoadedModel {
    pub backend: Box<dyn InferenceBackend>,
    pub labels: LabelEncoder,
}

type Loader = Box<dyn Fn() -> Result<LoadedModel, ClassifierError> + Send + Sync>;

// ----------------- Classifier -----------------

pub struct EmotionClassifier {
    loader: Loader,
    state: OnceCell<LoadedModel>,
}

impl fmt::Debug for EmotionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionClassifier")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl EmotionClassifier {
    /// ONNX model + HF tokenizer + JSON label encoder described by `cfg`.
    pub fn from_config(cfg: &ModelConfig) -> Self {
        let cfg = cfg.clone();
        Self::with_loader(move || load_artifacts(&cfg))
    }

    /// Custom loader, called on first use (and again after a failure).
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<LoadedModel, ClassifierError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            state: OnceCell::new(),
        }
    }

    /// Load eagerly so missing artifacts surface at startup.
    pub fn warm_up(&self) -> Result<(), ClassifierError> {
        self.model().map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.state.get().is_some()
    }

    /// Label encoder classes, once loaded.
    pub fn classes(&self) -> Option<&[Emotion]> {
        self.state.get().map(|m| m.labels.classes())
    }

    /// Classify already-normalized text. The confidence gate is not applied.
    pub fn predict(&self, normalized: &str) -> Result<ClassificationResult, ClassifierError> {
        if normalized.trim().is_empty() {
            return Ok(ClassificationResult::neutral_fallback());
        }
        let model = self.model()?;
        let logits = model.backend.logits(normalized)?;
        let result = rank(model.labels.classes(), &logits)?;
        debug!(
            emotion = %result.emotion,
            confidence = result.confidence,
            "classified entry"
        );
        Ok(result)
    }

    fn model(&self) -> Result<&LoadedModel, ClassifierError> {
        self.state.get_or_try_init(|| {
            let model = (self.loader)()?;
            info!(
                device = model.backend.device(),
                classes = ?model.labels.classes(),
                "emotion model loaded"
            );
            Ok(model)
        })
    }
}

/// Softmax over `logits`, argmax (first index on ties) and the top
/// [`TOP_K`] labels ranked by probability, stable on encoder order.
pub fn rank(classes: &[Emotion], logits: &[f32]) -> Result<ClassificationResult, ClassifierError> {
    if logits.len() != classes.len() {
        return Err(ClassifierError::ShapeMismatch {
            logits: logits.len(),
            classes: classes.len(),
        });
    }
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(ClassifierError::Inference("non-finite logits".to_string()));
    }

    let probs = softmax(logits);

    let mut best = 0;
    for (i, p) in probs.iter().enumerate() {
        if *p > probs[best] {
            best = i;
        }
    }

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|a, b| probs[*b].total_cmp(&probs[*a]));
    let top = order
        .into_iter()
        .take(TOP_K)
        .map(|i| (classes[i], round4(probs[i])))
        .collect();

    Ok(ClassificationResult {
        emotion: classes[best],
        confidence: round4(probs[best]),
        top3: RankedLabels::new(top),
    })
}

fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|l| f64::from(*l))
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (f64::from(*l) - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

// ----------------- Artifacts -----------------

fn require(kind: ArtifactKind, path: &Path) -> Result<(), ClassifierError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ClassifierError::MissingArtifact {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Check every artifact exists before loading any of them.
fn load_artifacts(cfg: &ModelConfig) -> Result<LoadedModel, ClassifierError> {
    let model_path = cfg.model_path();
    let tokenizer_path = cfg.tokenizer_path();
    require(ArtifactKind::Model, &model_path)?;
    require(ArtifactKind::Tokenizer, &tokenizer_path)?;
    require(ArtifactKind::LabelEncoder, &cfg.label_encoder)?;

    let labels = LabelEncoder::from_file(&cfg.label_encoder)?;
    let backend = OnnxBackend::load(&model_path, &tokenizer_path, cfg.max_seq_len, cfg.intra_threads)?;
    Ok(LoadedModel {
        backend: Box::new(backend),
        labels,
    })
}

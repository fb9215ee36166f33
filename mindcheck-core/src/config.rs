use anyhow::{anyhow, bail, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_ROOT: &str = "MIND_CHECK_ROOT";
pub const ENV_MODEL_DIR: &str = "MIND_CHECK_MODEL_DIR";
pub const ENV_LE_PATH: &str = "MIND_CHECK_LE_PATH";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "MIND_CHECK_CONFIDENCE_THRESHOLD";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

impl CoreConfig {
    /// Load `<root>/config.toml` (defaults when absent), resolve relative paths
    /// against `root`, then apply `MIND_CHECK_*` environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_with(root, |key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::load`] with an explicit override source.
    pub fn load_with<F>(root: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = root.join("config.toml");
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<CoreConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            tracing::info!(
                "No config file found at {}. Using CoreConfig::default().",
                path.display()
            );
            CoreConfig::default()
        };
        cfg.resolve_paths(root);
        cfg.apply_overrides(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.model.dir = absolutize(root, &self.model.dir);
        self.model.label_encoder = absolutize(root, &self.model.label_encoder);
        self.store.db_path = absolutize(root, &self.store.db_path);
        self.logbook.path = absolutize(root, &self.logbook.path);
    }

    /// Environment paths are taken as given (relative to the working directory).
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_MODEL_DIR).filter(|v| !v.trim().is_empty()) {
            self.model.dir = PathBuf::from(dir);
        }
        if let Some(le) = lookup(ENV_LE_PATH).filter(|v| !v.trim().is_empty()) {
            self.model.label_encoder = PathBuf::from(le);
        }
        if let Some(raw) = lookup(ENV_CONFIDENCE_THRESHOLD).filter(|v| !v.trim().is_empty()) {
            self.model.confidence_threshold = raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("{ENV_CONFIDENCE_THRESHOLD}={raw:?} is not a number"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.model.confidence_threshold;
        if !(0.0..=1.0).contains(&t) {
            bail!("model.confidence_threshold must be within [0, 1], got {t}");
        }
        if self.model.max_seq_len == 0 {
            bail!("model.max_seq_len must be positive");
        }
        if self.model.intra_threads == 0 {
            bail!("model.intra_threads must be at least 1");
        }
        self.insights.offset()?;
        Ok(())
    }
}

/// Root directory for config, journal and logbook. `MIND_CHECK_ROOT` wins,
/// otherwise `.mindcheck` in the working directory.
pub fn mindcheck_root() -> PathBuf {
    std::env::var_os(ENV_ROOT)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".mindcheck"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`.
    #[serde(default = "ModelConfig::default_dir")]
    pub dir: PathBuf,
    /// JSON array of class names in model output order.
    #[serde(default = "ModelConfig::default_label_encoder")]
    pub label_encoder: PathBuf,
    #[serde(default = "ModelConfig::default_max_seq_len")]
    pub max_seq_len: usize,
    #[serde(default = "ModelConfig::default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "ModelConfig::default_model_version")]
    pub model_version: String,
    #[serde(default = "ModelConfig::default_intra_threads")]
    pub intra_threads: usize,
}

impl ModelConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("model")
    }

    fn default_label_encoder() -> PathBuf {
        PathBuf::from("label_encoder.json")
    }

    fn default_max_seq_len() -> usize {
        128
    }

    fn default_confidence_threshold() -> f64 {
        0.45
    }

    fn default_model_version() -> String {
        "roberta-v1".to_string()
    }

    fn default_intra_threads() -> usize {
        1
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            label_encoder: Self::default_label_encoder(),
            max_seq_len: Self::default_max_seq_len(),
            confidence_threshold: Self::default_confidence_threshold(),
            model_version: Self::default_model_version(),
            intra_threads: Self::default_intra_threads(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_db_path")]
    pub db_path: PathBuf,
}

impl StoreConfig {
    fn default_db_path() -> PathBuf {
        PathBuf::from("journal.db")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: Self::default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
    #[serde(default = "LogbookConfig::default_enabled")]
    pub enabled: bool,
}

impl LogbookConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("logbook/classifications.jsonl")
    }

    fn default_enabled() -> bool {
        true
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsConfig {
    /// Offset from UTC used to bucket entries into calendar days.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl InsightsConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!(
                    "insights.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                )
            })
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}

// mindcheck-core/src/commands/init.rs

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub existed: Vec<String>,
    pub config: CoreConfig,
}

/// Create the root layout and seed a default `config.toml`. Idempotent: files
/// that already exist are left untouched.
pub fn ensure_root(root: &Path) -> Result<InitReport> {
    let mut layout = Layout::new(root);
    layout.dir("")?;
    layout.dir("model")?;
    layout.dir("logbook")?;
    layout.file(Path::new("config.toml"), DEFAULT_CONFIG_TOML)?;

    let config = CoreConfig::load(root)?;
    let init_event = serde_json::json!({
        "ts": Utc::now().to_rfc3339(),
        "event": "system_init",
        "data": { "version": env!("CARGO_PKG_VERSION") }
    });
    layout.file(&config.logbook.path, &format!("{init_event}\n"))?;

    Ok(InitReport {
        root: root.to_path_buf(),
        created: layout.created,
        existed: layout.existed,
        config,
    })
}

/// Tracks what `ensure_root` found and what it had to create, labelled
/// relative to the root (`.` for the root itself).
struct Layout<'a> {
    root: &'a Path,
    created: Vec<String>,
    existed: Vec<String>,
}

impl<'a> Layout<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            created: Vec::new(),
            existed: Vec::new(),
        }
    }

    fn label(&self, path: &Path) -> String {
        match path.strip_prefix(self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    fn dir(&mut self, rel: &str) -> Result<()> {
        let path = self.root.join(rel);
        let label = self.label(&path);
        if path.is_dir() {
            self.existed.push(label);
        } else {
            fs::create_dir_all(&path).with_context(|| format!("creating {}", path.display()))?;
            self.created.push(label);
        }
        Ok(())
    }

    /// `path` is joined onto the root unless already absolute.
    fn file(&mut self, path: &Path, seed: &str) -> Result<()> {
        let path = self.root.join(path);
        let label = self.label(&path);
        if path.exists() {
            self.existed.push(label);
        } else {
            write_atomic(&path, seed.as_bytes())?;
            self.created.push(label);
        }
        Ok(())
    }
}

/// Write a sibling temp file, then rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

// ---------- defaults ----------

const DEFAULT_CONFIG_TOML: &str = r#"[model]
# model.onnx and tokenizer.json live here
dir = "model"
label_encoder = "label_encoder.json"
max_seq_len = 128
confidence_threshold = 0.45
model_version = "roberta-v1"
intra_threads = 1

[store]
db_path = "journal.db"

[logbook]
path = "logbook/classifications.jsonl"
enabled = true

[insights]
utc_offset_minutes = 0
"#;

// src/utils/logbook.rs
use anyhow::{Context, Result};
use affect::report::InsightsView;
use affect::types::{Emotion, RankedLabels};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::LogbookConfig;

/// blake3 hex digest; the logbook never stores journal text itself.
pub fn text_digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationLog<'a> {
    pub subject: Option<&'a str>,
    pub text_digest: String,
    pub model_emotion: Emotion,
    pub emotion: Emotion,
    pub confidence: f64,
    pub top3: &'a RankedLabels,
    pub gated: bool,
    pub model_version: &'a str,
}

/// Append-only JSONL event stream.
#[derive(Debug, Clone)]
pub struct Logbook {
    path: PathBuf,
    enabled: bool,
}

impl Logbook {
    pub fn from_config(cfg: &LogbookConfig) -> Self {
        Self {
            path: cfg.path.clone(),
            enabled: cfg.enabled,
        }
    }

    pub fn record_classification(&self, ts: DateTime<Utc>, log: &ClassificationLog<'_>) -> Result<()> {
        self.emit(ts, "classification", serde_json::to_value(log)?)
    }

    pub fn record_insight_report(&self, ts: DateTime<Utc>, subject: &str, view: &InsightsView) -> Result<()> {
        let data = serde_json::json!({
            "subject": subject,
            "rule": view.rule,
            "total_entries": view.total_entries,
            "dominant_emotion": view.dominant_emotion,
            "positive_ratio": view.positive_ratio,
            "volatility": view.volatility,
            "trend_direction": view.trend_direction,
        });
        self.emit(ts, "insight_report", data)
    }

    pub fn emit(&self, ts: DateTime<Utc>, event: &str, data: Value) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let line = serde_json::json!({
            "ts": ts.to_rfc3339(),
            "event": event,
            "data": data
        });
        let json = serde_json::to_string(&line)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all({:?})", parent))?;
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open logbook {:?}", self.path))?;
        writeln!(f, "{}", json)?;
        Ok(())
    }
}

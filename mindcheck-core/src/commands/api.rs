// src/commands/api.rs
use std::path::Path;
use std::sync::Arc;

use affect::feedback::{entry_feedback, EntryFeedback};
use affect::normalize::normalize;
use affect::report::{build_dashboard, build_insight_report, DashboardView, InsightsView};
use affect::series::{calculate_streak, emotion_counts, local_date, EmotionCount, EmotionSeries};
use affect::types::{ClassificationResult, LabeledEntry};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use tracing::warn;

use crate::commands::init::ensure_root;
use crate::config::CoreConfig;
use crate::services::classifier::EmotionClassifier;
use crate::services::gate::{ConfidenceGate, GateOutcome};
use crate::services::journal::{HistoryFilter, JournalRecord, JournalStore, Order, SqliteJournal};
use crate::utils::logbook::{text_digest, ClassificationLog, Logbook};

/// One classification with everything that went into it.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub normalized: String,
    pub result: ClassificationResult,
    pub gated: bool,
}

/// Entry point for callers: classify text, keep a journal, build reports.
pub struct MindCheck<S: JournalStore = SqliteJournal> {
    config: CoreConfig,
    classifier: Arc<EmotionClassifier>,
    gate: ConfidenceGate,
    store: S,
    logbook: Logbook,
    offset: FixedOffset,
}

impl MindCheck<SqliteJournal> {
    /// Initialize `root` if needed and build the default stack from its config.
    pub fn open_root(root: &Path) -> Result<Self> {
        let report = ensure_root(root)?;
        let classifier = Arc::new(EmotionClassifier::from_config(&report.config.model));
        Self::open(report.config, classifier)
    }

    /// SQLite journal at `config.store.db_path`.
    pub fn open(config: CoreConfig, classifier: Arc<EmotionClassifier>) -> Result<Self> {
        let offset = config.insights.offset()?;
        let store = SqliteJournal::open(&config.store.db_path)?.with_utc_offset(offset);
        Self::with_store(config, classifier, store)
    }
}

impl<S: JournalStore> MindCheck<S> {
    pub fn with_store(config: CoreConfig, classifier: Arc<EmotionClassifier>, store: S) -> Result<Self> {
        let gate = ConfidenceGate::new(config.model.confidence_threshold)?;
        let offset = config.insights.offset()?;
        let logbook = Logbook::from_config(&config.logbook);
        Ok(Self {
            config,
            classifier,
            gate,
            store,
            logbook,
            offset,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Arc<EmotionClassifier> {
        &self.classifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn warm_up(&self) -> Result<()> {
        self.classifier.warm_up()?;
        Ok(())
    }

    /// Normalize, classify and gate `text`.
    pub fn classify(&self, text: &str) -> Result<ClassificationResult> {
        Ok(self.analyze(None, text)?.result)
    }

    pub fn analyze(&self, subject: Option<&str>, text: &str) -> Result<Analysis> {
        let normalized = normalize(text);
        let raw = self.classifier.predict(&normalized)?;
        let GateOutcome {
            result,
            model_emotion,
            demoted,
        } = self.gate.apply(raw);

        let log = ClassificationLog {
            subject,
            text_digest: text_digest(&normalized),
            model_emotion,
            emotion: result.emotion,
            confidence: result.confidence,
            top3: &result.top3,
            gated: demoted,
            model_version: &self.config.model.model_version,
        };
        if let Err(e) = self.logbook.record_classification(Utc::now(), &log) {
            warn!(error = %e, "failed to append classification to logbook");
        }

        Ok(Analysis {
            normalized,
            result,
            gated: demoted,
        })
    }

    /// Classify `text` and store it for `subject`, authored at `at`.
    pub fn record_entry(&self, subject: &str, text: &str, at: DateTime<Utc>) -> Result<JournalRecord> {
        let analysis = self.analyze(Some(subject), text)?;
        let id = self.store.insert(
            subject,
            text,
            at,
            &analysis.result,
            &self.config.model.model_version,
        )?;
        self.store
            .get(subject, id)?
            .ok_or_else(|| anyhow!("journal entry {id} missing right after insert"))
    }

    pub fn delete_entry(&self, subject: &str, id: i64) -> Result<bool> {
        self.store.delete(subject, id)
    }

    /// Newest first.
    pub fn history(&self, subject: &str, filter: &HistoryFilter) -> Result<Vec<JournalRecord>> {
        self.store.search(subject, filter)
    }

    /// Entries from the last `days` days, `[now - days, now)`, oldest first.
    pub fn recent_entries(&self, subject: &str, now: DateTime<Utc>, days: u32) -> Result<Vec<JournalRecord>> {
        self.store
            .entries_between(subject, now - Duration::days(i64::from(days)), now)
    }

    fn labeled_entries(&self, subject: &str) -> Result<Vec<LabeledEntry>> {
        Ok(self
            .store
            .entries(subject, Order::Chronological)?
            .into_iter()
            .map(|r| r.entry)
            .collect())
    }

    pub fn insight_report(&self, subject: &str, now: DateTime<Utc>) -> Result<InsightsView> {
        let view = build_insight_report(&self.labeled_entries(subject)?, now, self.offset);
        if let Err(e) = self.logbook.record_insight_report(Utc::now(), subject, &view) {
            warn!(error = %e, "failed to append insight report to logbook");
        }
        Ok(view)
    }

    pub fn dashboard(&self, subject: &str, now: DateTime<Utc>) -> Result<DashboardView> {
        Ok(build_dashboard(&self.labeled_entries(subject)?, now, self.offset))
    }

    pub fn streak(&self, subject: &str, now: DateTime<Utc>) -> Result<u32> {
        let series = EmotionSeries::new(self.labeled_entries(subject)?);
        Ok(calculate_streak(
            &series.active_dates(self.offset),
            local_date(now, self.offset),
        ))
    }

    pub fn emotion_counts(&self, subject: &str) -> Result<Vec<EmotionCount>> {
        let series = EmotionSeries::new(self.labeled_entries(subject)?);
        Ok(emotion_counts(&series.recent_first_labels()))
    }

    /// Feedback for one stored entry, `None` if it is not `subject`'s.
    pub fn feedback(&self, subject: &str, id: i64) -> Result<Option<EntryFeedback>> {
        Ok(self
            .store
            .get(subject, id)?
            .map(|r| entry_feedback(&r.entry.classification())))
    }
}

// src/services/journal.rs
//! Journal entries per subject, backed by a single SQLite connection (WAL).
//!
//! - Each row stores the text plus the classification fixed at write time.
//! - Every read and delete is scoped to one subject.
//! - Rows that no longer decode (unknown label, bad timestamp) are skipped
//!   with a warning instead of failing the whole read.

use std::path::Path;

use affect::series::local_date;
use affect::types::{ClassificationResult, Emotion, LabeledEntry, RankedLabels};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalRecord {
    pub id: i64,
    pub subject: String,
    pub entry: LabeledEntry,
    pub model_version: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Chronological,
    RecentFirst,
}

/// History search. Empty strings count as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    /// Case-insensitive substring of the entry text.
    pub query: Option<String>,
    /// Emotion label; one that is not recognized matches nothing.
    pub emotion: Option<String>,
    /// Local calendar date `YYYY-MM-DD`; ignored when malformed.
    pub date: Option<String>,
}

pub trait JournalStore {
    fn insert(
        &self,
        subject: &str,
        text: &str,
        created_at: DateTime<Utc>,
        result: &ClassificationResult,
        model_version: &str,
    ) -> Result<i64>;

    /// `false` when no entry with `id` belongs to `subject`.
    fn delete(&self, subject: &str, id: i64) -> Result<bool>;

    fn get(&self, subject: &str, id: i64) -> Result<Option<JournalRecord>>;

    fn entries(&self, subject: &str, order: Order) -> Result<Vec<JournalRecord>>;

    /// Entries with `start <= created_at < end`, oldest first.
    fn entries_between(
        &self,
        subject: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JournalRecord>>;

    /// Matching entries, newest first.
    fn search(&self, subject: &str, filter: &HistoryFilter) -> Result<Vec<JournalRecord>>;
}

pub struct SqliteJournal {
    db: Connection,
    offset: FixedOffset,
}

const COLUMNS: &str =
    "id, subject, text, emotion, confidence, top_k, model_version, created_at, analyzed_at";

// Fixed width so lexical order is time order.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

struct RawRow {
    id: i64,
    subject: String,
    text: String,
    emotion: String,
    confidence: f64,
    top_k: String,
    model_version: String,
    created_at: String,
    analyzed_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject: row.get(1)?,
            text: row.get(2)?,
            emotion: row.get(3)?,
            confidence: row.get(4)?,
            top_k: row.get(5)?,
            model_version: row.get(6)?,
            created_at: row.get(7)?,
            analyzed_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<JournalRecord> {
        let emotion: Emotion = self.emotion.parse()?;
        let top_k: RankedLabels =
            serde_json::from_str(&self.top_k).context("decoding top_k")?;
        let timestamp = DateTime::parse_from_rfc3339(&self.created_at)
            .context("decoding created_at")?
            .with_timezone(&Utc);
        let analyzed_at = DateTime::parse_from_rfc3339(&self.analyzed_at)
            .context("decoding analyzed_at")?
            .with_timezone(&Utc);
        Ok(JournalRecord {
            id: self.id,
            subject: self.subject,
            entry: LabeledEntry {
                text: self.text,
                emotion,
                confidence: self.confidence,
                top_k,
                timestamp,
            },
            model_version: self.model_version,
            analyzed_at,
        })
    }
}

impl SqliteJournal {
    /// Open/create the database and ensure the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create_dir_all({:?})", parent))?;
        }
        let db = Connection::open(db_path)
            .with_context(|| format!("open sqlite at {:?}", db_path))?;
        Self::init(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS entries (
              id             INTEGER PRIMARY KEY AUTOINCREMENT,
              subject        TEXT NOT NULL,     -- owner of the entry
              text           TEXT NOT NULL,     -- raw journal text as written
              emotion        TEXT NOT NULL,     -- gated label
              confidence     REAL NOT NULL,     -- model's top-class probability
              top_k          TEXT NOT NULL,     -- JSON object, ranked
              model_version  TEXT NOT NULL,
              created_at     TEXT NOT NULL,     -- RFC3339 UTC, microseconds
              analyzed_at    TEXT NOT NULL      -- RFC3339 UTC, microseconds
            );

            CREATE INDEX IF NOT EXISTS idx_entries_subject_created
              ON entries(subject, created_at);
            "#,
        )?;
        Ok(Self {
            db,
            offset: Utc.fix(),
        })
    }

    /// Offset used to match the `date` filter against local calendar days.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<JournalRecord>> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt.query_map(params, RawRow::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            let raw = row?;
            let id = raw.id;
            match raw.decode() {
                Ok(rec) => out.push(rec),
                Err(e) => warn!(id, error = %e, "skipping undecodable journal row"),
            }
        }
        Ok(out)
    }
}

impl JournalStore for SqliteJournal {
    fn insert(
        &self,
        subject: &str,
        text: &str,
        created_at: DateTime<Utc>,
        result: &ClassificationResult,
        model_version: &str,
    ) -> Result<i64> {
        let top_k = serde_json::to_string(&result.top3)?;
        self.db.execute(
            r#"
            INSERT INTO entries(subject, text, emotion, confidence, top_k, model_version, created_at, analyzed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                subject,
                text,
                result.emotion.as_str(),
                result.confidence,
                top_k,
                model_version,
                ts(created_at),
                ts(Utc::now()),
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    fn delete(&self, subject: &str, id: i64) -> Result<bool> {
        let n = self
            .db
            .execute("DELETE FROM entries WHERE id=?1 AND subject=?2", params![id, subject])?;
        Ok(n > 0)
    }

    fn get(&self, subject: &str, id: i64) -> Result<Option<JournalRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM entries WHERE id=?1 AND subject=?2");
        Ok(self.query(&sql, params![id, subject])?.into_iter().next())
    }

    fn entries(&self, subject: &str, order: Order) -> Result<Vec<JournalRecord>> {
        let dir = match order {
            Order::Chronological => "ASC",
            Order::RecentFirst => "DESC",
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM entries WHERE subject=?1 ORDER BY created_at {dir}, id {dir}"
        );
        self.query(&sql, params![subject])
    }

    fn entries_between(
        &self,
        subject: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<JournalRecord>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM entries
             WHERE subject=?1 AND created_at >= ?2 AND created_at < ?3
             ORDER BY created_at ASC, id ASC"
        );
        self.query(&sql, params![subject, ts(start), ts(end)])
    }

    fn search(&self, subject: &str, filter: &HistoryFilter) -> Result<Vec<JournalRecord>> {
        let set = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let emotion = match set(&filter.emotion) {
            Some(label) => match label.parse::<Emotion>() {
                Ok(e) => Some(e),
                Err(_) => return Ok(Vec::new()),
            },
            None => None,
        };

        let date = set(&filter.date).and_then(|d| match NaiveDate::parse_from_str(&d, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(date = %d, "ignoring malformed date filter");
                None
            }
        });

        let query = set(&filter.query).map(|q| q.to_lowercase());

        let mut records = self.entries(subject, Order::RecentFirst)?;
        records.retain(|r| {
            emotion.map_or(true, |e| r.entry.emotion == e)
                && date.map_or(true, |d| local_date(r.entry.timestamp, self.offset) == d)
                && query
                    .as_deref()
                    .map_or(true, |q| r.entry.text.to_lowercase().contains(q))
        });
        Ok(records)
    }
}

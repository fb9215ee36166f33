use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use affect::feedback::entry_feedback;
use affect::normalize::normalize;
use mindcheck_core::commands::ensure_root;
use mindcheck_core::config::mindcheck_root;
use mindcheck_core::services::journal::HistoryFilter;
use mindcheck_core::MindCheck;

#[derive(Parser)]
#[command(
    name = "mindcheck",
    about = "Emotion analytics for journal entries"
)]
struct Cli {
    /// Data root (defaults to $MIND_CHECK_ROOT or .mindcheck)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create the data root and a default config.toml
    Init,
    /// Show the normalized form of a text
    Normalize { text: String },
    /// Classify a text without storing it
    Classify { text: String },
    /// Classify and store a journal entry
    Add {
        #[arg(long)]
        subject: String,
        text: String,
        /// RFC3339 timestamp, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// List a subject's entries, newest first
    History {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        emotion: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Entries from the last N days, oldest first
    Recent {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long)]
        now: Option<String>,
    },
    /// Delete one of a subject's entries
    Delete {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        id: i64,
    },
    /// Full insight report for a subject
    Insights {
        #[arg(long)]
        subject: String,
        /// RFC3339 timestamp used as "now"
        #[arg(long)]
        now: Option<String>,
    },
    /// Totals, positive ratio, streak and counts
    Dashboard {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        now: Option<String>,
    },
    /// Feedback view for one stored entry
    Feedback {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        id: i64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root.unwrap_or_else(mindcheck_root);
    tracing::debug!(root = %root.display(), "using data root");

    match cli.cmd {
        Cmd::Init => {
            let report = ensure_root(&root)?;
            print_json(&json!({
                "root": report.root,
                "created": report.created,
                "existed": report.existed,
            }))
        }
        Cmd::Normalize { text } => print_json(&json!({ "normalized": normalize(&text) })),
        Cmd::Classify { text } => {
            let mc = MindCheck::open_root(&root)?;
            let analysis = mc.analyze(None, &text)?;
            print_json(&json!({
                "emotion": analysis.result.emotion,
                "confidence": analysis.result.confidence,
                "top3": analysis.result.top3,
                "gated": analysis.gated,
                "feedback": entry_feedback(&analysis.result),
            }))
        }
        Cmd::Add { subject, text, at } => {
            let mc = MindCheck::open_root(&root)?;
            let at = parse_ts(at.as_deref())?;
            let record = mc.record_entry(&subject, &text, at)?;
            print_json(&record)
        }
        Cmd::History {
            subject,
            query,
            emotion,
            date,
        } => {
            let mc = MindCheck::open_root(&root)?;
            let filter = HistoryFilter { query, emotion, date };
            print_json(&mc.history(&subject, &filter)?)
        }
        Cmd::Recent { subject, days, now } => {
            let mc = MindCheck::open_root(&root)?;
            print_json(&mc.recent_entries(&subject, parse_ts(now.as_deref())?, days)?)
        }
        Cmd::Delete { subject, id } => {
            let mc = MindCheck::open_root(&root)?;
            let deleted = mc.delete_entry(&subject, id)?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }
        Cmd::Insights { subject, now } => {
            let mc = MindCheck::open_root(&root)?;
            print_json(&mc.insight_report(&subject, parse_ts(now.as_deref())?)?)
        }
        Cmd::Dashboard { subject, now } => {
            let mc = MindCheck::open_root(&root)?;
            print_json(&mc.dashboard(&subject, parse_ts(now.as_deref())?)?)
        }
        Cmd::Feedback { subject, id } => {
            let mc = MindCheck::open_root(&root)?;
            let fb = mc
                .feedback(&subject, id)?
                .with_context(|| format!("no entry {id} for subject {subject:?}"))?;
            print_json(&fb)
        }
    }
}

fn parse_ts(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid RFC3339 timestamp {s:?}"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

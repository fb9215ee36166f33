//! Time-series statistics over one subject's labeled entries.
//!
//! Everything here is a pure function of its inputs. Callers pass `now`/`today`
//! explicitly so reports are reproducible.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::types::{round_to, Emotion, LabeledEntry, TrendDirection};

/// Number of most-recent labels considered by [`detect_trend`].
pub const TREND_WINDOW: usize = 7;
const TREND_UP: f64 = 0.4;
const TREND_DOWN: f64 = -0.4;

// ----------------- Series -----------------

/// One subject's entries. Orderings are views sorted on read; the backing
/// sequence is never reordered.
#[derive(Debug, Clone, Default)]
pub struct EmotionSeries {
    entries: Vec<LabeledEntry>,
}

impl EmotionSeries {
    pub fn new(entries: Vec<LabeledEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabeledEntry] {
        &self.entries
    }

    /// Oldest first.
    pub fn chronological(&self) -> Vec<&LabeledEntry> {
        let mut v: Vec<&LabeledEntry> = self.entries.iter().collect();
        v.sort_by_key(|e| e.timestamp);
        v
    }

    /// Newest first.
    pub fn recent_first(&self) -> Vec<&LabeledEntry> {
        let mut v: Vec<&LabeledEntry> = self.entries.iter().collect();
        v.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        v
    }

    pub fn chronological_labels(&self) -> Vec<Emotion> {
        self.chronological().into_iter().map(|e| e.emotion).collect()
    }

    pub fn recent_first_labels(&self) -> Vec<Emotion> {
        self.recent_first().into_iter().map(|e| e.emotion).collect()
    }

    /// Distinct local calendar days that have at least one entry.
    pub fn active_dates(&self, offset: FixedOffset) -> BTreeSet<NaiveDate> {
        self.entries
            .iter()
            .map(|e| local_date(e.timestamp, offset))
            .collect()
    }

    /// Entries with `start <= timestamp < end`.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&LabeledEntry> {
        self.entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .collect()
    }
}

pub fn local_date(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

// ----------------- Trend / volatility / streak -----------------

/// Direction of the last [`TREND_WINDOW`] labels, most recent first.
pub fn detect_trend(recent_first: &[Emotion]) -> TrendDirection {
    if recent_first.is_empty() {
        return TrendDirection::Stable;
    }
    let window = &recent_first[..recent_first.len().min(TREND_WINDOW)];
    let total: i32 = window.iter().map(|e| i32::from(e.valence())).sum();
    let avg = f64::from(total) / window.len() as f64;

    if avg >= TREND_UP {
        TrendDirection::Upward
    } else if avg <= TREND_DOWN {
        TrendDirection::Downward
    } else {
        TrendDirection::Stable
    }
}

/// Share of adjacent pairs whose labels differ, in `[0, 1]`, 2 decimals.
pub fn calculate_volatility(chronological: &[Emotion]) -> f64 {
    if chronological.len() <= 1 {
        return 0.0;
    }
    let switches = chronological.windows(2).filter(|w| w[0] != w[1]).count();
    round_to(switches as f64 / (chronological.len() - 1) as f64, 2)
}

/// Consecutive journaling days ending today, or yesterday when today is empty.
pub fn calculate_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if dates.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(d) => d,
            None => return 0,
        }
    };

    let mut streak = 0;
    while dates.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

// ----------------- Counts -----------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionCount {
    pub emotion: Emotion,
    pub count: usize,
    pub percent: f64,
}

fn tally(labels: &[Emotion]) -> BTreeMap<Emotion, usize> {
    let mut counts = BTreeMap::new();
    for e in labels {
        *counts.entry(*e).or_insert(0) += 1;
    }
    counts
}

fn percent_of(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, 1)
}

/// Labels present in `labels`, most frequent first (ties in canonical order).
pub fn emotion_counts(labels: &[Emotion]) -> Vec<EmotionCount> {
    let total = labels.len();
    let mut rows: Vec<EmotionCount> = tally(labels)
        .into_iter()
        .map(|(emotion, count)| EmotionCount {
            emotion,
            count,
            percent: percent_of(count, total),
        })
        .collect();
    // BTreeMap yields canonical order; a stable sort keeps it for ties.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Every label in canonical order, zero counts included.
pub fn emotion_distribution(labels: &[Emotion]) -> Vec<EmotionCount> {
    let total = labels.len();
    let counts = tally(labels);
    Emotion::ALL
        .into_iter()
        .map(|emotion| {
            let count = counts.get(&emotion).copied().unwrap_or(0);
            EmotionCount {
                emotion,
                count,
                percent: percent_of(count, total),
            }
        })
        .collect()
}

/// Most frequent label, neutral for an empty history.
pub fn dominant_emotion(labels: &[Emotion]) -> Emotion {
    emotion_counts(labels)
        .first()
        .map(|c| c.emotion)
        .unwrap_or(Emotion::Neutral)
}

/// Percentage (0..=100, 1 decimal) of positive labels.
pub fn positive_ratio(labels: &[Emotion]) -> f64 {
    let positive = labels.iter().filter(|e| e.is_positive()).count();
    percent_of(positive, labels.len())
}

// ----------------- Windows -----------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEmotion {
    pub emotion: Emotion,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub days: i64,
    pub count: usize,
    pub top: Option<TopEmotion>,
}

/// Count and most frequent label over `[now - days, now)`.
pub fn window_summary(series: &EmotionSeries, now: DateTime<Utc>, days: i64) -> WindowSummary {
    let labels: Vec<Emotion> = series
        .between(now - Duration::days(days), now)
        .into_iter()
        .map(|e| e.emotion)
        .collect();
    let top = emotion_counts(&labels).first().map(|c| TopEmotion {
        emotion: c.emotion,
        total: c.count,
    });
    WindowSummary {
        days,
        count: labels.len(),
        top,
    }
}

pub fn weekly_summary(series: &EmotionSeries, now: DateTime<Utc>) -> WindowSummary {
    window_summary(series, now, 7)
}

pub fn monthly_summary(series: &EmotionSeries, now: DateTime<Utc>) -> WindowSummary {
    window_summary(series, now, 30)
}

// ----------------- Trend line -----------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub points: Vec<TrendPoint>,
    pub has_data: bool,
}

/// Mean intensity per local calendar day, oldest day first.
pub fn trend_line(series: &EmotionSeries, offset: FixedOffset) -> TrendLine {
    let mut by_day: BTreeMap<NaiveDate, Vec<u8>> = BTreeMap::new();
    for entry in series.chronological() {
        by_day
            .entry(local_date(entry.timestamp, offset))
            .or_default()
            .push(entry.emotion.intensity());
    }

    let points: Vec<TrendPoint> = by_day
        .into_iter()
        .map(|(date, scores)| {
            let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
            TrendPoint {
                date,
                label: date.format("%b %d").to_string(),
                score: round_to(f64::from(sum) / scores.len() as f64, 1),
            }
        })
        .collect();

    TrendLine {
        has_data: points.len() >= 2,
        points,
    }
}

// ----------------- Pattern insights -----------------

/// Week-over-week observations: this week is `[now-7d, now)`, last week is
/// `[now-14d, now-7d)`.
pub fn pattern_insights(series: &EmotionSeries, now: DateTime<Utc>) -> Vec<String> {
    let week_start = now - Duration::days(7);
    let this_week: Vec<Emotion> = series.between(week_start, now).into_iter().map(|e| e.emotion).collect();
    let last_week: Vec<Emotion> = series
        .between(now - Duration::days(14), week_start)
        .into_iter()
        .map(|e| e.emotion)
        .collect();

    let mut insights = Vec::new();

    for emotion in Emotion::negatives() {
        let count = this_week.iter().filter(|e| **e == emotion).count();
        if count >= 2 {
            insights.push(format!(
                "You experienced {} {} times this week.",
                emotion.display_name().to_lowercase(),
                count
            ));
        }
    }

    let negatives = |labels: &[Emotion]| labels.iter().filter(|e| e.is_negative()).count();
    let positives = |labels: &[Emotion]| labels.iter().filter(|e| e.is_positive()).count();

    let (this_neg, last_neg) = (negatives(&this_week), negatives(&last_week));
    if this_neg < last_neg {
        insights.push("Negative emotions have reduced compared to last week.".to_string());
    } else if this_neg > last_neg {
        insights.push("Negative emotions were higher than last week.".to_string());
    }

    if positives(&this_week) > positives(&last_week) {
        insights.push("Your positive emotions increased compared to last week.".to_string());
    }

    insights
}

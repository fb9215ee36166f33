//! Views assembled from a subject's full history: the insights page and the
//! dashboard header.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::insight::{select_rule, InsightInputs, InsightRuleId};
use crate::series::{
    calculate_streak, calculate_volatility, detect_trend, dominant_emotion, emotion_counts,
    emotion_distribution, local_date, monthly_summary, pattern_insights, positive_ratio,
    trend_line, weekly_summary, EmotionCount, EmotionSeries, TrendLine, WindowSummary,
};
use crate::types::{Emotion, LabeledEntry, TrendDirection};

#[derive(Debug, Clone, Serialize)]
pub struct InsightsView {
    pub summary: String,
    pub recommendation: String,
    pub rule: InsightRuleId,
    pub total_entries: usize,
    pub dominant_emotion: Emotion,
    pub positive_ratio: f64,
    pub volatility: f64,
    pub trend_direction: TrendDirection,
    pub emotion_counts: Vec<EmotionCount>,
    pub weekly_summary: WindowSummary,
    pub monthly_summary: WindowSummary,
    pub pattern_insights: Vec<String>,
    pub trend_series: TrendLine,
}

impl InsightsView {
    pub fn inputs(&self) -> InsightInputs {
        InsightInputs {
            dominant_emotion: self.dominant_emotion,
            positive_ratio: self.positive_ratio,
            volatility: self.volatility,
            trend_direction: self.trend_direction,
        }
    }
}

/// Aggregate statistics the rule cascade runs on.
pub fn snapshot(series: &EmotionSeries) -> InsightInputs {
    let chronological = series.chronological_labels();
    let recent_first = series.recent_first_labels();
    InsightInputs {
        dominant_emotion: dominant_emotion(&recent_first),
        positive_ratio: positive_ratio(&recent_first),
        volatility: calculate_volatility(&chronological),
        trend_direction: detect_trend(&recent_first),
    }
}

/// Everything the insights view shows, computed fresh from `entries`.
///
/// `offset` decides which calendar day an entry falls on for the trend line.
pub fn build_insight_report(entries: &[LabeledEntry], now: DateTime<Utc>, offset: FixedOffset) -> InsightsView {
    let series = EmotionSeries::new(entries.to_vec());
    let inputs = snapshot(&series);
    let rule = select_rule(&inputs);

    InsightsView {
        summary: rule.summary.to_string(),
        recommendation: rule.recommendation.to_string(),
        rule: rule.id,
        total_entries: series.len(),
        dominant_emotion: inputs.dominant_emotion,
        positive_ratio: inputs.positive_ratio,
        volatility: inputs.volatility,
        trend_direction: inputs.trend_direction,
        emotion_counts: emotion_counts(&series.recent_first_labels()),
        weekly_summary: weekly_summary(&series, now),
        monthly_summary: monthly_summary(&series, now),
        pattern_insights: pattern_insights(&series, now),
        trend_series: trend_line(&series, offset),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_entries: usize,
    pub positive_ratio: f64,
    pub streak: u32,
    pub emotion_counts: Vec<EmotionCount>,
    /// All seven labels in canonical order, for the distribution chart.
    pub distribution: Vec<EmotionCount>,
}

pub fn build_dashboard(entries: &[LabeledEntry], now: DateTime<Utc>, offset: FixedOffset) -> DashboardView {
    let series = EmotionSeries::new(entries.to_vec());
    let labels = series.recent_first_labels();
    DashboardView {
        total_entries: series.len(),
        positive_ratio: positive_ratio(&labels),
        streak: calculate_streak(&series.active_dates(offset), local_date(now, offset)),
        emotion_counts: emotion_counts(&labels),
        distribution: emotion_distribution(&labels),
    }
}

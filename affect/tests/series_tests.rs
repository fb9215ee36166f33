use std::collections::BTreeSet;

use affect::series::*;
use affect::types::{ClassificationResult, Emotion, LabeledEntry, RankedLabels, TrendDirection};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use Emotion::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

fn entry(emotion: Emotion, at: DateTime<Utc>) -> LabeledEntry {
    LabeledEntry::new(
        "entry",
        ClassificationResult {
            emotion,
            confidence: 0.9,
            top3: RankedLabels::single(emotion, 0.9),
        },
        at,
    )
}

fn hours_ago(emotion: Emotion, hours: i64) -> LabeledEntry {
    entry(emotion, now() - Duration::hours(hours))
}

fn days_ago(emotion: Emotion, days: i64) -> LabeledEntry {
    entry(emotion, now() - Duration::days(days))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ----------------- trend -----------------

#[test]
fn trend_of_uniform_histories() {
    assert_eq!(detect_trend(&[JoyExcitement; 7]), TrendDirection::Upward);
    assert_eq!(detect_trend(&[SadnessGrief; 7]), TrendDirection::Downward);
    assert_eq!(detect_trend(&[Neutral; 7]), TrendDirection::Stable);
    assert_eq!(detect_trend(&[]), TrendDirection::Stable);
}

#[test]
fn trend_only_looks_at_seven_most_recent() {
    let mut labels = vec![JoyExcitement; 7];
    labels.extend([FearNervousness; 20]);
    assert_eq!(detect_trend(&labels), TrendDirection::Upward);
}

#[test]
fn trend_threshold_is_inclusive() {
    // (1 + 1 + 0 + 0 + 0) / 5 = 0.4
    assert_eq!(
        detect_trend(&[Affection, JoyExcitement, Neutral, Cognitive, Neutral]),
        TrendDirection::Upward
    );
    // (1 + 0 + 0 + 0 + 0) / 5 = 0.2
    assert_eq!(
        detect_trend(&[Affection, Neutral, Neutral, Cognitive, Neutral]),
        TrendDirection::Stable
    );
}

// ----------------- volatility -----------------

#[test]
fn volatility_of_short_sequences_is_zero() {
    assert_eq!(calculate_volatility(&[]), 0.0);
    assert_eq!(calculate_volatility(&[AngerDisgust]), 0.0);
}

#[test]
fn volatility_of_alternating_sequence_is_one() {
    assert_eq!(calculate_volatility(&[JoyExcitement, SadnessGrief]), 1.0);
    assert_eq!(
        calculate_volatility(&[JoyExcitement, SadnessGrief, JoyExcitement, SadnessGrief, JoyExcitement]),
        1.0
    );
}

#[test]
fn volatility_is_rounded_to_two_places() {
    let seq = [
        FearNervousness,
        FearNervousness,
        SadnessGrief,
        FearNervousness,
        AngerDisgust,
        FearNervousness,
        FearNervousness,
    ];
    assert_eq!(calculate_volatility(&seq), 0.67);
}

// ----------------- streak -----------------

#[test]
fn streak_stops_at_first_gap() {
    let today = date(2025, 3, 15);
    let dates: BTreeSet<_> = [date(2025, 3, 15), date(2025, 3, 14), date(2025, 3, 12)].into();
    assert_eq!(calculate_streak(&dates, today), 2);
}

#[test]
fn streak_may_start_yesterday() {
    let today = date(2025, 3, 15);
    let dates: BTreeSet<_> = [date(2025, 3, 14), date(2025, 3, 13), date(2025, 3, 12)].into();
    assert_eq!(calculate_streak(&dates, today), 3);
}

#[test]
fn streak_is_zero_without_today_or_yesterday() {
    let today = date(2025, 3, 15);
    let dates: BTreeSet<_> = [date(2025, 3, 13), date(2025, 3, 12)].into();
    assert_eq!(calculate_streak(&dates, today), 0);
    assert_eq!(calculate_streak(&BTreeSet::new(), today), 0);
}

#[test]
fn active_dates_follow_the_offset() {
    // 23:30 UTC on the 14th is already the 15th at UTC+2.
    let late = entry(Neutral, Utc.with_ymd_and_hms(2025, 3, 14, 23, 30, 0).unwrap());
    let series = EmotionSeries::new(vec![late]);
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    assert!(series.active_dates(utc()).contains(&date(2025, 3, 14)));
    assert!(series.active_dates(plus_two).contains(&date(2025, 3, 15)));
}

// ----------------- counts -----------------

#[test]
fn counts_sorted_by_frequency_with_percentages() {
    let labels = [Neutral, JoyExcitement, Neutral, SadnessGrief, Neutral, JoyExcitement];
    let counts = emotion_counts(&labels);
    assert_eq!(counts[0].emotion, Neutral);
    assert_eq!(counts[0].count, 3);
    assert_eq!(counts[0].percent, 50.0);
    assert_eq!(counts[1].emotion, JoyExcitement);
    assert_eq!(counts[1].percent, 33.3);
    assert_eq!(counts[2].emotion, SadnessGrief);
    assert_eq!(counts[2].percent, 16.7);
}

#[test]
fn counts_ties_follow_canonical_order() {
    let counts = emotion_counts(&[Neutral, AngerDisgust, Affection]);
    let order: Vec<_> = counts.iter().map(|c| c.emotion).collect();
    assert_eq!(order, vec![Affection, AngerDisgust, Neutral]);
}

#[test]
fn counts_of_empty_history_is_empty() {
    assert!(emotion_counts(&[]).is_empty());
    assert_eq!(positive_ratio(&[]), 0.0);
    assert_eq!(dominant_emotion(&[]), Neutral);
}

#[test]
fn distribution_lists_every_label() {
    let dist = emotion_distribution(&[Cognitive, Cognitive]);
    assert_eq!(dist.len(), 7);
    assert_eq!(dist[0].emotion, JoyExcitement);
    assert_eq!(dist[0].count, 0);
    assert_eq!(dist[0].percent, 0.0);
    let cognitive = dist.iter().find(|c| c.emotion == Cognitive).unwrap();
    assert_eq!(cognitive.percent, 100.0);
}

#[test]
fn positive_ratio_is_a_percentage() {
    assert_eq!(positive_ratio(&[JoyExcitement, Affection, Neutral]), 66.7);
    assert_eq!(positive_ratio(&[JoyExcitement, Affection]), 100.0);
}

// ----------------- views over the series -----------------

#[test]
fn views_sort_on_read_without_mutating() {
    let series = EmotionSeries::new(vec![
        days_ago(Neutral, 1),
        days_ago(JoyExcitement, 3),
        days_ago(AngerDisgust, 2),
    ]);
    assert_eq!(series.chronological_labels(), vec![JoyExcitement, AngerDisgust, Neutral]);
    assert_eq!(series.recent_first_labels(), vec![Neutral, AngerDisgust, JoyExcitement]);
    assert_eq!(series.entries()[0].emotion, Neutral);
}

#[test]
fn window_summaries_respect_their_bounds() {
    let series = EmotionSeries::new(vec![
        hours_ago(SadnessGrief, 1),
        days_ago(SadnessGrief, 3),
        days_ago(JoyExcitement, 6),
        days_ago(JoyExcitement, 10),
        days_ago(JoyExcitement, 20),
        days_ago(Neutral, 45),
        // in the future relative to `now`: outside [now-7d, now)
        entry(AngerDisgust, now() + Duration::hours(1)),
    ]);

    let week = weekly_summary(&series, now());
    assert_eq!(week.count, 3);
    let top = week.top.unwrap();
    assert_eq!(top.emotion, SadnessGrief);
    assert_eq!(top.total, 2);

    let month = monthly_summary(&series, now());
    assert_eq!(month.count, 5);
    assert_eq!(month.top.unwrap().emotion, JoyExcitement);

    let empty = weekly_summary(&EmotionSeries::default(), now());
    assert_eq!(empty.count, 0);
    assert!(empty.top.is_none());
}

#[test]
fn trend_line_averages_intensity_per_day() {
    let d1 = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let d2 = Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap();
    let series = EmotionSeries::new(vec![
        entry(AngerDisgust, d2),
        entry(JoyExcitement, d1),
        entry(Affection, d1 + Duration::hours(2)),
    ]);
    let line = trend_line(&series, utc());
    assert!(line.has_data);
    assert_eq!(line.points.len(), 2);
    assert_eq!(line.points[0].label, "Mar 10");
    assert_eq!(line.points[0].score, 4.5);
    assert_eq!(line.points[1].label, "Mar 11");
    assert_eq!(line.points[1].score, 1.0);
}

#[test]
fn trend_line_needs_two_days() {
    let series = EmotionSeries::new(vec![hours_ago(Neutral, 1), hours_ago(Neutral, 2)]);
    let line = trend_line(&series, utc());
    assert_eq!(line.points.len(), 1);
    assert!(!line.has_data);
}

#[test]
fn pattern_insights_compare_weeks() {
    let series = EmotionSeries::new(vec![
        // this week
        days_ago(AngerDisgust, 1),
        days_ago(AngerDisgust, 2),
        days_ago(AngerDisgust, 3),
        days_ago(JoyExcitement, 4),
        days_ago(FearNervousness, 5),
        // last week
        days_ago(SadnessGrief, 8),
        days_ago(Affection, 9),
        days_ago(Affection, 10),
    ]);
    let insights = pattern_insights(&series, now());
    assert_eq!(
        insights,
        vec![
            "You experienced anger & disgust 3 times this week.".to_string(),
            "Negative emotions were higher than last week.".to_string(),
        ]
    );
}

#[test]
fn pattern_insights_report_improvement() {
    let series = EmotionSeries::new(vec![
        days_ago(JoyExcitement, 1),
        days_ago(Affection, 2),
        days_ago(SadnessGrief, 8),
        days_ago(FearNervousness, 9),
    ]);
    let insights = pattern_insights(&series, now());
    assert_eq!(
        insights,
        vec![
            "Negative emotions have reduced compared to last week.".to_string(),
            "Your positive emotions increased compared to last week.".to_string(),
        ]
    );
}

#[test]
fn pattern_insights_empty_history() {
    assert!(pattern_insights(&EmotionSeries::default(), now()).is_empty());
}

// ----------------- properties -----------------

fn any_emotion() -> impl Strategy<Value = Emotion> {
    prop::sample::select(Emotion::ALL.to_vec())
}

proptest! {
    #[test]
    fn volatility_is_bounded(labels in prop::collection::vec(any_emotion(), 0..40)) {
        let v = calculate_volatility(&labels);
        prop_assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn percentages_never_exceed_one_hundred(labels in prop::collection::vec(any_emotion(), 0..60)) {
        let counts = emotion_counts(&labels);
        let sum: f64 = counts.iter().map(|c| c.percent).sum();
        // each share is rounded to 0.1, so allow half a step per row
        prop_assert!(sum <= 100.0 + 0.05 * counts.len() as f64);
        let total: usize = counts.iter().map(|c| c.count).sum();
        prop_assert_eq!(total, labels.len());
    }
}

#[test]
fn per_row_rounding_can_overshoot_one_hundred() {
    let counts = emotion_counts(&[
        JoyExcitement,
        Affection,
        AngerDisgust,
        SadnessGrief,
        FearNervousness,
        Cognitive,
    ]);
    assert!(counts.iter().all(|c| c.percent == 16.7));
    let sum: f64 = counts.iter().map(|c| c.percent).sum();
    assert!((sum - 100.2).abs() < 1e-9);
}

#[test]
fn percentages_sum_exactly_when_rounding_is_exact() {
    let counts = emotion_counts(&[Neutral, Neutral, JoyExcitement, AngerDisgust]);
    let sum: f64 = counts.iter().map(|c| c.percent).sum();
    assert_eq!(sum, 100.0);
}

// Pure analytics engine for MindCheck: no I/O, no model, no clock.

pub mod feedback;
pub mod insight;
pub mod normalize;
pub mod report;
pub mod series;
pub mod types;

pub use feedback::{entry_feedback, EntryFeedback};
pub use insight::{select_rule, synthesize, InsightInputs, InsightReport, InsightRuleId};
pub use normalize::normalize;
pub use report::{build_dashboard, build_insight_report, DashboardView, InsightsView};
pub use series::{
    calculate_streak, calculate_volatility, detect_trend, emotion_counts, EmotionCount, EmotionSeries,
};
pub use types::{
    round4, ClassificationResult, Emotion, LabeledEntry, ParseEmotionError, Polarity, RankedLabels,
    TrendDirection,
};

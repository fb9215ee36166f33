use serde::{Deserialize, Serialize};

use crate::types::{Emotion, TrendDirection};

// ----------------- Inputs / outputs -----------------

/// Aggregate statistics the rule cascade is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightInputs {
    pub dominant_emotion: Emotion,
    /// Percentage of positive entries, 0..=100.
    pub positive_ratio: f64,
    /// Share of label changes between consecutive entries, 0..=1.
    pub volatility: f64,
    pub trend_direction: TrendDirection,
}

impl Default for InsightInputs {
    fn default() -> Self {
        Self {
            dominant_emotion: Emotion::Neutral,
            positive_ratio: 0.0,
            volatility: 0.0,
            trend_direction: TrendDirection::Stable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightReport {
    pub summary: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightRuleId {
    AnxiousVolatility,
    DecliningTrend,
    PositiveBaseline,
    HighVolatility,
    SadnessDominant,
    AngerDominant,
    ImprovingTrend,
    Balanced,
}

// ----------------- Rule table -----------------

pub struct InsightRule {
    pub id: InsightRuleId,
    pub applies: fn(&InsightInputs) -> bool,
    pub summary: &'static str,
    pub recommendation: &'static str,
}

impl InsightRule {
    pub fn report(&self) -> InsightReport {
        InsightReport {
            summary: self.summary.to_string(),
            recommendation: self.recommendation.to_string(),
        }
    }
}

/// Priority cascade: the first rule whose predicate holds wins. The last rule
/// always applies.
pub static RULES: &[InsightRule] = &[
    InsightRule {
        id: InsightRuleId::AnxiousVolatility,
        applies: |s| s.dominant_emotion == Emotion::FearNervousness && s.volatility > 0.4,
        summary: "Recurring anxiety and nervousness signals detected in your emotional patterns. Your entries show heightened emotional variability paired with fear as a dominant theme.",
        recommendation: "Introduce structured breathing reset exercises during identified peak anxiety periods. Consider implementing a daily grounding routine to interrupt anxiety cycles before they intensify.",
    },
    InsightRule {
        id: InsightRuleId::DecliningTrend,
        applies: |s| s.trend_direction == TrendDirection::Downward,
        summary: "A decline in positive emotional affect has been detected over your recent entries. Your baseline mood stability is shifting downward.",
        recommendation: "Establish consistent daily routines and maintain regular sleep cycles. Structured daily activities help stabilize emotional baseline. Consider increasing journaling frequency to track the root triggers of this decline.",
    },
    InsightRule {
        id: InsightRuleId::PositiveBaseline,
        applies: |s| s.positive_ratio > 65.0,
        summary: "Your emotional baseline shows predominantly positive affect. Joy, excitement, and warmth are well-represented in your recent reflections.",
        recommendation: "Maintain your current journaling frequency to reinforce emotional stability. Document what conditions support this positive baseline — this pattern recognition helps predict and sustain wellbeing.",
    },
    InsightRule {
        id: InsightRuleId::HighVolatility,
        applies: |s| s.volatility > 0.5,
        summary: "High emotional variability detected. Your emotional states are shifting frequently across entries, indicating unstable baseline patterns.",
        recommendation: "Prioritize sleep cycle regulation and establish consistent daily structure. Emotional volatility often correlates with disrupted sleep and unstructured routines.",
    },
    InsightRule {
        id: InsightRuleId::SadnessDominant,
        applies: |s| s.dominant_emotion == Emotion::SadnessGrief,
        summary: "Your emotional profile shows sadness and grief as dominant states. This pattern suggests sustained low mood or loss-related cycles in your recent reflections.",
        recommendation: "Engage in structured social connection and light physical activity. Isolation amplifies negative emotional patterns. Establish small daily activities that create emotional counterweights to sadness.",
    },
    InsightRule {
        id: InsightRuleId::AngerDominant,
        applies: |s| s.dominant_emotion == Emotion::AngerDisgust,
        summary: "Frustration and anger appear as recurring themes in your recent entries. This may reflect unresolved tension or ongoing stressors.",
        recommendation: "Try expressive writing to externalize and process frustration before it accumulates. Physical activity and structured breaks during high-stress periods can help discharge tension constructively.",
    },
    InsightRule {
        id: InsightRuleId::ImprovingTrend,
        applies: |s| s.trend_direction == TrendDirection::Upward,
        summary: "Your emotional trajectory is trending positively. Recent entries reflect an improving mood baseline.",
        recommendation: "Continue the habits and routines that are contributing to this upward shift. Logging what's going well reinforces positive patterns and builds resilience.",
    },
    InsightRule {
        id: InsightRuleId::Balanced,
        applies: |_| true,
        summary: "Moderate emotional variability observed. Your emotional states show normal fluctuation within a balanced range, with no dominant negative patterns.",
        recommendation: "Continue your structured self-reflection practice. Regular journaling maintains baseline emotional awareness and helps identify patterns before they accumulate.",
    },
];

/// First rule in [`RULES`] that applies to `inputs`.
pub fn select_rule(inputs: &InsightInputs) -> &'static InsightRule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(inputs))
        .unwrap_or(&RULES[RULES.len() - 1])
}

pub fn synthesize(inputs: &InsightInputs) -> InsightReport {
    select_rule(inputs).report()
}

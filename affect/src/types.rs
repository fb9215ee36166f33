use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ----------------- Taxonomy -----------------

/// The closed set of emotion groups produced by the classifier.
///
/// Declaration order is the canonical order: it is used for display and as the
/// stable tie-break wherever two labels compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    JoyExcitement,
    Affection,
    AngerDisgust,
    SadnessGrief,
    FearNervousness,
    Cognitive,
    Neutral,
}

/// Coarse grouping used by ratios and week-over-week comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emotion label: {0:?}")]
pub struct ParseEmotionError(pub String);

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::JoyExcitement,
        Emotion::Affection,
        Emotion::AngerDisgust,
        Emotion::SadnessGrief,
        Emotion::FearNervousness,
        Emotion::Cognitive,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::JoyExcitement => "joy_excitement",
            Emotion::Affection => "affection",
            Emotion::AngerDisgust => "anger_disgust",
            Emotion::SadnessGrief => "sadness_grief",
            Emotion::FearNervousness => "fear_nervousness",
            Emotion::Cognitive => "cognitive",
            Emotion::Neutral => "neutral",
        }
    }

    /// Human-friendly name shown next to a label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Emotion::JoyExcitement => "Joy & Excitement",
            Emotion::Affection => "Affection",
            Emotion::AngerDisgust => "Anger & Disgust",
            Emotion::SadnessGrief => "Sadness & Grief",
            Emotion::FearNervousness => "Fear & Nervousness",
            Emotion::Cognitive => "Curiosity & Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Signed direction used by trend detection.
    pub fn valence(&self) -> i8 {
        match self {
            Emotion::JoyExcitement | Emotion::Affection => 1,
            Emotion::Cognitive | Emotion::Neutral => 0,
            Emotion::AngerDisgust | Emotion::SadnessGrief | Emotion::FearNervousness => -1,
        }
    }

    /// Charting score on a 1..=5 scale (5 = joy, 1 = fear/anger).
    pub fn intensity(&self) -> u8 {
        match self {
            Emotion::JoyExcitement => 5,
            Emotion::Affection => 4,
            Emotion::Cognitive | Emotion::Neutral => 3,
            Emotion::SadnessGrief => 2,
            Emotion::FearNervousness | Emotion::AngerDisgust => 1,
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self.valence() {
            v if v > 0 => Polarity::Positive,
            v if v < 0 => Polarity::Negative,
            _ => Polarity::Other,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.polarity() == Polarity::Positive
    }

    pub fn is_negative(&self) -> bool {
        self.polarity() == Polarity::Negative
    }

    /// Negative labels in canonical order.
    pub fn negatives() -> impl Iterator<Item = Emotion> {
        Self::ALL.into_iter().filter(Emotion::is_negative)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ParseEmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| ParseEmotionError(s.to_string()))
    }
}

// ----------------- Classification -----------------

/// Round to 4 decimal places, the precision every probability is reported at.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

pub(crate) fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

/// Ranked `(label, probability)` pairs, highest first.
///
/// Serializes as a JSON object whose key order is the ranking, e.g.
/// `{"joy_excitement": 0.81, "affection": 0.12, "neutral": 0.03}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedLabels(Vec<(Emotion, f64)>);

impl RankedLabels {
    pub fn new(pairs: Vec<(Emotion, f64)>) -> Self {
        Self(pairs)
    }

    pub fn single(emotion: Emotion, probability: f64) -> Self {
        Self(vec![(emotion, probability)])
    }

    pub fn as_slice(&self) -> &[(Emotion, f64)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn top(&self) -> Option<(Emotion, f64)> {
        self.0.first().copied()
    }

    pub fn get(&self, emotion: Emotion) -> Option<f64> {
        self.0.iter().find(|(e, _)| *e == emotion).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Emotion, f64)> {
        self.0.iter()
    }
}

impl Serialize for RankedLabels {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (emotion, p) in &self.0 {
            map.serialize_entry(emotion.as_str(), p)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RankedLabels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RankedVisitor;

        impl<'de> Visitor<'de> for RankedVisitor {
            type Value = RankedLabels;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of emotion label to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(3));
                while let Some((label, p)) = access.next_entry::<String, f64>()? {
                    let emotion = label.parse::<Emotion>().map_err(serde::de::Error::custom)?;
                    pairs.push((emotion, p));
                }
                Ok(RankedLabels(pairs))
            }
        }

        deserializer.deserialize_map(RankedVisitor)
    }
}

/// Output of classifying one normalized text.
///
/// `confidence` is always the probability of the model's top class. When the
/// confidence gate demotes the label to neutral, `confidence` and `top3` keep
/// the model's original values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub emotion: Emotion,
    pub confidence: f64,
    pub top3: RankedLabels,
}

impl ClassificationResult {
    /// Result reported for text with nothing left to classify.
    pub fn neutral_fallback() -> Self {
        Self {
            emotion: Emotion::Neutral,
            confidence: 1.0,
            top3: RankedLabels::single(Emotion::Neutral, 1.0),
        }
    }

    /// Confidence as a percentage with 2 decimals.
    pub fn confidence_percent(&self) -> f64 {
        round_to(self.confidence * 100.0, 2)
    }
}

// ----------------- Entries -----------------

/// One classified piece of text, fixed at the time it was authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledEntry {
    pub text: String,
    pub emotion: Emotion,
    pub confidence: f64,
    pub top_k: RankedLabels,
    pub timestamp: DateTime<Utc>,
}

impl LabeledEntry {
    pub fn new(text: impl Into<String>, result: ClassificationResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            emotion: result.emotion,
            confidence: result.confidence,
            top_k: result.top3,
            timestamp,
        }
    }

    pub fn classification(&self) -> ClassificationResult {
        ClassificationResult {
            emotion: self.emotion,
            confidence: self.confidence,
            top3: self.top_k.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Upward => "upward",
            TrendDirection::Downward => "downward",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::Serialize;

use crate::types::{ClassificationResult, Emotion};

/// Radar value for every label the entry was not classified as.
const RADAR_BASELINE: u32 = 12;
/// Floor for the classified label so it always stands out.
const RADAR_FLOOR: u32 = 25;

/// Per-entry feedback shown right after an entry is analysed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryFeedback {
    pub emotion: Emotion,
    pub display: &'static str,
    pub confidence_percent: f64,
    pub suggestion: &'static str,
    pub message: &'static str,
    pub radar: Vec<(Emotion, u32)>,
}

pub fn suggestion(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::JoyExcitement => "Your reflection radiates positive energy and excitement. Maintain this momentum with consistent routines and gratitude-based journaling.",
        Emotion::Affection => "Your writing reflects warmth and connection. Nurturing relationships and expressing appreciation amplifies this positive state.",
        Emotion::SadnessGrief => "Your writing suggests low emotional energy. Gentle routines, social connection, and structured sleep may help regulate mood.",
        Emotion::FearNervousness => "The current profile reflects elevated fear and nervousness. Focus on grounding techniques and short certainty-based planning to reduce mental load.",
        Emotion::AngerDisgust => "Your reflection shows heightened frustration markers. Pause before major decisions and use brief breathing breaks to de-intensify reactions.",
        Emotion::Cognitive => "Your entries show active curiosity and mental engagement. Channel this reflective energy into structured problem-solving or creative outlets.",
        Emotion::Neutral => "Your emotional tone is currently balanced. Continue consistent journaling to monitor subtle shifts and maintain mental stability.",
    }
}

/// Short supportive line returned alongside an API classification.
pub fn supportive_message(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::JoyExcitement => "You seem energised and positive today. Keep nurturing what is working.",
        Emotion::Affection => "Warmth and connection come through in your words. That is worth holding onto.",
        Emotion::SadnessGrief => "Your tone feels a bit low. Gentle routines and connection can help.",
        Emotion::FearNervousness => "Some fear signals appear. Grounding exercises may help you feel safer.",
        Emotion::AngerDisgust => "There are signs of frustration. A brief reset can ease intensity.",
        Emotion::Cognitive => "Your mind seems active and curious today. Channel that energy constructively.",
        Emotion::Neutral => "Your emotional tone looks balanced. Keep journaling to maintain clarity.",
    }
}

/// Radar chart values in canonical label order.
pub fn radar(result: &ClassificationResult) -> Vec<(Emotion, u32)> {
    let peak = ((result.confidence * 100.0).floor() as u32).max(RADAR_FLOOR);
    Emotion::ALL
        .into_iter()
        .map(|e| (e, if e == result.emotion { peak } else { RADAR_BASELINE }))
        .collect()
}

pub fn entry_feedback(result: &ClassificationResult) -> EntryFeedback {
    EntryFeedback {
        emotion: result.emotion,
        display: result.emotion.display_name(),
        confidence_percent: result.confidence_percent(),
        suggestion: suggestion(result.emotion),
        message: supportive_message(result.emotion),
        radar: radar(result),
    }
}

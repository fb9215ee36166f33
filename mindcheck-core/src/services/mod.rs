// src/services/mod.rs

pub mod classifier;   // lazy, load-once model wrapper
pub mod gate;         // low-confidence -> neutral
pub mod journal;      // the ONLY SQLite writer
pub mod onnx;         // ort + tokenizers backend

// Public API
pub use classifier::{
    ArtifactKind, ClassifierError, EmotionClassifier, InferenceBackend, LabelEncoder, LoadedModel,
};
pub use gate::{ConfidenceGate, GateOutcome, InvalidThreshold};
pub use journal::{HistoryFilter, JournalRecord, JournalStore, Order, SqliteJournal};

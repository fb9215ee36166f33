// src/services/onnx.rs
//! ONNX Runtime backend for a sequence-classification graph (RoBERTa style:
//! `input_ids` + `attention_mask` in, `[1, classes]` logits out).

use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};

use crate::services::classifier::{ArtifactKind, ClassifierError, InferenceBackend};

pub struct OnnxBackend {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

fn load_err(kind: ArtifactKind, e: impl Display) -> ClassifierError {
    ClassifierError::Load {
        kind,
        message: e.to_string(),
    }
}

fn inference_err(e: impl Display) -> ClassifierError {
    ClassifierError::Inference(e.to_string())
}

/// HF tokenizer from `path`, truncating every encoding to `max_seq_len` ids.
pub fn build_tokenizer(path: &Path, max_seq_len: usize) -> Result<Tokenizer, ClassifierError> {
    fn tok_err(e: impl Display) -> ClassifierError {
        load_err(ArtifactKind::Tokenizer, e)
    }

    let mut tokenizer = Tokenizer::from_file(path).map_err(tok_err)?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_seq_len,
            ..Default::default()
        }))
        .map_err(tok_err)?;
    // Single sequences only; padding would just add masked tokens.
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

impl OnnxBackend {
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_seq_len: usize,
        intra_threads: usize,
    ) -> Result<Self, ClassifierError> {
        fn model_err(e: impl Display) -> ClassifierError {
            load_err(ArtifactKind::Model, e)
        }

        let tokenizer = build_tokenizer(tokenizer_path, max_seq_len)?;
        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(intra_threads)
            .map_err(model_err)?
            .commit_from_file(model_path)
            .map_err(model_err)?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

impl InferenceBackend for OnnxBackend {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let encoding = self.tokenizer.encode(text, true).map_err(inference_err)?;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&i| i64::from(i)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let len = ids.len();

        let input_ids = Tensor::from_array(([1usize, len], ids)).map_err(inference_err)?;
        let attention_mask = Tensor::from_array(([1usize, len], mask)).map_err(inference_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ])
            .map_err(inference_err)?;
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_err)?;
        Ok(logits.to_vec())
    }
}

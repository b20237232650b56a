use std::collections::BTreeMap;

use crate::common::Grade;
use crate::data::decode_and_preprocess;
use crate::error::PredictionError;
use crate::model::resnet::ResNet18;

use burn::{
    prelude::*,
    tensor::{Tensor, activation::softmax, cast::ToElement},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub grade: Grade,
    pub confidence: f32,
    pub class_probabilities: BTreeMap<String, f32>,
}

/// Runs the full pipeline on raw image bytes: preprocess, forward pass,
/// softmax, top-1 selection. The model is only read, never mutated.
pub fn predict<B: Backend>(
    model: &ResNet18<B>,
    image_bytes: &[u8],
    device: &B::Device,
) -> Result<PredictionResult, PredictionError> {
    let input = decode_and_preprocess::<B>(image_bytes, device)?;
    let logits = model.forward(input.unsqueeze::<4>());
    summarize(logits)
}

fn summarize<B: Backend>(logits: Tensor<B, 2>) -> Result<PredictionResult, PredictionError> {
    let probabilities = softmax(logits, 1);

    let (_, top) = probabilities.clone().max_dim_with_indices(1);
    let top = top.into_scalar().to_usize();

    let probabilities: Vec<f32> = probabilities
        .to_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| PredictionError::Inference {
            stage: "softmax",
            detail: format!("{e:?}"),
        })?;

    if probabilities.len() != Grade::ALL.len() {
        return Err(PredictionError::Inference {
            stage: "softmax",
            detail: format!(
                "expected {} class probabilities, got {}",
                Grade::ALL.len(),
                probabilities.len()
            ),
        });
    }
    let grade = Grade::from_index(top).ok_or_else(|| PredictionError::Inference {
        stage: "top-1 selection",
        detail: format!("class index {top} out of range"),
    })?;

    let class_probabilities = Grade::ALL
        .iter()
        .zip(&probabilities)
        .map(|(grade, p)| (grade.label().to_string(), round4(*p)))
        .collect();

    Ok(PredictionResult {
        grade,
        confidence: round4(probabilities[top]),
        class_probabilities,
    })
}

/// Rounds to 4 decimals for presentation. Each probability is rounded
/// independently (up to 5e-5 drift apiece), so the reported five-class sum
/// can sit as much as 2.5e-4 away from 1 even though the unrounded
/// probabilities sum to 1 exactly.
fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

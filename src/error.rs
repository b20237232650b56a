use std::path::PathBuf;

use thiserror::Error;

/// Errors while loading a persisted parameter set. All of these are fatal at
/// startup; the process must not serve with a partially initialized model.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model file not found at {0}")]
    FileNotFound(PathBuf),
    #[error("failed to read model weights: {0}")]
    Deserialize(String),
    #[error("checkpoint is structurally incompatible at {layer}: expected {expected}, got {actual}")]
    Incompatible {
        layer: String,
        expected: String,
        actual: String,
    },
}

/// Errors while serving a single prediction. Decode failures are client-input
/// errors; inference failures carry the stage they occurred in.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("inference failed during {stage}: {detail}")]
    Inference { stage: &'static str, detail: String },
}

//! Diabetic-retinopathy grading inference core: image preprocessing, a
//! ResNet-18 backbone, tolerant checkpoint loading, and a single `predict`
//! call surface for the serving layer.

pub mod common;
pub mod data;
pub mod error;
pub mod model;

pub use common::Grade;
pub use error::{ModelLoadError, PredictionError};
pub use model::inference::{PredictionResult, predict};
pub use model::loader::load_model;
pub use model::resnet::ResNet18;

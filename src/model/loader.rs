use std::path::Path;

use crate::error::ModelLoadError;
use crate::model::resnet::{ResNet18, ResNet18Record};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use log::info;

/// Rewrites the training process's layer identifiers onto this crate's record
/// paths: `bn*` batchnorms become `norm*`, stage members gain the `blocks`
/// segment, and the two-module downsample sequence becomes `conv`/`norm`.
/// Applied in order; a rewritten key never matches a later pattern.
const KEY_REMAPS: [(&str, &str); 5] = [
    (r"^bn1\.(.+)$", "norm1.$1"),
    (
        r"^layer([1-4])\.(\d+)\.conv([12])\.(.+)$",
        "layer$1.blocks.$2.conv$3.$4",
    ),
    (
        r"^layer([1-4])\.(\d+)\.bn([12])\.(.+)$",
        "layer$1.blocks.$2.norm$3.$4",
    ),
    (
        r"^layer([1-4])\.(\d+)\.downsample\.0\.(.+)$",
        "layer$1.blocks.$2.downsample.conv.$3",
    ),
    (
        r"^layer([1-4])\.(\d+)\.downsample\.1\.(.+)$",
        "layer$1.blocks.$2.downsample.norm.$3",
    ),
];

/// Loads a persisted parameter set into a freshly constructed backbone and
/// returns it ready for inference. Runs once at startup; any error here must
/// abort the process before it serves traffic.
pub fn load_model<B: Backend>(
    path: &Path,
    num_classes: usize,
    device: &Device<B>,
) -> Result<ResNet18<B>, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::FileNotFound(path.to_path_buf()));
    }

    let model = ResNet18::new(num_classes, device);

    let load_args = KEY_REMAPS
        .iter()
        .fold(LoadArgs::new(path.to_path_buf()), |args, (pattern, replacement)| {
            args.with_key_remap(pattern, replacement)
        });

    let record: ResNet18Record<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(load_args, device)
        .map_err(|e| ModelLoadError::Deserialize(e.to_string()))?;

    let model = model.load(record)?;
    info!("model loaded from {}", path.display());
    Ok(model)
}

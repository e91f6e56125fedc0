//! One-shot export of trained weights to a compact on-device artifact.

use crate::TrainBackend;
use burn::module::Module;
use burn::record::{BinFileRecorder, HalfPrecisionSettings, RecorderError};
use burn::tensor::backend::Backend;
use models::{QuestionDetector, QuestionDetectorConfig};
use std::fs;
use std::path::Path;

/// Default location of the deployable artifact.
pub const EXPORT_PATH: &str = "assets/models/question_detector.bin";

/// Write the final weights as a half-precision record at `path`. One-shot:
/// any existing artifact is replaced.
pub fn export_quantized<B: Backend>(
    model: &QuestionDetector<B>,
    path: &Path,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let recorder = BinFileRecorder::<HalfPrecisionSettings>::new();
    model
        .clone()
        .save_file(path, &recorder)
        .map_err(|e| anyhow::anyhow!("failed to export model to {}: {e}", path.display()))?;
    Ok(())
}

/// Load an exported artifact back into a callable detector. The config must
/// match the one the artifact was exported with.
pub fn load_exported(
    cfg: &QuestionDetectorConfig,
    path: &Path,
    device: &<TrainBackend as Backend>::Device,
) -> Result<QuestionDetector<TrainBackend>, RecorderError> {
    let recorder = BinFileRecorder::<HalfPrecisionSettings>::new();
    QuestionDetector::<TrainBackend>::new(cfg, device).load_file(path, &recorder, device)
}

//! Training manifest loading and per-record targets.

use crate::preprocess::Preprocessor;
use crate::types::{DatasetError, DatasetResult, LabeledSample};
use data_contracts::Annotation;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Parse the training manifest (an array of annotation records) and
/// validate every box. Any defect aborts before training starts.
pub fn load_manifest(path: &Path) -> DatasetResult<Vec<Annotation>> {
    let raw = fs::read(path).map_err(|e| DatasetError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries: Vec<Annotation> = serde_json::from_slice(&raw).map_err(|e| DatasetError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    for entry in &entries {
        entry.validate().map_err(|e| DatasetError::Validation {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(entries)
}

/// Target 5-vector for one record: the first drawn box, or a zero box with
/// zero confidence for records without boxes.
pub fn target_vector(annotation: &Annotation) -> [f32; 5] {
    annotation
        .boxes
        .first()
        .map(|b| b.as_array())
        .unwrap_or([0.0; 5])
}

/// Preprocess every manifest record into a labeled sample. An unreadable
/// image is fatal for that item; with `permissive` set the item is skipped
/// with a warning, otherwise the error propagates.
pub fn load_labeled_samples(
    images_dir: &Path,
    entries: &[Annotation],
    pre: &Preprocessor,
    permissive: bool,
) -> DatasetResult<Vec<LabeledSample>> {
    let mut loaded: Vec<_> = entries
        .par_iter()
        .enumerate()
        .map(|(i, entry)| {
            let path = images_dir.join(&entry.image);
            let res = pre.load(&path).map(|tensor| LabeledSample {
                image: path.clone(),
                tensor,
                target: target_vector(entry),
            });
            (i, res)
        })
        .collect();
    loaded.sort_by_key(|(i, _)| *i);

    let mut samples = Vec::with_capacity(loaded.len());
    let mut skipped = 0usize;
    for (_, res) in loaded {
        match res {
            Ok(sample) => samples.push(sample),
            Err(e) if permissive => {
                tracing::warn!("skipping sample: {e}");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "unreadable images were skipped");
    }
    Ok(samples)
}

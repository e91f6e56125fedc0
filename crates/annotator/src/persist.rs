//! Serialization of annotation records.

use data_contracts::{Annotation, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type AnnotatorResult<T> = Result<T, AnnotatorError>;

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("refusing to write invalid annotation for {image}: {source}")]
    Invalid {
        image: String,
        #[source]
        source: ValidationError,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Record path for an image: `<out_dir>/<stem>.json`.
pub fn record_path(out_dir: &Path, image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("annotation");
    out_dir.join(format!("{stem}.json"))
}

/// Validate and write one annotation record. A violated box invariant
/// fails the write; records are never repaired.
pub fn write_annotation(
    out_dir: &Path,
    image: &Path,
    annotation: &Annotation,
) -> AnnotatorResult<PathBuf> {
    annotation
        .validate()
        .map_err(|e| AnnotatorError::Invalid {
            image: annotation.image.clone(),
            source: e,
        })?;
    fs::create_dir_all(out_dir).map_err(|e| AnnotatorError::Io {
        path: out_dir.to_path_buf(),
        source: e,
    })?;
    let path = record_path(out_dir, image);
    let data = serde_json::to_vec_pretty(annotation).map_err(|e| AnnotatorError::Json {
        path: path.clone(),
        source: e,
    })?;
    fs::write(&path, data).map_err(|e| AnnotatorError::Io {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

pub fn read_annotation(path: &Path) -> AnnotatorResult<Annotation> {
    let raw = fs::read(path).map_err(|e| AnnotatorError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let annotation: Annotation =
        serde_json::from_slice(&raw).map_err(|e| AnnotatorError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
    annotation.validate().map_err(|e| AnnotatorError::Invalid {
        image: annotation.image.clone(),
        source: e,
    })?;
    Ok(annotation)
}

/// Merge every per-image record under `records_dir` into one manifest
/// array, sorted by record path.
pub fn merge_records(records_dir: &Path, manifest_out: &Path) -> AnnotatorResult<Vec<Annotation>> {
    let entries = fs::read_dir(records_dir).map_err(|e| AnnotatorError::Io {
        path: records_dir.to_path_buf(),
        source: e,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut annotations = Vec::with_capacity(paths.len());
    for path in paths {
        annotations.push(read_annotation(&path)?);
    }

    if let Some(parent) = manifest_out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AnnotatorError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    let data = serde_json::to_vec_pretty(&annotations).map_err(|e| AnnotatorError::Json {
        path: manifest_out.to_path_buf(),
        source: e,
    })?;
    fs::write(manifest_out, data).map_err(|e| AnnotatorError::Io {
        path: manifest_out.to_path_buf(),
        source: e,
    })?;
    Ok(annotations)
}

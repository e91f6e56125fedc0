//! Core types and error definitions for page_dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("annotation validation failed at {path}: {source}")]
    Validation {
        path: PathBuf,
        #[source]
        source: data_contracts::ValidationError,
    },
    #[error("{0}")]
    Other(String),
}

/// A page image in CHW layout, values in [0, 1], channel order RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTensor {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl PageTensor {
    pub const CHANNELS: usize = 3;
}

/// A preprocessed page paired with its training target.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub image: PathBuf,
    pub tensor: PageTensor,
    /// `[x1, y1, x2, y2, confidence]` of the first drawn box; all zeros for
    /// records without boxes.
    pub target: [f32; 5],
}

//! Dataset loading, preprocessing, splitting, and Burn-compatible batching
//! for the question-region detector.
//!
//! This crate provides:
//! - Fixed-shape image preprocessing (decode, RGB conversion, forced resize)
//! - Training manifest loading with fail-fast validation
//! - Seedable train/validation splitting
//! - Batch collation into Burn tensors

pub mod batch;
pub mod manifest;
pub mod preprocess;
pub mod split;
pub mod types;

pub use batch::{collate, DetectionBatch};
pub use manifest::{load_labeled_samples, load_manifest, target_vector};
pub use preprocess::{Preprocessor, TRAIN_SIZE};
pub use split::split_samples;
pub use types::{DatasetError, DatasetResult, LabeledSample, PageTensor};

#![recursion_limit = "256"]

pub mod export;
pub mod loss;
pub mod trainer;
pub mod util;

pub use export::{export_quantized, load_exported, EXPORT_PATH};
pub use loss::{CompositeLoss, DetectionLoss};
pub use trainer::{fit, ADBackend, FitConfig, TrainReport};
pub use util::{run_train, TrainArgs};

/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;

//! Burn model for locating question regions on scanned pages.
//!
//! This crate defines the detector architecture:
//! - `Backbone`: frozen convolutional feature extractor.
//! - `FeaturePyramid`: top-down multi-scale fusion of the backbone output.
//! - `DetectionHead`: channel reduction, pooling, and the box/confidence
//!   projection.
//!
//! `QuestionDetector` composes the three into a pure function from an image
//! batch to one `[x1, y1, x2, y2, confidence]` row per image, every value
//! squashed to [0,1]. Construction is driven entirely by
//! `QuestionDetectorConfig`; there is no mutable state outside trainable
//! weights.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};
use burn::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct QuestionDetectorConfig {
    /// Square input resolution the detector is built for.
    pub input_size: usize,
    /// Backbone stage widths; each stage halves the spatial resolution.
    pub backbone_channels: Vec<usize>,
    /// Channel width of every pyramid level.
    pub pyramid_channels: usize,
    /// Widths of the two head reduction blocks.
    pub head_channels: [usize; 2],
    /// Width of the dense projection before the output layer.
    pub dense: usize,
    /// Dropout probability on the dense projection.
    pub dropout: f64,
}

impl Default for QuestionDetectorConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            backbone_channels: vec![32, 64, 128, 256],
            pyramid_channels: 256,
            head_channels: [256, 128],
            dense: 512,
            dropout: 0.5,
        }
    }
}

/// 3x3 convolution + batch norm + ReLU.
#[derive(Debug, Module)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let norm = BatchNormConfig::new(out_channels).init(device);
        Self { conv, norm }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        relu(self.norm.forward(self.conv.forward(x)))
    }
}

/// Stack of stride-2 conv blocks producing one high-level feature map.
/// Weights are frozen at detector construction and never updated.
#[derive(Debug, Module)]
pub struct Backbone<B: Backend> {
    stages: Vec<ConvBlock<B>>,
}

impl<B: Backend> Backbone<B> {
    fn new(channels: &[usize], device: &B::Device) -> Self {
        let mut stages = Vec::with_capacity(channels.len());
        let mut in_channels = 3;
        for &out_channels in channels {
            stages.push(ConvBlock::new(in_channels, out_channels, 2, device));
            in_channels = out_channels;
        }
        Self { stages }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = x;
        for stage in &self.stages {
            x = stage.forward(x);
        }
        x
    }
}

/// Top-down pyramid: the backbone map is projected at 1x1 (P5), then each
/// finer level is a 2x nearest upsample of the previous level followed by
/// another 1x1 projection (P4, P3). The coarser levels are resampled to
/// P3's grid and the three maps concatenate along channels.
#[derive(Debug, Module)]
pub struct FeaturePyramid<B: Backend> {
    lateral_p5: Conv2d<B>,
    lateral_p4: Conv2d<B>,
    lateral_p3: Conv2d<B>,
}

impl<B: Backend> FeaturePyramid<B> {
    fn new(in_channels: usize, width: usize, device: &B::Device) -> Self {
        let lateral = |inputs: usize| Conv2dConfig::new([inputs, width], [1, 1]).init(device);
        Self {
            lateral_p5: lateral(in_channels),
            lateral_p4: lateral(width),
            lateral_p3: lateral(width),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let p5 = relu(self.lateral_p5.forward(x));
        let p4 = relu(self.lateral_p4.forward(upsample_2x(p5.clone())));
        let p3 = relu(self.lateral_p3.forward(upsample_2x(p4.clone())));

        let [_, _, h3, w3] = p3.dims();
        let p4 = resize_to(p4, [h3, w3]);
        let p5 = resize_to(p5, [h3, w3]);
        Tensor::cat(vec![p3, p4, p5], 1)
    }
}

fn upsample_2x<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [_, _, h, w] = x.dims();
    resize_to(x, [h * 2, w * 2])
}

fn resize_to<B: Backend>(x: Tensor<B, 4>, size: [usize; 2]) -> Tensor<B, 4> {
    if x.dims()[2..] == size {
        return x;
    }
    interpolate(x, size, InterpolateOptions::new(InterpolateMode::Nearest))
}

/// Reduces the fused pyramid to the 5-vector output.
#[derive(Debug, Module)]
pub struct DetectionHead<B: Backend> {
    reduce1: ConvBlock<B>,
    reduce2: ConvBlock<B>,
    pool: AdaptiveAvgPool2d,
    dense: Linear<B>,
    dropout: Dropout,
    output: Linear<B>,
}

impl<B: Backend> DetectionHead<B> {
    fn new(cfg: &QuestionDetectorConfig, in_channels: usize, device: &B::Device) -> Self {
        let [c1, c2] = cfg.head_channels;
        Self {
            reduce1: ConvBlock::new(in_channels, c1, 1, device),
            reduce2: ConvBlock::new(c1, c2, 1, device),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dense: LinearConfig::new(c2, cfg.dense).init(device),
            dropout: DropoutConfig::new(cfg.dropout).init(),
            output: LinearConfig::new(cfg.dense, 5).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.reduce2.forward(self.reduce1.forward(x));
        let pooled = self.pool.forward(x);
        let [batch, channels, _, _] = pooled.dims();
        let x = pooled.reshape([batch, channels]);
        let x = self.dropout.forward(relu(self.dense.forward(x)));
        sigmoid(self.output.forward(x))
    }
}

/// Question-region detector: frozen backbone, feature pyramid, detection
/// head. Forward maps `[N, 3, H, W]` to `[N, 5]` rows of
/// `[x1, y1, x2, y2, confidence]` in [0,1].
#[derive(Debug, Module)]
pub struct QuestionDetector<B: Backend> {
    backbone: Backbone<B>,
    pyramid: FeaturePyramid<B>,
    head: DetectionHead<B>,
}

impl<B: Backend> QuestionDetector<B> {
    /// Build the detector graph from its configuration. The backbone comes
    /// out frozen; call [`Self::freeze_backbone`] again after loading
    /// warm-start weights.
    pub fn new(cfg: &QuestionDetectorConfig, device: &B::Device) -> Self {
        let backbone = Backbone::new(&cfg.backbone_channels, device);
        let c5 = cfg.backbone_channels.last().copied().unwrap_or(3);
        let pyramid = FeaturePyramid::new(c5, cfg.pyramid_channels, device);
        let head = DetectionHead::new(cfg, 3 * cfg.pyramid_channels, device);
        Self {
            backbone,
            pyramid,
            head,
        }
        .freeze_backbone()
    }

    /// Detach the backbone from gradient tracking.
    pub fn freeze_backbone(self) -> Self {
        Self {
            backbone: self.backbone.no_grad(),
            pyramid: self.pyramid,
            head: self.head,
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(images);
        let fused = self.pyramid.forward(features);
        self.head.forward(fused)
    }
}

pub mod prelude {
    pub use super::{QuestionDetector, QuestionDetectorConfig};
}

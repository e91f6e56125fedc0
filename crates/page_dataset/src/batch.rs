//! Batch collation into Burn tensors.

use crate::types::{DatasetError, DatasetResult, LabeledSample, PageTensor};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// One training or validation batch.
#[derive(Debug, Clone)]
pub struct DetectionBatch<B: Backend> {
    /// Page tensors, shape `[batch, 3, H, W]`.
    pub images: Tensor<B, 4>,
    /// Target box + confidence per page, shape `[batch, 5]`.
    pub targets: Tensor<B, 2>,
}

/// Assemble one batch. All samples must share the preprocessed shape.
pub fn collate<B: Backend>(
    samples: &[LabeledSample],
    device: &B::Device,
) -> DatasetResult<DetectionBatch<B>> {
    let Some(first) = samples.first() else {
        return Err(DatasetError::Other("cannot collate empty batch".to_string()));
    };
    let (width, height) = (first.tensor.width, first.tensor.height);

    let mut image_buf: Vec<f32> = Vec::with_capacity(samples.len() * first.tensor.data.len());
    let mut target_buf: Vec<f32> = Vec::with_capacity(samples.len() * 5);
    for sample in samples {
        if (sample.tensor.width, sample.tensor.height) != (width, height) {
            return Err(DatasetError::Other(format!(
                "image dimensions differ within batch: {:?} is {}x{}, expected {}x{}",
                sample.image, sample.tensor.width, sample.tensor.height, width, height
            )));
        }
        image_buf.extend_from_slice(&sample.tensor.data);
        target_buf.extend_from_slice(&sample.target);
    }

    let images = Tensor::<B, 1>::from_floats(image_buf.as_slice(), device).reshape([
        samples.len(),
        PageTensor::CHANNELS,
        height as usize,
        width as usize,
    ]);
    let targets =
        Tensor::<B, 1>::from_floats(target_buf.as_slice(), device).reshape([samples.len(), 5]);

    Ok(DetectionBatch { images, targets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    type TestBackend = burn_ndarray::NdArray<f32>;

    fn sample(width: u32, height: u32, fill: f32) -> LabeledSample {
        LabeledSample {
            image: PathBuf::from("synthetic.png"),
            tensor: PageTensor {
                data: vec![fill; (width * height * 3) as usize],
                width,
                height,
            },
            target: [0.1, 0.2, 0.3, 0.4, 1.0],
        }
    }

    #[test]
    fn collate_builds_expected_shapes() {
        let device = Default::default();
        let samples = vec![sample(8, 8, 0.5), sample(8, 8, 0.25)];
        let batch = collate::<TestBackend>(&samples, &device).unwrap();
        assert_eq!(batch.images.dims(), [2, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [2, 5]);
    }

    #[test]
    fn collate_rejects_empty_batches() {
        let device = Default::default();
        assert!(collate::<TestBackend>(&[], &device).is_err());
    }

    #[test]
    fn collate_rejects_mixed_shapes() {
        let device = Default::default();
        let samples = vec![sample(8, 8, 0.5), sample(4, 4, 0.5)];
        assert!(collate::<TestBackend>(&samples, &device).is_err());
    }
}

//! Composite detection loss.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Loss strategy consumed by the trainer: `(predictions, targets) -> scalar`.
/// Both tensors are `[batch, 5]` rows of `[x1, y1, x2, y2, confidence]`.
pub trait DetectionLoss {
    fn forward<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1>;
}

/// Squared error over the four box coordinates plus binary cross-entropy on
/// the confidence column. The two terms default to equal weight; the
/// weighting stays configurable rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct CompositeLoss {
    pub lambda_box: f32,
    pub lambda_conf: f32,
}

impl Default for CompositeLoss {
    fn default() -> Self {
        Self {
            lambda_box: 1.0,
            lambda_conf: 1.0,
        }
    }
}

impl DetectionLoss for CompositeLoss {
    fn forward<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let batch = predictions.dims()[0];

        let pred_boxes = predictions.clone().slice([0..batch, 0..4]);
        let target_boxes = targets.clone().slice([0..batch, 0..4]);
        let box_loss = (pred_boxes - target_boxes).powf_scalar(2.0).mean();

        let eps = 1e-6;
        let pred_conf = predictions.slice([0..batch, 4..5]).clamp(eps, 1.0 - eps);
        let target_conf = targets.slice([0..batch, 4..5]);
        let ones = Tensor::<B, 2>::ones(pred_conf.dims(), &pred_conf.device());
        let conf_loss = -((target_conf.clone() * pred_conf.clone().log())
            + ((ones.clone() - target_conf) * (ones - pred_conf).log()))
        .mean();

        box_loss * self.lambda_box + conf_loss * self.lambda_conf
    }
}

//! Epoch loop with early stopping and learning-rate decay.

use crate::loss::DetectionLoss;
use crate::TrainBackend;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use models::QuestionDetector;
use page_dataset::{collate, LabeledSample};

pub type ADBackend = Autodiff<TrainBackend>;

#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Initial learning rate.
    pub lr: f64,
    /// Epochs without validation improvement before training halts.
    pub patience: usize,
    /// Epochs without improvement before the learning rate decays.
    pub lr_patience: usize,
    /// Multiplier applied to the learning rate on plateau.
    pub lr_factor: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 16,
            lr: 1e-4,
            patience: 5,
            lr_patience: 3,
            lr_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub best_val_loss: f32,
    pub stopped_early: bool,
}

/// Train until max epochs or until validation loss stops improving for
/// `patience` epochs, whichever comes first, and return the best-observed
/// weights. One batch at a time; each step blocks until complete.
pub fn fit<L: DetectionLoss>(
    mut model: QuestionDetector<ADBackend>,
    loss: &L,
    train: &[LabeledSample],
    val: &[LabeledSample],
    cfg: &FitConfig,
) -> anyhow::Result<(QuestionDetector<ADBackend>, TrainReport)> {
    if train.is_empty() {
        anyhow::bail!("training set is empty");
    }
    if val.is_empty() {
        anyhow::bail!("validation set is empty");
    }

    let device = <ADBackend as Backend>::Device::default();
    let mut optim = AdamConfig::new().init();
    let batch_size = cfg.batch_size.max(1);

    let mut lr = cfg.lr;
    let mut best_val = f32::INFINITY;
    let mut best_model = model.clone();
    let mut epochs_since_best = 0usize;
    let mut epochs_since_decay = 0usize;
    let mut report = TrainReport {
        epochs_run: 0,
        best_val_loss: f32::INFINITY,
        stopped_early: false,
    };

    for epoch in 0..cfg.epochs {
        let mut losses = Vec::new();
        for chunk in train.chunks(batch_size) {
            let batch = collate::<ADBackend>(chunk, &device)?;
            let preds = model.forward(batch.images);
            let batch_loss = loss.forward(preds, batch.targets);
            let loss_detached = batch_loss.clone().detach();
            let grads = GradientsParams::from_grads(batch_loss.backward(), &model);
            model = optim.step(lr, model, grads);
            losses.push(scalar(loss_detached));
        }
        let train_loss = mean(&losses);

        let val_loss = validation_loss(&model.valid(), loss, val, batch_size)?;
        report.epochs_run = epoch + 1;
        tracing::info!(epoch, train_loss, val_loss, lr, "epoch complete");

        if val_loss < best_val {
            best_val = val_loss;
            best_model = model.clone();
            epochs_since_best = 0;
            epochs_since_decay = 0;
        } else {
            epochs_since_best += 1;
            epochs_since_decay += 1;
        }

        if epochs_since_decay >= cfg.lr_patience {
            lr *= cfg.lr_factor;
            epochs_since_decay = 0;
            tracing::info!(lr, "validation loss plateaued; decaying learning rate");
        }
        if epochs_since_best >= cfg.patience {
            tracing::info!(epoch, best_val, "early stopping; restoring best weights");
            report.stopped_early = true;
            break;
        }
    }

    report.best_val_loss = best_val;
    Ok((best_model, report))
}

/// Mean loss over the validation set, measured on the inner backend so
/// dropout and gradient tracking stay out of the picture.
fn validation_loss<L: DetectionLoss>(
    model: &QuestionDetector<TrainBackend>,
    loss: &L,
    val: &[LabeledSample],
    batch_size: usize,
) -> anyhow::Result<f32> {
    let device = <TrainBackend as Backend>::Device::default();
    let mut losses = Vec::new();
    for chunk in val.chunks(batch_size) {
        let batch = collate::<TrainBackend>(chunk, &device)?;
        let preds = model.forward(batch.images);
        losses.push(scalar(loss.forward(preds, batch.targets)));
    }
    Ok(mean(&losses))
}

fn scalar<B: Backend>(t: Tensor<B, 1>) -> f32 {
    t.into_data()
        .to_vec::<f32>()
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or(0.0)
}

fn mean(vals: &[f32]) -> f32 {
    if vals.is_empty() {
        0.0
    } else {
        vals.iter().sum::<f32>() / vals.len() as f32
    }
}

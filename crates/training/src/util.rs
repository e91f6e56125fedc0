//! Training orchestration and CLI arguments.

use crate::export::{export_quantized, EXPORT_PATH};
use crate::loss::CompositeLoss;
use crate::trainer::{fit, ADBackend, FitConfig};
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use clap::Parser;
use models::{QuestionDetector, QuestionDetectorConfig};
use page_dataset::{load_labeled_samples, load_manifest, split_samples, Preprocessor};
use std::fs;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Train the question-region detector and export the on-device artifact"
)]
pub struct TrainArgs {
    /// Training manifest produced by the annotator.
    #[arg(long, default_value = "data/annotations.json")]
    pub manifest: String,
    /// Directory holding the page images the manifest refers to.
    #[arg(long, default_value = "data/images")]
    pub images_dir: String,
    /// Square input resolution the detector is built for.
    #[arg(long, default_value_t = 640)]
    pub input_size: u32,
    /// Number of epochs.
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,
    /// Batch size.
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,
    /// Initial learning rate.
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,
    /// Epochs without validation improvement before early stopping.
    #[arg(long, default_value_t = 5)]
    pub patience: usize,
    /// Epochs without improvement before the learning rate decays.
    #[arg(long, default_value_t = 3)]
    pub lr_patience: usize,
    /// Multiplier applied to the learning rate on plateau.
    #[arg(long, default_value_t = 0.5)]
    pub lr_factor: f64,
    /// Fraction of samples held out for validation.
    #[arg(long, default_value_t = 0.2)]
    pub val_ratio: f32,
    /// Seed for the train/validation shuffle.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Loss weight for box regression.
    #[arg(long, default_value_t = 1.0)]
    pub lambda_box: f32,
    /// Loss weight for the confidence term.
    #[arg(long, default_value_t = 1.0)]
    pub lambda_conf: f32,
    /// Abort on the first unreadable image instead of skipping it.
    #[arg(long)]
    pub strict: bool,
    /// Warm-start weights from a prior checkpoint before training.
    #[arg(long)]
    pub init_from: Option<String>,
    /// Checkpoint output path for the best validation weights.
    #[arg(long, default_value = "checkpoints/question_detector.bin")]
    pub checkpoint_out: String,
    /// Quantized artifact output path.
    #[arg(long, default_value = EXPORT_PATH)]
    pub export_out: String,
}

pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let manifest_path = Path::new(&args.manifest);
    let entries = load_manifest(manifest_path).map_err(|e| {
        anyhow::anyhow!(
            "failed to load training manifest at {}: {e}",
            manifest_path.display()
        )
    })?;
    if entries.is_empty() {
        anyhow::bail!(
            "training manifest {} contains no records",
            manifest_path.display()
        );
    }

    let pre = Preprocessor::new((args.input_size, args.input_size));
    let samples = load_labeled_samples(Path::new(&args.images_dir), &entries, &pre, !args.strict)?;
    if samples.is_empty() {
        anyhow::bail!("no usable samples under {}", args.images_dir);
    }

    let (train, val) = split_samples(samples, args.val_ratio, args.seed);
    tracing::info!(train = train.len(), val = val.len(), "dataset split");

    let device = <ADBackend as Backend>::Device::default();
    let model_cfg = QuestionDetectorConfig {
        input_size: args.input_size as usize,
        ..Default::default()
    };
    let mut model = QuestionDetector::<ADBackend>::new(&model_cfg, &device);
    if let Some(ckpt) = &args.init_from {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        model = model
            .load_file(Path::new(ckpt), &recorder, &device)
            .map_err(|e| anyhow::anyhow!("failed to load checkpoint {ckpt}: {e}"))?
            .freeze_backbone();
    }

    let loss = CompositeLoss {
        lambda_box: args.lambda_box,
        lambda_conf: args.lambda_conf,
    };
    let fit_cfg = FitConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        lr: args.lr,
        patience: args.patience,
        lr_patience: args.lr_patience,
        lr_factor: args.lr_factor,
    };
    let (best, report) = fit(model, &loss, &train, &val, &fit_cfg)?;
    tracing::info!(
        epochs_run = report.epochs_run,
        best_val_loss = report.best_val_loss,
        stopped_early = report.stopped_early,
        "training finished"
    );

    let ckpt_path = Path::new(&args.checkpoint_out);
    if let Some(parent) = ckpt_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    best.clone()
        .save_file(ckpt_path, &recorder)
        .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
    tracing::info!(path = %ckpt_path.display(), "saved checkpoint");

    export_quantized(&best, Path::new(&args.export_out))?;
    tracing::info!(path = %args.export_out, "exported quantized artifact");
    Ok(())
}

//! Train/validation splitting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle and split: `val_ratio` of the samples land in the validation
/// set. At least one sample always stays in the training set. The split is
/// immutable once made; pass a seed for a reproducible shuffle.
pub fn split_samples<T>(
    mut samples: Vec<T>,
    val_ratio: f32,
    seed: Option<u64>,
) -> (Vec<T>, Vec<T>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    samples.shuffle(&mut rng);

    let val_len = ((samples.len() as f32) * val_ratio).round() as usize;
    let val_len = val_len.min(samples.len().saturating_sub(1));
    let train = samples.split_off(val_len);
    (train, samples)
}

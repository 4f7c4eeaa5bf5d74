use crate::errors::Result;
use crate::models::smoothers::SmootherKind;
use crate::utils::alloc::try_copied_vec;

/// Noise floor of a series and how many raw points stand above it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    pub values: Vec<f32>,
    pub no_noise_obs: usize,
}

/// Index of the clipping quantile after dropping the top `drop_top_x`
/// percent of `len` sorted points.
pub fn cutoff_position(len: usize, drop_top_x: f32) -> usize {
    if len == 0 {
        return 0;
    }
    let keep_frac = (100.0 - drop_top_x.clamp(0.0, 100.0)) / 101.0;
    let pos = (len as f32 * keep_frac).floor() as usize;
    pos.min(len - 1)
}

/// Estimates the baseline under `raw`.
///
/// Everything above the quantile left after dropping the top
/// `drop_top_x` percent of intensities is clipped to it, and the clipped
/// curve is smoothed with the gaussian kernel, whatever smoother the
/// series uses. Empty input gives an empty baseline.
pub fn estimate_baseline(raw: &[f32], window: usize, drop_top_x: f32) -> Result<Baseline> {
    if raw.is_empty() {
        return Ok(Baseline::default());
    }

    let mut sorted = try_copied_vec(raw)?;
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let qcut = sorted[cutoff_position(sorted.len(), drop_top_x)];

    let mut clipped = sorted;
    clipped.clear();
    clipped.extend(raw.iter().map(|x| x.min(qcut)));

    let values = SmootherKind::Gaussian.smooth_unclamped(&clipped, window)?;
    let no_noise_obs = raw
        .iter()
        .zip(values.iter())
        .filter(|(r, b)| r > b)
        .count();

    tracing::trace!(
        "Baseline qcut={} window={} no_noise_obs={}",
        qcut,
        window,
        no_noise_obs
    );
    Ok(Baseline {
        values,
        no_noise_obs,
    })
}

use crate::errors::Result;
use crate::utils::alloc::{
    try_copied_vec,
    try_filled_vec,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Scale of the ramp used by the gaussian kernel.
/// Cancels out after normalization but kept to make the weights readable.
const GAUSSIAN_Z_MAX: f32 = 3.0;
const SAVGOL_MAX_DEGREE: usize = 4;

/// Smoothing kernels available to turn raw intensities into a spline.
///
/// `MovingAverage` uses exactly `window` taps of `1 / window`. Even windows
/// lean one point towards the past (offsets `-window / 2..window / 2`).
///
/// NOTE: `Gaussian` is a linear distance ramp (zero weight at the center,
/// growing towards the edges), not a normal density. The name is kept
/// because settings files out in the wild use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmootherKind {
    MovingAverage,
    #[default]
    Gaussian,
    SavitzkyGolay,
}

impl SmootherKind {
    /// Smooths `raw`, returning a sequence of the same length.
    ///
    /// The window is clamped to a third of the sequence length and
    /// anything at or below 1 returns the input unchanged.
    pub fn smooth(&self, raw: &[f32], window: usize) -> Result<Vec<f32>> {
        let window = window.min(raw.len() / 3);
        self.smooth_unclamped(raw, window)
    }

    /// Same as [`SmootherKind::smooth`] without clamping the window to the
    /// sequence length. The baseline relies on this.
    pub fn smooth_unclamped(&self, raw: &[f32], window: usize) -> Result<Vec<f32>> {
        if window <= 1 || raw.is_empty() {
            return try_copied_vec(raw);
        }
        match self {
            SmootherKind::MovingAverage => convolve(raw, &vec![1.0 / window as f32; window]),
            SmootherKind::Gaussian => convolve(raw, &gaussian_ramp_weights(window)),
            SmootherKind::SavitzkyGolay => savitzky_golay(raw, window, SAVGOL_MAX_DEGREE),
        }
    }
}

/// Weights `|k| * z_max / (half + 1)` for offsets `k` in `-half..=half`.
pub fn gaussian_ramp_weights(window: usize) -> Vec<f32> {
    let half = window.saturating_sub(1) / 2;
    let delta = GAUSSIAN_Z_MAX / (half + 1) as f32;
    (0..=(2 * half))
        .map(|i| (i as f32 - half as f32).abs() * delta)
        .collect()
}

/// Convolution with the kernel centered on `weights.len() / 2`.
/// Near the edges only the in range weights are used, renormalized by their
/// sum. Points where that sum is zero keep their raw value.
fn convolve(raw: &[f32], weights: &[f32]) -> Result<Vec<f32>> {
    let half = (weights.len() / 2) as isize;
    let n = raw.len() as isize;
    let mut out = try_filled_vec(raw.len(), 0.0f32)?;
    for i in 0..n {
        let mut acc = 0.0f64;
        let mut wsum = 0.0f64;
        for (k, w) in weights.iter().enumerate() {
            let j = i + k as isize - half;
            if j < 0 || j >= n {
                continue;
            }
            acc += (*w as f64) * (raw[j as usize] as f64);
            wsum += *w as f64;
        }
        out[i as usize] = if wsum > 0.0 {
            (acc / wsum) as f32
        } else {
            raw[i as usize]
        };
    }
    Ok(out)
}

/// Local polynomial least squares using `half` points on each side.
/// Degree drops when fewer points are available near the edges.
fn savitzky_golay(raw: &[f32], half: usize, max_degree: usize) -> Result<Vec<f32>> {
    let n = raw.len();
    let scale = half as f64;
    let mut out = try_filled_vec(n, 0.0f32)?;
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half).min(n - 1);
        let npts = hi - lo + 1;
        let degree = max_degree.min(npts - 1);
        let xs = (lo..=hi).map(|j| (j as f64 - i as f64) / scale);
        let ys = raw[lo..=hi].iter().map(|y| *y as f64);
        out[i] = match fit_polynomial(xs.zip(ys), degree) {
            Some(coefs) => coefs[0] as f32,
            None => raw[i],
        };
    }
    Ok(out)
}

/// Least squares polynomial coefficients (constant term first) through the
/// normal equations. `None` when the system is singular.
fn fit_polynomial(points: impl Iterator<Item = (f64, f64)>, degree: usize) -> Option<Vec<f64>> {
    let m = degree + 1;
    let mut ata = vec![vec![0.0f64; m]; m];
    let mut aty = vec![0.0f64; m];
    for (x, y) in points {
        let mut powers = vec![1.0f64; 2 * m - 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * x;
        }
        for r in 0..m {
            aty[r] += powers[r] * y;
            for c in 0..m {
                ata[r][c] += powers[r + c];
            }
        }
    }
    solve_linear_system(ata, aty)
}

fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let m = b.len();
    for col in 0..m {
        let pivot = (col..m).max_by(|x, y| a[*x][col].abs().total_cmp(&a[*y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..m {
            let factor = a[row][col] / a[col][col];
            for c in col..m {
                a[row][c] -= factor * a[col][c];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0f64; m];
    for row in (0..m).rev() {
        let tail: f64 = ((row + 1)..m).map(|c| a[row][c] * x[c]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

//! Least squares fit of a unit-height gaussian to a peak profile.

/// Fit reported when the profile is too short or flat to say anything.
pub const UNFIT_SIGMA: f32 = 0.0;
pub const UNFIT_R2: f32 = 0.03;

const COARSE_STEP: f64 = 0.25;
const FINE_STEP: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussFit {
    pub sigma: f32,
    pub r2: f32,
}

impl Default for GaussFit {
    fn default() -> Self {
        Self {
            sigma: UNFIT_SIGMA,
            r2: UNFIT_R2,
        }
    }
}

fn sum_squared_residuals(x: &[f64], y: &[f64], sigma: f64) -> f64 {
    let two_s2 = 2.0 * sigma * sigma;
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| {
            let fx = (-xi * xi / two_s2).exp();
            (fx - yi).powi(2)
        })
        .sum()
}

/// Fits `exp(-x^2 / 2 sigma^2)` to `values`, which are assumed to be
/// centered on the apex (index `len / 2`).
///
/// Values are rescaled to [0, 1] before fitting. Sigma is searched on a
/// coarse grid over `(0, len]` and then refined around the best candidate.
/// R2 is the coefficient of determination, clamped to [0, 1].
pub fn gauss_fit(values: &[f32]) -> GaussFit {
    let n = values.len();
    if n < 3 {
        return GaussFit::default();
    }

    let ymin = values.iter().cloned().fold(f32::INFINITY, f32::min) as f64;
    let ymax = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let span = ymax - ymin;
    if !(span > 0.0) {
        return GaussFit::default();
    }

    let mid = (n / 2) as f64;
    let x: Vec<f64> = (0..n).map(|i| i as f64 - mid).collect();
    let y: Vec<f64> = values.iter().map(|v| (*v as f64 - ymin) / span).collect();

    let mut best_sigma = COARSE_STEP;
    let mut best_ssr = f64::INFINITY;
    let max_sigma = n as f64;

    let mut sigma = COARSE_STEP;
    while sigma <= max_sigma {
        let ssr = sum_squared_residuals(&x, &y, sigma);
        if ssr < best_ssr {
            best_ssr = ssr;
            best_sigma = sigma;
        }
        sigma += COARSE_STEP;
    }

    let lo = (best_sigma - COARSE_STEP).max(FINE_STEP);
    let hi = best_sigma + COARSE_STEP;
    let mut sigma = lo;
    while sigma <= hi {
        let ssr = sum_squared_residuals(&x, &y, sigma);
        if ssr < best_ssr {
            best_ssr = ssr;
            best_sigma = sigma;
        }
        sigma += FINE_STEP;
    }

    let ymean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|yi| (yi - ymean).powi(2)).sum();
    let r2 = if sst > 0.0 {
        (1.0 - best_ssr / sst).clamp(0.0, 1.0)
    } else {
        0.0
    };

    GaussFit {
        sigma: best_sigma as f32,
        r2: r2 as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_recovers_sigma() {
        let sigma = 2.0f64;
        let values: Vec<f32> = (-6..=6)
            .map(|i| {
                let x = i as f64;
                (1000.0 * (-x * x / (2.0 * sigma * sigma)).exp()) as f32
            })
            .collect();
        let fit = gauss_fit(&values);
        assert!((fit.sigma - 2.0).abs() < 0.1, "got {:?}", fit);
        assert!(fit.r2 > 0.99, "got {:?}", fit);
    }

    #[test]
    fn test_flat_profile_is_unfit() {
        let fit = gauss_fit(&[5.0; 7]);
        assert_eq!(fit, GaussFit::default());
    }

    #[test]
    fn test_short_profile_is_unfit() {
        assert_eq!(gauss_fit(&[1.0, 2.0]), GaussFit::default());
    }

    #[test]
    fn test_noise_fits_worse_than_gaussian() {
        let noisy = [3.0, 9.0, 1.0, 8.0, 2.0, 9.0, 1.0];
        let fit = gauss_fit(&noisy);
        assert!(fit.r2 < 0.5, "got {:?}", fit);
    }
}

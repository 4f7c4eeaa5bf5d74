use crate::utils::gauss_fit::{
    UNFIT_R2,
    UNFIT_SIGMA,
};
use crate::utils::math::check_overlap;
use serde::{
    Deserialize,
    Serialize,
};

/// A bounded candidate feature inside one series.
///
/// Indices point into the series the peak was detected on. Peaks are plain
/// values, anything that needs them across series copies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub sample_id: usize,

    pub apex_index: usize,
    pub min_index: usize,
    pub max_index: usize,

    pub rt: f32,
    pub rt_min: f32,
    pub rt_max: f32,

    pub peak_mz: f64,
    pub median_mz: f64,
    pub mean_mz: f64,
    pub mz_min: f64,
    pub mz_max: f64,

    pub scan: u32,
    pub min_scan: u32,
    pub max_scan: u32,

    /// Sum of raw intensities inside the bounds.
    pub peak_area: f32,
    /// Raw area minus baseline area.
    pub peak_area_corrected: f32,
    /// Mean of the apex and its two neighbors.
    pub peak_area_top: f32,
    /// Corrected area over the total intensity of the series.
    pub peak_area_fractional: f32,

    pub peak_intensity: f32,
    pub baseline_level: f32,

    pub width: usize,
    pub symmetry: f32,
    pub signal_baseline_ratio: f32,
    pub gauss_fit_sigma: f32,
    pub gauss_fit_r2: f32,

    pub no_noise_obs: usize,
    pub no_noise_fraction: f32,

    pub rank: usize,
    pub active: bool,

    /// Score against the template peak it was assigned to while grouping.
    pub group_score: f32,
}

impl Peak {
    pub fn new(sample_id: usize, apex_index: usize) -> Self {
        Self {
            sample_id,
            apex_index,
            min_index: apex_index,
            max_index: apex_index,
            rt: 0.0,
            rt_min: 0.0,
            rt_max: 0.0,
            peak_mz: 0.0,
            median_mz: 0.0,
            mean_mz: 0.0,
            mz_min: 0.0,
            mz_max: 0.0,
            scan: 0,
            min_scan: 0,
            max_scan: 0,
            peak_area: 0.0,
            peak_area_corrected: 0.0,
            peak_area_top: 0.0,
            peak_area_fractional: 0.0,
            peak_intensity: 0.0,
            baseline_level: 0.0,
            width: 0,
            symmetry: 0.0,
            signal_baseline_ratio: 0.0,
            gauss_fit_sigma: UNFIT_SIGMA,
            gauss_fit_r2: UNFIT_R2,
            no_noise_obs: 0,
            no_noise_fraction: 0.0,
            rank: 0,
            active: true,
            group_score: 0.0,
        }
    }

    /// Fractional overlap of the retention time windows of two peaks.
    pub fn overlap(&self, other: &Peak) -> f32 {
        check_overlap(self.rt_min, self.rt_max, other.rt_min, other.rt_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_peak_bounds() {
        let peak = Peak::new(2, 7);
        assert_eq!(peak.sample_id, 2);
        assert_eq!((peak.min_index, peak.apex_index, peak.max_index), (7, 7, 7));
        assert!(peak.active);
        assert_eq!(peak.gauss_fit_r2, UNFIT_R2);
    }

    #[test]
    fn test_peak_overlap() {
        let mut a = Peak::new(0, 0);
        a.rt_min = 1.0;
        a.rt_max = 3.0;
        let mut b = Peak::new(0, 0);
        b.rt_min = 2.0;
        b.rt_max = 4.0;
        assert!((a.overlap(&b) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(a.overlap(&b), b.overlap(&a));
    }
}

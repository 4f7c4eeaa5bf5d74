use super::{
    Eic,
    ProcessingStage,
};
use crate::models::eic::dedup::{
    rank_peaks,
    remove_overlapping_peaks,
};
use crate::models::peak::Peak;
use crate::utils::gauss_fit::{
    gauss_fit,
    GaussFit,
};
use crate::utils::math::median;
use crate::utils::shape_pattern::{
    classify_shape,
    longest_symmetry,
};

/// Floor for the denominator of the signal to baseline ratio.
const MIN_SIGNAL_BASELINE: f32 = 10.0;
/// Peaks narrower than this do not get a symmetry score.
const MIN_SYMMETRY_WIDTH: usize = 5;
/// Points needed on each side of the apex to attempt a gaussian fit.
const MIN_FIT_MOVES: usize = 3;

impl Eic {
    /// Resolves bounds and descriptors of every peak, then drops
    /// duplicates and ranks the survivors.
    pub fn compute_peak_statistics(&mut self) {
        let mut peaks = std::mem::take(&mut self.peaks);
        for peak in peaks.iter_mut() {
            self.find_peak_bounds(peak);
        }
        self.stage = ProcessingStage::BoundsResolved;

        for peak in peaks.iter_mut() {
            self.compute_peak_details(peak);
        }
        self.stage = ProcessingStage::StatisticsComputed;

        let before = peaks.len();
        remove_overlapping_peaks(&mut peaks);
        rank_peaks(&mut peaks);
        tracing::debug!(
            "Sample {} kept {} of {} peaks",
            self.series.sample_id(),
            peaks.len(),
            before
        );
        self.peaks = peaks;
        self.stage = ProcessingStage::Ranked;
    }

    /// Areas, m/z summary, shape and fit descriptors of a bounded peak.
    ///
    /// The apex is moved to the highest raw point between the bounds.
    pub fn compute_peak_details(&self, peak: &mut Peak) {
        let n = self.series.len();
        if n == 0 || peak.apex_index >= n || self.baseline.len() != n {
            return;
        }

        let raw = self.series.intensities();
        let baseline = &self.baseline;

        if peak.max_index >= n {
            peak.max_index = n - 1;
        }
        if peak.min_index > peak.max_index {
            peak.min_index = peak.apex_index.min(peak.max_index);
        }
        let (lo, hi) = (peak.min_index, peak.max_index);

        peak.peak_intensity = raw[peak.apex_index];
        peak.no_noise_obs = 0;
        peak.peak_area = 0.0;
        let mut baseline_area = 0.0f32;
        let mut mzs: Vec<f64> = Vec::with_capacity(hi - lo + 1);
        for j in lo..=hi {
            peak.peak_area += raw[j];
            baseline_area += baseline[j];
            if raw[j] > baseline[j] {
                peak.no_noise_obs += 1;
            }
            if raw[j] > peak.peak_intensity {
                peak.peak_intensity = raw[j];
                peak.apex_index = j;
            }
            let mz = self.series.mz_at(j);
            if mz > 0.0 {
                mzs.push(mz);
            }
        }
        let apex = peak.apex_index;
        let shape = classify_shape(&raw[lo..=hi], &baseline[lo..=hi]);

        peak.width = self.peak_width(peak);

        if self.series.has_retention_times() {
            let rts = self.series.retention_times();
            peak.rt = rts[apex];
            peak.rt_min = rts[lo];
            peak.rt_max = rts[hi];
        }
        if self.series.has_scans() {
            let scans = self.series.scans();
            peak.scan = scans[apex];
            peak.min_scan = scans[lo];
            peak.max_scan = scans[hi];
        }

        let mut top = raw[apex];
        let mut top_count = 1;
        if apex > 0 {
            top += raw[apex - 1];
            top_count += 1;
        }
        if apex + 1 < n {
            top += raw[apex + 1];
            top_count += 1;
        }
        peak.peak_area_top = top / top_count as f32;

        let max_baseline = baseline[apex]
            .max(MIN_SIGNAL_BASELINE)
            .max(raw[lo].max(raw[hi]));
        peak.peak_mz = self.series.mz_at(apex);
        peak.baseline_level = baseline[apex];
        peak.no_noise_fraction = peak.no_noise_obs as f32 / (self.no_noise_obs + 1) as f32;
        peak.peak_area_corrected = peak.peak_area - baseline_area;
        peak.peak_area_fractional =
            peak.peak_area_corrected / (self.series.total_intensity() + 1.0);
        peak.signal_baseline_ratio = peak.peak_intensity / max_baseline;

        if let Some(med) = median(&mzs) {
            peak.median_mz = med;
            peak.mean_mz = mzs.iter().sum::<f64>() / mzs.len() as f64;
            peak.mz_min = mzs.iter().cloned().fold(f64::MAX, f64::min);
            peak.mz_max = mzs.iter().cloned().fold(f64::MIN, f64::max);
        }
        if peak.median_mz == 0.0 {
            peak.median_mz = peak.peak_mz;
        }

        peak.symmetry = if peak.width >= MIN_SYMMETRY_WIDTH {
            longest_symmetry(&shape) as f32
        } else {
            0.0
        };
        self.check_gaussian_fit(peak);
    }

    /// Contiguous above baseline points around the apex, apex included.
    /// The walk never leaves the peak bounds.
    pub fn peak_width(&self, peak: &Peak) -> usize {
        let raw = self.series.intensities();
        let baseline = &self.baseline;
        let n = raw.len();
        if peak.apex_index >= n || baseline.len() != n {
            return 0;
        }
        let apex = peak.apex_index;
        let left = (peak.min_index..apex)
            .rev()
            .take_while(|i| raw[*i] > baseline[*i])
            .count();
        let right = ((apex + 1)..=peak.max_index.min(n - 1))
            .take_while(|i| raw[*i] > baseline[*i])
            .count();
        1 + left + right
    }

    /// Fits a gaussian to the raw points around the apex.
    /// Peaks with fewer than three points on either side keep the unfit
    /// defaults.
    pub fn check_gaussian_fit(&self, peak: &mut Peak) {
        let fit = self.gaussian_fit_for(peak);
        peak.gauss_fit_sigma = fit.sigma;
        peak.gauss_fit_r2 = fit.r2;
    }

    fn gaussian_fit_for(&self, peak: &Peak) -> GaussFit {
        let raw = self.series.intensities();
        let n = raw.len();
        let apex = peak.apex_index;
        if apex >= n || peak.min_index >= apex || peak.max_index <= apex {
            return GaussFit::default();
        }
        let moves = (apex - peak.min_index).min(peak.max_index - apex);
        if moves < MIN_FIT_MOVES {
            return GaussFit::default();
        }
        let lo = apex - moves;
        let hi = (apex + moves).min(n - 1);
        gauss_fit(&raw[lo..=hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::eic::tests::bump_series;
    use crate::models::series::Series;
    use crate::models::settings::EicSettings;
    use crate::utils::gauss_fit::{
        UNFIT_R2,
        UNFIT_SIGMA,
    };

    fn gaussian_series(sigma: f32, height: f32) -> Series {
        let n = 40;
        let intensities: Vec<f32> = (0..n)
            .map(|i| {
                let x = i as f32 - 20.0;
                height * (-x * x / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let rts = (0..n).map(|i| i as f32 * 0.05).collect();
        Series::new(
            1,
            (100..100 + n as u32).collect(),
            rts,
            intensities,
            vec![250.0; n],
        )
        .unwrap()
    }

    #[test]
    fn test_bump_details() {
        let mut eic = Eic::new(bump_series(), EicSettings::default());
        eic.detect_peaks(1).unwrap();
        let peak = &eic.peaks()[0];
        assert_eq!(peak.peak_area_corrected, 14.0);
        // Total intensity is 14.
        assert!((peak.peak_area_fractional - 14.0 / 15.0).abs() < 1e-6);
        assert!((peak.peak_area_top - 4.0).abs() < 1e-6);
        assert!((peak.signal_baseline_ratio - 0.6).abs() < 1e-6);
        assert_eq!(peak.no_noise_obs, 5);
        assert!((peak.no_noise_fraction - 5.0 / 6.0).abs() < 1e-6);
        assert_eq!(peak.median_mz, 100.0);
        assert_eq!(peak.mz_min, 100.0);
        assert_eq!(peak.mz_max, 100.0);
        assert!((peak.rt_min - 0.1).abs() < 1e-6);
        assert!((peak.rt_max - 0.5).abs() < 1e-6);
        assert_eq!(peak.scan, 3);
        // Two points each side is too few to fit.
        assert_eq!(peak.gauss_fit_sigma, UNFIT_SIGMA);
        assert_eq!(peak.gauss_fit_r2, UNFIT_R2);
    }

    #[test]
    fn test_gaussian_peak_fits_well() {
        let mut eic = Eic::new(gaussian_series(3.0, 1000.0), EicSettings::default());
        eic.detect_peaks(1).unwrap();
        let peak = eic
            .peaks()
            .iter()
            .find(|p| p.apex_index == 20)
            .expect("apex at the center");
        assert!(peak.min_index < 17 && peak.max_index > 23);
        assert!(peak.gauss_fit_r2 > 0.9, "r2 = {}", peak.gauss_fit_r2);
        assert!((peak.gauss_fit_sigma - 3.0).abs() < 0.5);
        assert!(peak.symmetry >= 4.0);
        assert_eq!(peak.scan, 120);
        assert_eq!(peak.rank, 0);
    }

    #[test]
    fn test_apex_invariant_holds() {
        let intensities = vec![
            0.0, 1.0, 4.0, 3.0, 5.0, 9.0, 2.0, 1.0, 0.0, 3.0, 8.0, 8.0, 2.0, 0.0, 0.0,
        ];
        let n = intensities.len();
        let series =
            Series::from_rt_intensity(0, (0..n).map(|x| x as f32).collect(), intensities, 10.0)
                .unwrap();
        let mut eic = Eic::new(series, EicSettings::default());
        eic.detect_peaks(1).unwrap();
        assert!(!eic.peaks().is_empty());
        for peak in eic.peaks() {
            assert!(peak.min_index <= peak.apex_index);
            assert!(peak.apex_index <= peak.max_index);
        }
    }

    #[test]
    fn test_width_stops_at_baseline() {
        let mut eic = Eic::new(bump_series(), EicSettings::default());
        eic.compute_spline(1).unwrap();
        eic.compute_baseline().unwrap();
        let mut peak = Peak::new(0, 3);
        peak.min_index = 0;
        peak.max_index = 9;
        // Points 0 and 6 are at the (zero) baseline.
        assert_eq!(eic.peak_width(&peak), 5);
    }
}

pub mod bounds;
pub mod dedup;
pub mod detection;
pub mod statistics;

use crate::errors::Result;
use crate::models::baseline::estimate_baseline;
use crate::models::peak::Peak;
use crate::models::series::Series;
use crate::models::settings::EicSettings;
use crate::models::window::ExtractionWindow;
use crate::utils::alloc::try_copied_vec;
use serde::Serialize;

pub use dedup::{
    rank_peaks,
    remove_overlapping_peaks,
};
pub use detection::find_apexes;

/// Last step the processor went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ProcessingStage {
    Raw,
    Splined,
    Baselined,
    Detected,
    BoundsResolved,
    StatisticsComputed,
    Ranked,
}

/// A single point of a series, as handed to downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EicPoint {
    pub rt: f32,
    pub intensity: f32,
    pub mz: f64,
}

/// Extracted ion chromatogram processor.
///
/// Owns one series and everything derived from it. Every stage clears what
/// it produced on the previous run before recomputing it.
#[derive(Debug, Clone)]
pub struct Eic {
    series: Series,
    settings: EicSettings,
    spline: Vec<f32>,
    baseline: Vec<f32>,
    no_noise_obs: usize,
    peaks: Vec<Peak>,
    stage: ProcessingStage,
}

impl Eic {
    pub fn new(series: Series, settings: EicSettings) -> Self {
        Self {
            series,
            settings,
            spline: Vec::new(),
            baseline: Vec::new(),
            no_noise_obs: 0,
            peaks: Vec::new(),
            stage: ProcessingStage::Raw,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn settings(&self) -> &EicSettings {
        &self.settings
    }

    pub fn sample_id(&self) -> usize {
        self.series.sample_id()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn spline(&self) -> &[f32] {
        &self.spline
    }

    pub fn baseline(&self) -> &[f32] {
        &self.baseline
    }

    /// Points of the series above the baseline.
    pub fn no_noise_obs(&self) -> usize {
        self.no_noise_obs
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn into_peaks(self) -> Vec<Peak> {
        self.peaks
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    /// Smooths the raw intensities with the configured kernel.
    pub fn compute_spline(&mut self, window: usize) -> Result<()> {
        self.spline.clear();
        let raw = self.series.intensities();
        if raw.is_empty() {
            return Ok(());
        }

        self.spline = self.settings.smoother.smooth(raw, window)?;
        self.stage = ProcessingStage::Splined;
        Ok(())
    }

    /// Estimates the baseline with the configured window and drop fraction.
    pub fn compute_baseline(&mut self) -> Result<()> {
        self.compute_baseline_with(
            self.settings.baseline_smoothing_window,
            self.settings.baseline_drop_top_x,
        )
    }

    pub fn compute_baseline_with(&mut self, window: usize, drop_top_x: f32) -> Result<()> {
        self.baseline.clear();
        self.no_noise_obs = 0;
        if self.series.is_empty() {
            return Ok(());
        }

        let baseline = estimate_baseline(self.series.intensities(), window, drop_top_x)?;
        self.baseline = baseline.values;
        self.no_noise_obs = baseline.no_noise_obs;
        self.stage = ProcessingStage::Baselined;
        Ok(())
    }

    /// Runs detection with the smoothing window from the settings.
    pub fn process(&mut self) -> Result<()> {
        self.detect_peaks(self.settings.smoothing_window)
    }

    /// Raw intensities minus the baseline, clamped at zero, together with
    /// the number of points left positive. Empty if there is no baseline.
    pub fn baseline_subtracted(&self) -> (Vec<f32>, usize) {
        if self.baseline.is_empty() {
            tracing::warn!("Baseline subtraction requested without a baseline");
            return (Vec::new(), 0);
        }
        let out: Vec<f32> = self
            .series
            .intensities()
            .iter()
            .zip(self.baseline.iter())
            .map(|(x, b)| (x - b).max(0.0))
            .collect();
        let positive = out.iter().filter(|x| **x > 0.0).count();
        (out, positive)
    }

    /// Raw intensities with every run of zeros between two nonzero points
    /// replaced by the straight line joining them. Leading and trailing
    /// zeros are left alone.
    pub fn interpolated(&self) -> Result<Vec<f32>> {
        let mut out = try_copied_vec(self.series.intensities())?;
        let mut last_nonzero: Option<usize> = None;
        for i in 0..out.len() {
            if out[i] == 0.0 {
                continue;
            }
            if let Some(prev) = last_nonzero {
                let (from, to) = (out[prev], out[i]);
                let gap = (i - prev) as f32;
                for j in (prev + 1)..i {
                    out[j] = from + (to - from) * (j - prev) as f32 / gap;
                }
            }
            last_nonzero = Some(i);
        }
        Ok(out)
    }

    /// Points between the bounds of `peak`, both ends included.
    pub fn intensity_vector(&self, peak: &Peak) -> Vec<EicPoint> {
        let n = self.series.len();
        if n == 0 || peak.min_index >= n {
            return Vec::new();
        }
        let hi = peak.max_index.min(n - 1);
        let rts = self.series.retention_times();
        (peak.min_index..=hi)
            .map(|i| EicPoint {
                rt: rts.get(i).copied().unwrap_or(0.0),
                intensity: self.series.intensities()[i],
                mz: self.series.mz_at(i),
            })
            .collect()
    }

    /// The retention time and m/z window this series covers.
    pub fn fragment_window(&self, id: u64) -> ExtractionWindow {
        ExtractionWindow {
            id,
            mz_range: self.series.mz_range(),
            rt_range: self.series.rt_range(),
        }
    }

    pub fn summary(&self) {
        let (mz_min, mz_max) = self.series.mz_range();
        let (rt_min, rt_max) = self.series.rt_range();
        tracing::info!(
            "EIC sample={} mz={:.4}-{:.4} rt={:.3}-{:.3} max_intensity={} peaks={}",
            self.series.sample_id(),
            mz_min,
            mz_max,
            rt_min,
            rt_max,
            self.series.max_intensity(),
            self.peaks.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn bump_series() -> Series {
        let intensities = vec![0.0, 1.0, 3.0, 6.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let rts = (0..intensities.len()).map(|x| x as f32 * 0.1).collect();
        Series::from_rt_intensity(0, rts, intensities, 100.0).unwrap()
    }

    #[test]
    fn test_spline_recompute_replaces() {
        let mut eic = Eic::new(bump_series(), EicSettings::default());
        eic.compute_spline(1).unwrap();
        assert_eq!(eic.spline(), eic.series().intensities());
        eic.compute_spline(3).unwrap();
        assert_eq!(eic.spline().len(), 10);
        assert_eq!(eic.stage(), ProcessingStage::Splined);
    }

    #[test]
    fn test_empty_series_is_noop() {
        let mut eic = Eic::new(Series::empty(0), EicSettings::default());
        eic.compute_spline(5).unwrap();
        eic.compute_baseline().unwrap();
        assert!(eic.spline().is_empty());
        assert!(eic.baseline().is_empty());
        assert_eq!(eic.stage(), ProcessingStage::Raw);
        assert_eq!(eic.baseline_subtracted(), (Vec::new(), 0));
    }

    #[test]
    fn test_baseline_subtracted() {
        let series =
            Series::from_rt_intensity(0, vec![0.0, 1.0, 2.0], vec![5.0, 1.0, 3.0], 100.0).unwrap();
        let mut eic = Eic::new(series, EicSettings::default());
        eic.compute_baseline_with(1, 60.0).unwrap();
        // qcut is the value at position 1 of [1, 3, 5]
        assert_eq!(eic.baseline(), &[3.0, 1.0, 3.0]);
        let (subtracted, positive) = eic.baseline_subtracted();
        assert_eq!(subtracted, vec![2.0, 0.0, 0.0]);
        assert_eq!(positive, 1);
        // Series is untouched.
        assert_eq!(eic.series().intensities(), &[5.0, 1.0, 3.0]);
    }

    #[test]
    fn test_interpolated_fills_inner_gaps() {
        let series = Series::from_rt_intensity(
            0,
            (0..8).map(|x| x as f32).collect(),
            vec![0.0, 2.0, 0.0, 0.0, 8.0, 5.0, 0.0, 0.0],
            100.0,
        )
        .unwrap();
        let eic = Eic::new(series, EicSettings::default());
        let filled = eic.interpolated().unwrap();
        assert_eq!(filled, vec![0.0, 2.0, 4.0, 6.0, 8.0, 5.0, 0.0, 0.0]);
        assert_eq!(eic.series().intensities()[2], 0.0);
        assert!(Eic::new(Series::empty(0), EicSettings::default())
            .interpolated()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fragment_window() {
        let eic = Eic::new(bump_series(), EicSettings::default());
        let window = eic.fragment_window(4);
        assert_eq!(window.id, 4);
        assert_eq!(window.mz_range, (100.0, 100.0));
        assert!((window.rt_range.1 - 0.9).abs() < 1e-6);
    }
}

use super::{
    Eic,
    ProcessingStage,
};
use crate::errors::Result;
use crate::models::peak::Peak;

/// Local maxima of a smoothed curve.
///
/// An index is an apex when it is strictly higher than both neighbors. A
/// rise onto a plateau is followed until the curve changes: if it keeps
/// rising the plateau is part of a slope, if it drops the apex is the last
/// plateau point. Points under `threshold` are never apexes.
pub fn find_apexes(spline: &[f32], threshold: Option<f32>) -> Vec<usize> {
    let n = spline.len();
    let mut out = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if let Some(threshold) = threshold {
            if spline[i] < threshold {
                i += 1;
                continue;
            }
        }

        if spline[i] > spline[i - 1] && spline[i] > spline[i + 1] {
            out.push(i);
        } else if spline[i] > spline[i - 1] && spline[i] == spline[i + 1] {
            let highpoint = spline[i];
            while i + 2 < n {
                i += 1;
                let next = spline[i + 1];
                if next == highpoint {
                    continue;
                }
                if next < highpoint {
                    out.push(i);
                }
                break;
            }
        }
        i += 1;
    }
    out
}

impl Eic {
    /// Full per series pipeline: spline, apexes, baseline, bounds,
    /// statistics, deduplication and ranking.
    pub fn detect_peaks(&mut self, smoothing_window: usize) -> Result<()> {
        self.detect_peaks_impl(smoothing_window, None)
    }

    /// Same as [`Eic::detect_peaks`] but ignores apexes whose smoothed
    /// intensity is under `threshold`. The apex retention time is
    /// recorded as soon as the peak is created.
    pub fn detect_peaks_above(&mut self, smoothing_window: usize, threshold: f32) -> Result<()> {
        self.detect_peaks_impl(smoothing_window, Some(threshold))
    }

    fn detect_peaks_impl(&mut self, smoothing_window: usize, threshold: Option<f32>) -> Result<()> {
        self.peaks.clear();
        if self.series.is_empty() {
            tracing::debug!("Skipping detection on empty series");
            return Ok(());
        }

        self.compute_spline(smoothing_window)?;
        if self.spline.is_empty() {
            return Ok(());
        }

        let sample_id = self.series.sample_id();
        let rts = self.series.retention_times();
        let apexes = find_apexes(&self.spline, threshold);
        self.peaks.reserve(apexes.len());
        for apex in apexes {
            let mut peak = Peak::new(sample_id, apex);
            if threshold.is_some() {
                if let Some(rt) = rts.get(apex) {
                    peak.rt = *rt;
                }
            }
            self.peaks.push(peak);
        }
        self.stage = ProcessingStage::Detected;
        tracing::debug!(
            "Sample {} found {} apexes",
            sample_id,
            self.peaks.len()
        );

        self.compute_baseline()?;
        self.compute_peak_statistics();
        Ok(())
    }
}

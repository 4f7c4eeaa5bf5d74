use crate::models::peak::Peak;
use crate::utils::running_stats::RunningStatsCalculator;
use nohash_hasher::IntMap;
use serde::{
    Deserialize,
    Serialize,
};
use std::cmp::Ordering;

/// A consensus feature across samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakGroup {
    pub group_id: usize,
    pub rank: usize,
    pub peaks: Vec<Peak>,

    pub mean_rt: f32,
    pub rt_std: f32,
    pub min_rt: f32,
    pub max_rt: f32,
    pub mean_mz: f64,
    pub min_mz: f64,
    pub max_mz: f64,

    pub max_intensity: f32,
    pub sample_count: usize,
    pub max_no_noise_obs: usize,
    pub max_peak_fractional_area: f32,
    pub max_signal_baseline_ratio: f32,
}

impl PeakGroup {
    pub fn new(group_id: usize) -> Self {
        Self {
            group_id,
            rank: 0,
            peaks: Vec::new(),
            mean_rt: 0.0,
            rt_std: 0.0,
            min_rt: 0.0,
            max_rt: 0.0,
            mean_mz: 0.0,
            min_mz: 0.0,
            max_mz: 0.0,
            max_intensity: 0.0,
            sample_count: 0,
            max_no_noise_obs: 0,
            max_peak_fractional_area: 0.0,
            max_signal_baseline_ratio: 0.0,
        }
    }

    pub fn add_peak(&mut self, peak: Peak) {
        self.peaks.push(peak);
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    /// Whether no two member peaks come from the same sample.
    pub fn has_unique_samples(&self) -> bool {
        let mut seen = nohash_hasher::IntSet::<usize>::default();
        self.peaks.iter().all(|p| seen.insert(p.sample_id))
    }

    pub fn sample_peak(&self, sample_id: usize) -> Option<&Peak> {
        self.peaks.iter().find(|p| p.sample_id == sample_id)
    }

    /// Keeps a single peak per sample, the one with the highest
    /// `group_score`. Ties keep the peak that came first.
    pub fn reduce(&mut self) {
        let mut best: IntMap<usize, usize> = IntMap::default();
        for (i, peak) in self.peaks.iter().enumerate() {
            match best.get(&peak.sample_id) {
                Some(&j) if self.peaks[j].group_score >= peak.group_score => {}
                _ => {
                    best.insert(peak.sample_id, i);
                }
            }
        }
        if best.len() == self.peaks.len() {
            return;
        }
        let keep: nohash_hasher::IntSet<usize> = best.into_values().collect();
        let before = self.peaks.len();
        let mut idx = 0;
        self.peaks.retain(|_| {
            let out = keep.contains(&idx);
            idx += 1;
            out
        });
        tracing::trace!(
            "Group {} reduced from {} to {} peaks",
            self.group_id,
            before,
            self.peaks.len()
        );
    }

    /// Recomputes every aggregate from the member peaks.
    pub fn compute_statistics(&mut self) {
        let group_id = self.group_id;
        let rank = self.rank;
        let peaks = std::mem::take(&mut self.peaks);
        *self = Self::new(group_id);
        self.rank = rank;
        if peaks.is_empty() {
            return;
        }

        let mut rt_stats = RunningStatsCalculator::new();
        let mut mz_stats = RunningStatsCalculator::new();
        let mut samples = nohash_hasher::IntSet::<usize>::default();
        for peak in peaks.iter() {
            rt_stats.add(peak.rt as f64, 1.0);
            if peak.median_mz > 0.0 {
                mz_stats.add(peak.median_mz, 1.0);
            }
            samples.insert(peak.sample_id);

            self.max_intensity = self.max_intensity.max(peak.peak_intensity);
            self.max_no_noise_obs = self.max_no_noise_obs.max(peak.no_noise_obs);
            self.max_peak_fractional_area =
                self.max_peak_fractional_area.max(peak.peak_area_fractional);
            self.max_signal_baseline_ratio =
                self.max_signal_baseline_ratio.max(peak.signal_baseline_ratio);
        }

        self.sample_count = samples.len();
        self.mean_rt = rt_stats.mean().unwrap_or(0.0) as f32;
        self.rt_std = rt_stats.standard_deviation().unwrap_or(0.0) as f32;
        self.min_rt = rt_stats.min().unwrap_or(0.0) as f32;
        self.max_rt = rt_stats.max().unwrap_or(0.0) as f32;
        self.mean_mz = mz_stats.mean().unwrap_or(0.0);
        self.min_mz = mz_stats.min().unwrap_or(0.0);
        self.max_mz = mz_stats.max().unwrap_or(0.0);
        self.peaks = peaks;
    }
}

fn by_intensity_desc(a: &PeakGroup, b: &PeakGroup) -> Ordering {
    b.max_intensity
        .partial_cmp(&a.max_intensity)
        .unwrap_or(Ordering::Equal)
}

/// Ranks groups by descending max intensity without reordering them.
pub fn rank_groups(groups: &mut [PeakGroup]) {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|a, b| by_intensity_desc(&groups[*a], &groups[*b]));
    for (rank, idx) in order.into_iter().enumerate() {
        groups[idx].rank = rank;
    }
}

/// Keeps the `limit` most intense groups, sorted by intensity.
/// Lists already within the limit are left alone.
pub fn remove_low_rank_groups(groups: &mut Vec<PeakGroup>, limit: usize) {
    if groups.len() <= limit {
        return;
    }
    groups.sort_by(by_intensity_desc);
    groups.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(sample_id: usize, rt: f32, intensity: f32, score: f32) -> Peak {
        let mut peak = Peak::new(sample_id, 0);
        peak.rt = rt;
        peak.peak_intensity = intensity;
        peak.group_score = score;
        peak.median_mz = 100.0 + sample_id as f64;
        peak
    }

    fn group_with(id: usize, intensities: &[f32]) -> PeakGroup {
        let mut group = PeakGroup::new(id);
        for (i, x) in intensities.iter().enumerate() {
            group.add_peak(peak(i, 1.0, *x, 0.0));
        }
        group.compute_statistics();
        group
    }

    #[test]
    fn test_statistics() {
        let mut group = PeakGroup::new(3);
        group.add_peak(peak(0, 10.0, 50.0, 1.0));
        group.add_peak(peak(1, 12.0, 80.0, 1.0));
        group.compute_statistics();
        assert_eq!(group.group_id, 3);
        assert_eq!(group.sample_count, 2);
        assert!((group.mean_rt - 11.0).abs() < 1e-6);
        assert!((group.rt_std - 1.0).abs() < 1e-6);
        assert_eq!((group.min_rt, group.max_rt), (10.0, 12.0));
        assert!((group.mean_mz - 100.5).abs() < 1e-9);
        assert_eq!(group.max_intensity, 80.0);
        assert_eq!(group.peak_count(), 2);
    }

    #[test]
    fn test_reduce_keeps_best_score_per_sample() {
        let mut group = PeakGroup::new(0);
        group.add_peak(peak(0, 10.0, 50.0, 1.0));
        group.add_peak(peak(1, 10.1, 60.0, 2.0));
        group.add_peak(peak(0, 10.2, 70.0, 3.0));
        group.add_peak(peak(1, 10.3, 80.0, 2.0));
        assert!(!group.has_unique_samples());
        group.reduce();
        assert!(group.has_unique_samples());
        assert_eq!(group.peak_count(), 2);
        assert_eq!(group.sample_peak(0).unwrap().peak_intensity, 70.0);
        // Tie keeps the earlier peak.
        assert_eq!(group.sample_peak(1).unwrap().peak_intensity, 60.0);
        // Order is preserved.
        assert_eq!(group.peaks[0].sample_id, 1);
    }

    #[test]
    fn test_rank_and_trim_groups() {
        let mut groups = vec![
            group_with(0, &[10.0]),
            group_with(1, &[30.0, 5.0]),
            group_with(2, &[20.0]),
        ];
        rank_groups(&mut groups);
        assert_eq!(
            groups.iter().map(|g| g.rank).collect::<Vec<_>>(),
            vec![2, 0, 1]
        );

        remove_low_rank_groups(&mut groups, 5);
        assert_eq!(groups.len(), 3);
        remove_low_rank_groups(&mut groups, 2);
        assert_eq!(
            groups.iter().map(|g| g.group_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_empty_group_statistics() {
        let mut group = PeakGroup::new(1);
        group.compute_statistics();
        assert!(group.is_empty());
        assert_eq!(group.sample_count, 0);
    }
}

pub mod linkage;
pub mod template;

use crate::errors::Result;
use crate::models::eic::Eic;
use crate::models::peak_group::{
    rank_groups,
    remove_low_rank_groups,
    PeakGroup,
};
use crate::models::settings::{
    GroupingSettings,
    GroupingStrategy,
};
use std::cmp::Ordering;

pub use linkage::group_by_linkage;
pub use template::group_by_template;

/// Clusters the peaks of many per sample processors into consensus groups
/// with the configured strategy.
///
/// The template strategy uses the peaks already detected on every
/// processor, the linkage strategy re-runs thresholded detection itself.
pub fn group_peaks(eics: &mut [Eic], settings: &GroupingSettings) -> Result<Vec<PeakGroup>> {
    let mut groups = match settings.strategy {
        GroupingStrategy::TemplateScored => {
            group_by_template(eics, settings.smoothing_window, settings.max_rt_diff)?
        }
        GroupingStrategy::SingleLinkage => group_by_linkage(
            eics,
            settings.smoothing_window,
            settings.max_rt_diff,
            settings.noise_threshold,
            settings.linkage_join,
        )?,
    };

    if let Some(limit) = settings.max_groups {
        remove_low_rank_groups(&mut groups, limit);
    }
    tracing::info!(
        "Grouped peaks of {} series into {} groups",
        eics.len(),
        groups.len()
    );
    Ok(groups)
}

/// Every peak of a lone series becomes its own group.
pub(crate) fn singleton_groups(eic: &Eic) -> Vec<PeakGroup> {
    let groups = eic
        .peaks()
        .iter()
        .enumerate()
        .map(|(i, peak)| {
            let mut group = PeakGroup::new(i);
            group.add_peak(peak.clone());
            group
        })
        .collect();
    finalize_groups(groups)
}

/// Drops empty groups, computes statistics, orders by retention time,
/// renumbers and ranks.
pub(crate) fn finalize_groups(groups: Vec<PeakGroup>) -> Vec<PeakGroup> {
    let mut groups: Vec<PeakGroup> = groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|mut g| {
            g.compute_statistics();
            g
        })
        .collect();
    groups.sort_by(|a, b| a.mean_rt.partial_cmp(&b.mean_rt).unwrap_or(Ordering::Equal));
    for (i, group) in groups.iter_mut().enumerate() {
        group.group_id = i;
    }
    rank_groups(&mut groups);
    groups
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::series::Series;
    use crate::models::settings::{
        EicSettings,
        LinkageJoinPolicy,
    };

    /// Triangular peak centered at `rt_offset + 1.0` on a 0.1 grid.
    pub(crate) fn triangle_eic(sample_id: usize, rt_offset: f32, scale: f32) -> Eic {
        let rts: Vec<f32> = (0..21).map(|j| rt_offset + 0.1 * j as f32).collect();
        let intensities: Vec<f32> = (0..21)
            .map(|j| scale * (100.0 - 30.0 * (j as f32 - 10.0).abs()).max(0.0))
            .collect();
        let series = Series::from_rt_intensity(sample_id, rts, intensities, 200.0).unwrap();
        let settings = EicSettings {
            smoothing_window: 1,
            ..Default::default()
        };
        Eic::new(series, settings)
    }

    pub(crate) fn two_close_samples() -> Vec<Eic> {
        let mut eics = vec![triangle_eic(0, 9.0, 1.0), triangle_eic(1, 9.05, 0.9)];
        for eic in eics.iter_mut() {
            eic.process().unwrap();
        }
        eics
    }

    fn settings(strategy: GroupingStrategy) -> GroupingSettings {
        GroupingSettings {
            strategy,
            smoothing_window: 1,
            max_rt_diff: 0.2,
            noise_threshold: 0.0,
            linkage_join: LinkageJoinPolicy::RespectSampleExclusion,
            max_groups: None,
        }
    }

    #[test]
    fn test_both_strategies_group_close_peaks() {
        for strategy in [GroupingStrategy::TemplateScored, GroupingStrategy::SingleLinkage] {
            let mut eics = two_close_samples();
            let groups = group_peaks(&mut eics, &settings(strategy)).unwrap();
            assert_eq!(groups.len(), 1, "{:?}", strategy);
            assert_eq!(groups[0].peak_count(), 2);
            assert_eq!(groups[0].sample_count, 2);
            assert!(groups[0].has_unique_samples());
        }
    }

    #[test]
    fn test_empty_input() {
        for strategy in [GroupingStrategy::TemplateScored, GroupingStrategy::SingleLinkage] {
            let groups = group_peaks(&mut [], &settings(strategy)).unwrap();
            assert!(groups.is_empty());
        }
    }

    #[test]
    fn test_single_series_singletons() {
        let mut eic = triangle_eic(0, 9.0, 1.0);
        eic.process().unwrap();
        let mut eics = vec![eic];
        let groups = group_peaks(&mut eics, &settings(GroupingStrategy::TemplateScored)).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].peak_count(), 1);
        assert_eq!(groups[0].group_id, 0);
    }

    #[test]
    fn test_max_groups() {
        let mut eics = vec![triangle_eic(0, 9.0, 1.0), triangle_eic(1, 12.0, 2.0)];
        for eic in eics.iter_mut() {
            eic.process().unwrap();
        }
        let mut config = settings(GroupingStrategy::SingleLinkage);
        let groups = group_peaks(&mut eics, &config).unwrap();
        assert_eq!(groups.len(), 2);

        config.max_groups = Some(1);
        let groups = group_peaks(&mut eics, &config).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].max_intensity, 200.0);
    }
}

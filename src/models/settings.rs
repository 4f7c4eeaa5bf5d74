use crate::models::smoothers::SmootherKind;
use serde::{
    Deserialize,
    Serialize,
};

/// Per series processing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EicSettings {
    pub smoother: SmootherKind,
    pub smoothing_window: usize,
    pub baseline_smoothing_window: usize,
    /// Percent of the highest intensities ignored when estimating the baseline.
    pub baseline_drop_top_x: f32,
}

impl Default for EicSettings {
    fn default() -> Self {
        Self {
            smoother: SmootherKind::Gaussian,
            smoothing_window: 5,
            baseline_smoothing_window: 5,
            baseline_drop_top_x: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupingStrategy {
    /// Assign every sample peak to the best scoring peak of a merged template.
    #[default]
    TemplateScored,
    /// Single linkage over retention time differences between sample peaks.
    SingleLinkage,
}

/// What happens when a linkage edge connects a clustered peak with an
/// unclustered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkageJoinPolicy {
    /// The lone peak always joins, even if its sample is already in the cluster.
    Unconditional,
    /// The lone peak only joins when its sample is not in the cluster yet.
    #[default]
    RespectSampleExclusion,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingSettings {
    pub strategy: GroupingStrategy,
    pub smoothing_window: usize,
    pub max_rt_diff: f32,
    /// Spline intensity below which apexes are ignored (single linkage only).
    pub noise_threshold: f32,
    pub linkage_join: LinkageJoinPolicy,
    /// Keep only this many groups, by max intensity.
    pub max_groups: Option<usize>,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::TemplateScored,
            smoothing_window: 5,
            max_rt_diff: 0.5,
            noise_threshold: 0.0,
            linkage_join: LinkageJoinPolicy::RespectSampleExclusion,
            max_groups: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: GroupingSettings =
            serde_json::from_str(r#"{"strategy": "SingleLinkage", "max_rt_diff": 0.2}"#).unwrap();
        assert_eq!(settings.strategy, GroupingStrategy::SingleLinkage);
        assert_eq!(settings.max_rt_diff, 0.2);
        assert_eq!(settings.smoothing_window, 5);
        assert_eq!(settings.linkage_join, LinkageJoinPolicy::RespectSampleExclusion);

        let eic: EicSettings = serde_json::from_str(r#"{"smoother": "SavitzkyGolay"}"#).unwrap();
        assert_eq!(eic.smoother, SmootherKind::SavitzkyGolay);
        assert_eq!(eic.baseline_drop_top_x, 60.0);
    }
}

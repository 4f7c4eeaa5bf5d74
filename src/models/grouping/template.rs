use super::{
    finalize_groups,
    singleton_groups,
};
use crate::errors::Result;
use crate::models::eic::Eic;
use crate::models::merge::merge_eics;
use crate::models::peak::Peak;
use crate::models::peak_group::PeakGroup;
use crate::utils::math::check_overlap;
use std::cmp::Ordering;

/// Template matches this far apart in retention time still count if the
/// windows overlap at least this much.
const MIN_OVERLAP_FAR_MATCH: f32 = 0.2;
const SCORE_EPSILON: f32 = 0.01;

/// Score of assigning `peak` to `template`, `None` when they can not
/// belong together.
pub fn template_score(template: &Peak, peak: &Peak, max_rt_diff: f32) -> Option<f32> {
    let overlap = check_overlap(template.rt_min, template.rt_max, peak.rt_min, peak.rt_max);
    let rt_dist = (peak.rt - template.rt).abs();
    if rt_dist > max_rt_diff && overlap < MIN_OVERLAP_FAR_MATCH {
        return None;
    }
    let intensity_dist = (peak.peak_intensity - template.peak_intensity).abs();
    Some(overlap / ((rt_dist + SCORE_EPSILON) * (intensity_dist + SCORE_EPSILON)))
}

/// Index and score of the best scoring template for `peak`.
///
/// `templates` must be sorted by window start, see [`sort_templates`].
/// The scan starts one
/// template before the first whose window starts at or after the peak
/// window and stops at the first disjoint template starting after it.
fn best_template(templates: &[Peak], peak: &Peak, max_rt_diff: f32) -> Option<(usize, f32)> {
    let start = templates
        .partition_point(|t| t.rt_min < peak.rt_min)
        .saturating_sub(1);

    let mut best: Option<(usize, f32)> = None;
    for (k, template) in templates.iter().enumerate().skip(start) {
        let overlap = check_overlap(template.rt_min, template.rt_max, peak.rt_min, peak.rt_max);
        if overlap == 0.0 && template.rt_max < peak.rt_min {
            continue;
        }
        if overlap == 0.0 && template.rt_min > peak.rt_max {
            break;
        }
        let Some(score) = template_score(template, peak, max_rt_diff) else {
            continue;
        };
        let best_score = best.map(|(_, s)| s).unwrap_or(f32::MIN_POSITIVE);
        if score > best_score {
            best = Some((k, score));
        }
    }
    best
}

/// Orders templates by the start of their retention time window, the
/// order [`best_template`] searches in.
fn sort_templates(templates: &mut [Peak]) {
    templates.sort_by(|a, b| {
        a.rt_min
            .partial_cmp(&b.rt_min)
            .unwrap_or(Ordering::Equal)
            .then(a.rt.partial_cmp(&b.rt).unwrap_or(Ordering::Equal))
    });
}

/// Groups peaks by matching them against the peaks of a merged template.
///
/// Peaks of every processor are expected to be detected already. Each
/// template peak seeds a group, sample peaks go to their best scoring
/// template or start their own group. Groups are then reduced to one peak
/// per sample.
pub fn group_by_template(
    eics: &[Eic],
    smoothing_window: usize,
    max_rt_diff: f32,
) -> Result<Vec<PeakGroup>> {
    match eics {
        [] => return Ok(Vec::new()),
        [single] => return Ok(singleton_groups(single)),
        _ => {}
    }

    let merged = merge_eics(eics)?;
    let mut template_eic = Eic::new(merged, *eics[0].settings());
    template_eic.detect_peaks(smoothing_window)?;
    let mut templates = template_eic.into_peaks();
    sort_templates(&mut templates);
    tracing::debug!("Template has {} peaks", templates.len());

    let mut groups: Vec<PeakGroup> = (0..templates.len()).map(PeakGroup::new).collect();
    let mut unmatched = 0;
    for eic in eics {
        for peak in eic.peaks() {
            let mut peak = peak.clone();
            match best_template(&templates, &peak, max_rt_diff) {
                Some((k, score)) => {
                    peak.group_score = score;
                    groups[k].add_peak(peak);
                }
                None => {
                    peak.group_score = 0.0;
                    unmatched += 1;
                    let mut group = PeakGroup::new(groups.len());
                    group.add_peak(peak);
                    groups.push(group);
                }
            }
        }
    }
    if unmatched > 0 {
        tracing::debug!("{} peaks did not match any template", unmatched);
    }

    for group in groups.iter_mut() {
        group.reduce();
    }
    Ok(finalize_groups(groups))
}

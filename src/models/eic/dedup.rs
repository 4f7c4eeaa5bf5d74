use crate::models::peak::Peak;
use std::cmp::Ordering;

/// Retention time overlap above which two peaks are the same feature.
pub const DUPLICATE_OVERLAP: f32 = 0.95;

/// Flags duplicated peaks as inactive.
///
/// Out of every pair overlapping more than [`DUPLICATE_OVERLAP`] the one
/// with the smaller raw area is flagged (the later one on ties). Peaks
/// with no intensity at the apex are always flagged.
pub fn mark_overlapping_peaks(peaks: &mut [Peak]) {
    for peak in peaks.iter_mut() {
        peak.active = peak.peak_intensity != 0.0;
    }

    for i in 0..peaks.len() {
        if peaks[i].peak_intensity == 0.0 {
            continue;
        }
        for j in (i + 1)..peaks.len() {
            if peaks[i].overlap(&peaks[j]) <= DUPLICATE_OVERLAP {
                continue;
            }
            let loser = if peaks[i].peak_area >= peaks[j].peak_area {
                j
            } else {
                i
            };
            tracing::trace!(
                "Dropping duplicate peak at rt={} (area {})",
                peaks[loser].rt,
                peaks[loser].peak_area
            );
            peaks[loser].active = false;
        }
    }
}

/// Drops inactive peaks, the survivors keep their relative order.
pub fn remove_overlapping_peaks(peaks: &mut Vec<Peak>) {
    mark_overlapping_peaks(peaks);
    peaks.retain(|p| p.active);
}

/// Sorts peaks by descending fractional area and numbers them.
pub fn rank_peaks(peaks: &mut [Peak]) {
    peaks.sort_by(|a, b| {
        b.peak_area_fractional
            .partial_cmp(&a.peak_area_fractional)
            .unwrap_or(Ordering::Equal)
    });
    for (i, peak) in peaks.iter_mut().enumerate() {
        peak.rank = i;
    }
}

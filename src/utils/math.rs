use std::cmp::Ordering;

/// Fractional overlap of two closed retention time windows.
///
/// Returns the intersection over the union of `[a_min, a_max]` and
/// `[b_min, b_max]`, `1.0` when one window contains the other and
/// `0.0` when they are disjoint.
pub fn check_overlap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> f32 {
    if a_max < b_min || b_max < a_min {
        return 0.0;
    }
    if (b_min <= a_min && a_max <= b_max) || (a_min <= b_min && b_max <= a_max) {
        return 1.0;
    }
    let intersection = a_max.min(b_max) - a_min.max(b_min);
    let union = a_max.max(b_max) - a_min.min(b_min);
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Median of a slice, `None` when empty.
/// Even lengths average the two central values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

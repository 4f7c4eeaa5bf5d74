use super::Eic;
use crate::models::peak::Peak;

/// Relative increase of the spline counted as the curve going up again.
const RISING_SLOPE: f32 = 0.01;
/// Consecutive rising steps that mark the start of a neighboring peak.
const MAX_DIRECTIONALITY: usize = 2;
/// Fraction of the apex spline value under which the walk stops.
const MIN_APEX_FRACTION: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

impl Eic {
    /// Expands the apex of `peak` into left and right bounds.
    ///
    /// Needs both the spline and the baseline, otherwise the peak is left as is.
    pub fn find_peak_bounds(&self, peak: &mut Peak) {
        let n = self.series.len();
        if n == 0 || self.spline.len() != n || self.baseline.len() != n {
            return;
        }
        if peak.apex_index >= n {
            tracing::warn!("Apex {} out of range for series of {}", peak.apex_index, n);
            return;
        }

        let raw = self.series.intensities();
        let apex = peak.apex_index;
        let mut lb = self.walk_bound(apex, Direction::Left);
        let mut rb = self.walk_bound(apex, Direction::Right);

        // The highest raw point in range becomes the apex.
        let mut new_apex = apex;
        for k in lb..=rb {
            let mz_ok = !self.series.has_mzs() || self.series.mz_at(k) > 0.0;
            if raw[k] > raw[new_apex] && mz_ok {
                new_apex = k;
            }
        }

        while lb < new_apex && raw[lb] <= 0.0 {
            lb += 1;
        }
        while rb > new_apex && raw[rb] <= 0.0 {
            rb -= 1;
        }

        // Single point peaks get at least one neighbor.
        if lb == new_apex && new_apex > 0 {
            lb = new_apex - 1;
        }
        if rb == new_apex && new_apex + 1 < n {
            rb = new_apex + 1;
        }

        tracing::trace!(
            "Peak bounds apex={} -> apex={} [{}, {}]",
            apex,
            new_apex,
            lb,
            rb
        );
        peak.apex_index = new_apex;
        peak.min_index = lb;
        peak.max_index = rb;
    }

    /// Walks away from `apex` and returns the lowest raw point seen before
    /// any of the stopping rules triggers.
    fn walk_bound(&self, apex: usize, direction: Direction) -> usize {
        let n = self.series.len();
        let raw = self.series.intensities();
        let spline = &self.spline;
        let baseline = &self.baseline;

        let floor = spline[apex] * MIN_APEX_FRACTION;
        let mut best = apex;
        let mut last_value = spline[apex];
        let mut directionality = 0;
        let mut idx = apex;
        loop {
            idx = match direction {
                Direction::Left if idx > 0 => idx - 1,
                Direction::Right if idx + 1 < n => idx + 1,
                _ => break,
            };

            let rel_slope = if last_value > 0.0 {
                (spline[idx] - last_value) / last_value
            } else {
                0.0
            };
            if rel_slope > RISING_SLOPE {
                directionality += 1;
            } else {
                directionality = 0;
            }

            if raw[idx] <= raw[best] {
                best = idx;
            }
            if spline[idx] == 0.0
                || spline[idx] <= baseline[idx]
                || spline[idx] <= floor
                || directionality >= MAX_DIRECTIONALITY
            {
                break;
            }
            last_value = spline[idx];
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::eic::tests::bump_series;
    use crate::models::series::Series;
    use crate::models::settings::EicSettings;

    fn prepared(series: Series) -> Eic {
        let mut eic = Eic::new(series, EicSettings::default());
        eic.compute_spline(1).unwrap();
        eic.compute_baseline().unwrap();
        eic
    }

    #[test]
    fn test_bump_bounds() {
        let eic = prepared(bump_series());
        let mut peak = Peak::new(0, 3);
        eic.find_peak_bounds(&mut peak);
        assert_eq!((peak.min_index, peak.apex_index, peak.max_index), (1, 3, 5));
    }

    #[test]
    fn test_missing_baseline_is_noop() {
        let mut eic = Eic::new(bump_series(), EicSettings::default());
        eic.compute_spline(1).unwrap();
        let mut peak = Peak::new(0, 3);
        eic.find_peak_bounds(&mut peak);
        assert_eq!((peak.min_index, peak.max_index), (3, 3));
    }

    #[test]
    fn test_apex_moves_to_highest_point() {
        // Detected apex at 2 but 3 is higher in raw.
        let intensities = vec![0.0, 2.0, 5.0, 7.0, 4.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let n = intensities.len();
        let series =
            Series::from_rt_intensity(0, (0..n).map(|x| x as f32).collect(), intensities, 50.0)
                .unwrap();
        let eic = prepared(series);
        let mut peak = Peak::new(0, 2);
        eic.find_peak_bounds(&mut peak);
        assert_eq!(peak.apex_index, 3);
        assert!(peak.min_index <= peak.apex_index && peak.apex_index <= peak.max_index);
    }

    #[test]
    fn test_neighbor_peak_stops_walk() {
        let intensities = vec![
            0.0, 2.0, 10.0, 4.0, 2.0, 3.0, 6.0, 12.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ];
        let n = intensities.len();
        let series =
            Series::from_rt_intensity(0, (0..n).map(|x| x as f32).collect(), intensities, 50.0)
                .unwrap();
        let eic = prepared(series);
        let mut peak = Peak::new(0, 2);
        eic.find_peak_bounds(&mut peak);
        // Rising twice after the valley at 4 stops the walk before the
        // second peak.
        assert_eq!(peak.apex_index, 2);
        assert_eq!(peak.min_index, 1);
        assert_eq!(peak.max_index, 4);
    }

    #[test]
    fn test_edge_apex_keeps_a_neighbor() {
        let intensities = vec![9.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let series = Series::from_rt_intensity(
            0,
            (0..6).map(|x| x as f32).collect(),
            intensities,
            50.0,
        )
        .unwrap();
        let eic = prepared(series);
        let mut peak = Peak::new(0, 0);
        eic.find_peak_bounds(&mut peak);
        assert_eq!((peak.min_index, peak.apex_index, peak.max_index), (0, 0, 1));
    }
}

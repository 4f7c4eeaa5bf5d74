use crate::errors::Result;
use crate::models::eic::Eic;
use crate::models::grouping::group_peaks;
use crate::models::peak_group::PeakGroup;
use crate::models::series::Series;
use crate::models::settings::{
    EicSettings,
    GroupingSettings,
};
use crate::models::window::ExtractionWindow;
use crate::traits::series_provider::SeriesProvider;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::Serialize;

/// Builds and runs one processor per series on the rayon pool.
/// Output order follows the input order.
pub fn process_series_batch(series: Vec<Series>, settings: &EicSettings) -> Result<Vec<Eic>> {
    let total = series.len() as u64;
    series
        .into_par_iter()
        .progress_count(total)
        .map(|s| {
            let mut eic = Eic::new(s, *settings);
            eic.process()?;
            Ok(eic)
        })
        .collect()
}

/// Extracts the series of every sample of `provider` for one window and
/// runs detection on each.
pub fn extract_window_eics<P: SeriesProvider>(
    provider: &P,
    window: &ExtractionWindow,
    settings: &EicSettings,
) -> Result<Vec<Eic>> {
    provider
        .sample_ids()
        .into_par_iter()
        .map(|sample_id| {
            let series = provider.extract(sample_id, window)?;
            let mut eic = Eic::new(series, *settings);
            eic.process()?;
            Ok(eic)
        })
        .collect()
}

/// Groups found for one extraction window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowGroups {
    pub window: ExtractionWindow,
    pub groups: Vec<PeakGroup>,
}

/// Extraction, detection and grouping for many windows.
///
/// Windows are independent and processed in parallel, grouping inside a
/// window only ever sees the processors of that window.
pub fn group_windows<P: SeriesProvider>(
    provider: &P,
    windows: &[ExtractionWindow],
    eic_settings: &EicSettings,
    grouping_settings: &GroupingSettings,
) -> Result<Vec<WindowGroups>> {
    windows
        .par_iter()
        .progress_count(windows.len() as u64)
        .map(|window| {
            let mut eics = extract_window_eics(provider, window, eic_settings)?;
            let groups = group_peaks(&mut eics, grouping_settings)?;
            Ok(WindowGroups {
                window: *window,
                groups,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::{
        InMemoryProvider,
        SampleScans,
        ScanPoint,
    };

    fn gaussian_sample(sample_id: usize, center: f32, mz: f64) -> SampleScans {
        let points = (0..60u32)
            .map(|scan| {
                let rt = scan as f32 * 0.1;
                let x = (rt - center) / 0.2;
                ScanPoint {
                    scan,
                    rt,
                    mz,
                    intensity: 1000.0 * (-0.5 * x * x).exp(),
                }
            })
            .collect();
        SampleScans {
            sample_id,
            sample_name: None,
            points,
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let series: Vec<Series> = (0..8)
            .map(|i| {
                let rts: Vec<f32> = (0..30).map(|x| x as f32).collect();
                let intensities: Vec<f32> = (0..30)
                    .map(|x| if x == 10 + i { 50.0 } else { 0.0 })
                    .collect();
                Series::from_rt_intensity(i, rts, intensities, 100.0).unwrap()
            })
            .collect();
        let eics = process_series_batch(series, &EicSettings::default()).unwrap();
        assert_eq!(eics.len(), 8);
        for (i, eic) in eics.iter().enumerate() {
            assert_eq!(eic.sample_id(), i);
        }
    }

    #[test]
    fn test_group_windows() {
        let provider = InMemoryProvider::new(vec![
            gaussian_sample(0, 3.0, 400.0),
            gaussian_sample(1, 3.05, 400.0),
            gaussian_sample(2, 2.95, 400.0),
        ]);
        let windows = vec![
            ExtractionWindow::from_ppm(0, 400.0, 20.0, (0.0, 6.0)),
            ExtractionWindow::from_ppm(1, 800.0, 20.0, (0.0, 6.0)),
        ];
        let eic_settings = EicSettings {
            smoothing_window: 1,
            ..Default::default()
        };
        let grouping_settings = GroupingSettings {
            max_rt_diff: 0.2,
            smoothing_window: 1,
            ..Default::default()
        };
        let out = group_windows(&provider, &windows, &eic_settings, &grouping_settings).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].window.id, 0);
        assert_eq!(out[0].groups.len(), 1);
        assert_eq!(out[0].groups[0].sample_count, 3);
        // Nothing in the second window.
        assert!(out[1].groups.is_empty());
    }
}

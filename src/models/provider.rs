use crate::errors::{
    DataProcessingError,
    PeakPickingError,
    Result,
};
use crate::models::series::{
    RawSeries,
    Series,
};
use crate::models::window::ExtractionWindow;
use crate::traits::series_provider::SeriesProvider;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
};

/// One centroided peak of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    pub scan: u32,
    pub rt: f32,
    pub mz: f64,
    pub intensity: f32,
}

/// All the centroids of a sample, in the order they were acquired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleScans {
    pub sample_id: usize,
    #[serde(default)]
    pub sample_name: Option<String>,
    pub points: Vec<ScanPoint>,
}

/// Provider over samples held in memory.
///
/// Every scan with at least one point in the window contributes its most
/// intense point to the series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    samples: Vec<SampleScans>,
}

impl InMemoryProvider {
    pub fn new(mut samples: Vec<SampleScans>) -> Self {
        for sample in samples.iter_mut() {
            sample
                .points
                .sort_by(|a, b| a.rt.total_cmp(&b.rt).then(a.scan.cmp(&b.scan)));
        }
        Self { samples }
    }
}

impl SeriesProvider for InMemoryProvider {
    fn sample_ids(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.sample_id).collect()
    }

    fn extract(&self, sample_id: usize, window: &ExtractionWindow) -> Result<Series> {
        let sample = self
            .samples
            .iter()
            .find(|s| s.sample_id == sample_id)
            .ok_or_else(|| PeakPickingError::custom(format!("Unknown sample {}", sample_id)))?;

        let mut out = RawSeries {
            sample_id,
            sample_name: sample.sample_name.clone(),
            ..Default::default()
        };
        for point in sample.points.iter() {
            if !window.contains(point.mz, point.rt) {
                continue;
            }
            if out.scans.last() == Some(&point.scan) {
                let last = out.intensities.len() - 1;
                if point.intensity > out.intensities[last] {
                    out.intensities[last] = point.intensity;
                    out.mzs[last] = point.mz;
                }
                continue;
            }
            out.scans.push(point.scan);
            out.retention_times.push(point.rt);
            out.intensities.push(point.intensity);
            out.mzs.push(point.mz);
        }
        Ok(Series::try_from(out)?.with_window(window))
    }
}

/// Memoizes the series of another provider.
///
/// Lookup and insertion happen under a single lock, so a given
/// (sample, window) pair is only ever extracted once even when many
/// workers ask for it at the same time.
pub struct CachedSeriesProvider<P: SeriesProvider> {
    inner: P,
    cache: Mutex<HashMap<(usize, u64), Arc<Series>>>,
}

impl<P: SeriesProvider> CachedSeriesProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, sample_id: usize, window: &ExtractionWindow) -> Result<Arc<Series>> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let key = (sample_id, window.id);
        if let Some(series) = cache.get(&key) {
            return Ok(series.clone());
        }
        let series = Arc::new(self.inner.extract(sample_id, window)?);
        cache.insert(key, series.clone());
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: SeriesProvider> SeriesProvider for CachedSeriesProvider<P> {
    fn sample_ids(&self) -> Vec<usize> {
        self.inner.sample_ids()
    }

    fn extract(&self, sample_id: usize, window: &ExtractionWindow) -> Result<Series> {
        self.get(sample_id, window).map(|x| x.as_ref().clone())
    }
}

/// Splits a flat list of points into samples, checking they line up.
pub fn samples_from_columns(
    sample_ids: &[usize],
    scans: &[u32],
    rts: &[f32],
    mzs: &[f64],
    intensities: &[f32],
) -> Result<Vec<SampleScans>> {
    let n = sample_ids.len();
    for len in [scans.len(), rts.len(), mzs.len(), intensities.len()] {
        if len != n {
            return Err(DataProcessingError::ExpectedVectorSameLength(len, n).into());
        }
    }
    let mut by_sample: HashMap<usize, Vec<ScanPoint>> = HashMap::new();
    for i in 0..n {
        by_sample.entry(sample_ids[i]).or_default().push(ScanPoint {
            scan: scans[i],
            rt: rts[i],
            mz: mzs[i],
            intensity: intensities[i],
        });
    }
    let mut out: Vec<SampleScans> = by_sample
        .into_iter()
        .map(|(sample_id, points)| SampleScans {
            sample_id,
            sample_name: None,
            points,
        })
        .collect();
    out.sort_by_key(|s| s.sample_id);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    fn sample(sample_id: usize) -> SampleScans {
        let mut points = Vec::new();
        for scan in 0..10u32 {
            let rt = scan as f32 * 0.5;
            points.push(ScanPoint {
                scan,
                rt,
                mz: 500.0,
                intensity: 100.0 + scan as f32,
            });
            points.push(ScanPoint {
                scan,
                rt,
                mz: 500.001,
                intensity: 50.0,
            });
            points.push(ScanPoint {
                scan,
                rt,
                mz: 700.0,
                intensity: 1000.0,
            });
        }
        SampleScans {
            sample_id,
            sample_name: Some(format!("sample_{}", sample_id)),
            points,
        }
    }

    #[test]
    fn test_extraction_keeps_most_intense_per_scan() {
        let provider = InMemoryProvider::new(vec![sample(0), sample(1)]);
        let window = ExtractionWindow::from_ppm(0, 500.0, 10.0, (1.0, 3.0));
        let series = provider.extract(1, &window).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.scans(), &[2, 3, 4, 5, 6]);
        assert_eq!(series.intensities()[0], 102.0);
        assert_eq!(series.mzs()[0], 500.0);
        assert_eq!(series.rt_range(), (1.0, 3.0));
        assert_eq!(series.sample_name(), Some("sample_1"));
        assert!(provider.extract(5, &window).is_err());
    }

    struct CountingProvider {
        inner: InMemoryProvider,
        calls: AtomicUsize,
    }

    impl SeriesProvider for CountingProvider {
        fn sample_ids(&self) -> Vec<usize> {
            self.inner.sample_ids()
        }

        fn extract(&self, sample_id: usize, window: &ExtractionWindow) -> Result<Series> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.extract(sample_id, window)
        }
    }

    #[test]
    fn test_cache_extracts_once_across_threads() {
        use rayon::prelude::*;

        let provider = CachedSeriesProvider::new(CountingProvider {
            inner: InMemoryProvider::new(vec![sample(0), sample(1)]),
            calls: AtomicUsize::new(0),
        });
        let window = ExtractionWindow::from_ppm(7, 500.0, 10.0, (0.0, 5.0));
        let lens: Vec<usize> = (0..64)
            .into_par_iter()
            .map(|i| provider.get(i % 2, &window).unwrap().len())
            .collect();
        assert!(lens.iter().all(|x| *x == 10));
        assert_eq!(provider.len(), 2);
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_samples_from_columns() {
        let samples = samples_from_columns(
            &[1, 0, 1],
            &[0, 0, 1],
            &[0.0, 0.0, 0.5],
            &[100.0, 100.0, 100.0],
            &[1.0, 2.0, 3.0],
        )
        .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].sample_id, 0);
        assert_eq!(samples[1].points.len(), 2);

        assert!(samples_from_columns(&[0], &[], &[0.0], &[1.0], &[1.0]).is_err());
    }
}

use crate::errors::{
    DataProcessingError,
    PeakPickingError,
    Result,
};
use crate::models::window::ExtractionWindow;
use serde::{
    Deserialize,
    Serialize,
};

/// Parallel arrays as handed over by the file parsing collaborator.
///
/// Only `intensities` is mandatory, any other array may be empty, which
/// marks it as missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSeries {
    pub sample_id: usize,
    #[serde(default)]
    pub sample_name: Option<String>,
    #[serde(default)]
    pub scans: Vec<u32>,
    #[serde(default)]
    pub retention_times: Vec<f32>,
    pub intensities: Vec<f32>,
    #[serde(default)]
    pub mzs: Vec<f64>,
}

/// An extracted ion chromatogram for one mass window in one sample.
///
/// Immutable once built, all derived curves live in the processor that
/// owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSeries", into = "RawSeries")]
pub struct Series {
    sample_id: usize,
    sample_name: Option<String>,
    scans: Vec<u32>,
    retention_times: Vec<f32>,
    intensities: Vec<f32>,
    mzs: Vec<f64>,

    rt_min: f32,
    rt_max: f32,
    mz_min: f64,
    mz_max: f64,
    max_intensity: f32,
    total_intensity: f32,
}

fn check_parallel<T>(name: &str, arr: &[T], expected: usize) -> Result<()> {
    if !arr.is_empty() && arr.len() != expected {
        tracing::warn!(
            "Array '{}' has {} elements, expected {}",
            name,
            arr.len(),
            expected
        );
        return Err(DataProcessingError::ExpectedVectorSameLength(arr.len(), expected).into());
    }
    Ok(())
}

impl Series {
    pub fn new(
        sample_id: usize,
        scans: Vec<u32>,
        retention_times: Vec<f32>,
        intensities: Vec<f32>,
        mzs: Vec<f64>,
    ) -> Result<Self> {
        RawSeries {
            sample_id,
            sample_name: None,
            scans,
            retention_times,
            intensities,
            mzs,
        }
        .try_into()
    }

    /// Series with consecutive scan numbers and a constant m/z.
    /// Mostly useful for synthetic data.
    pub fn from_rt_intensity(
        sample_id: usize,
        retention_times: Vec<f32>,
        intensities: Vec<f32>,
        mz: f64,
    ) -> Result<Self> {
        let n = intensities.len();
        Self::new(
            sample_id,
            (0..n as u32).collect(),
            retention_times,
            intensities,
            vec![mz; n],
        )
    }

    pub fn empty(sample_id: usize) -> Self {
        Self {
            sample_id,
            sample_name: None,
            scans: Vec::new(),
            retention_times: Vec::new(),
            intensities: Vec::new(),
            mzs: Vec::new(),
            rt_min: 0.0,
            rt_max: 0.0,
            mz_min: 0.0,
            mz_max: 0.0,
            max_intensity: 0.0,
            total_intensity: 0.0,
        }
    }

    pub fn with_sample_name(mut self, name: impl Into<String>) -> Self {
        self.sample_name = Some(name.into());
        self
    }

    /// Overrides the rt/mz extent with the window the series was extracted
    /// with, which is usually wider than the observed points.
    pub fn with_window(self, window: &ExtractionWindow) -> Self {
        let mut out = self.with_rt_range(window.rt_range);
        out.mz_min = window.mz_range.0;
        out.mz_max = window.mz_range.1;
        out
    }

    pub fn with_rt_range(mut self, rt_range: (f32, f32)) -> Self {
        self.rt_min = rt_range.0;
        self.rt_max = rt_range.1;
        self
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    pub fn sample_id(&self) -> usize {
        self.sample_id
    }

    pub fn sample_name(&self) -> Option<&str> {
        self.sample_name.as_deref()
    }

    pub fn scans(&self) -> &[u32] {
        &self.scans
    }

    pub fn retention_times(&self) -> &[f32] {
        &self.retention_times
    }

    pub fn intensities(&self) -> &[f32] {
        &self.intensities
    }

    pub fn mzs(&self) -> &[f64] {
        &self.mzs
    }

    pub fn has_retention_times(&self) -> bool {
        !self.retention_times.is_empty()
    }

    pub fn has_scans(&self) -> bool {
        !self.scans.is_empty()
    }

    pub fn has_mzs(&self) -> bool {
        !self.mzs.is_empty()
    }

    /// m/z at `index`, `0.0` when the m/z array is missing.
    pub fn mz_at(&self, index: usize) -> f64 {
        self.mzs.get(index).copied().unwrap_or(0.0)
    }

    pub fn rt_range(&self) -> (f32, f32) {
        (self.rt_min, self.rt_max)
    }

    pub fn mz_range(&self) -> (f64, f64) {
        (self.mz_min, self.mz_max)
    }

    pub fn max_intensity(&self) -> f32 {
        self.max_intensity
    }

    pub fn total_intensity(&self) -> f32 {
        self.total_intensity
    }
}

impl TryFrom<RawSeries> for Series {
    type Error = PeakPickingError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        let n = raw.intensities.len();
        check_parallel("scans", &raw.scans, n)?;
        check_parallel("retention_times", &raw.retention_times, n)?;
        check_parallel("mzs", &raw.mzs, n)?;

        if let Some(pos) = raw.retention_times.windows(2).position(|w| w[1] < w[0]) {
            return Err(DataProcessingError::UnsortedRetentionTimes { index: pos + 1 }.into());
        }

        let (rt_min, rt_max) = match (raw.retention_times.first(), raw.retention_times.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (0.0, 0.0),
        };

        let mut mz_min = f64::MAX;
        let mut mz_max = 0.0f64;
        for mz in raw.mzs.iter().filter(|x| **x > 0.0) {
            mz_min = mz_min.min(*mz);
            mz_max = mz_max.max(*mz);
        }
        if mz_min == f64::MAX {
            mz_min = 0.0;
        }

        let max_intensity = raw.intensities.iter().cloned().fold(0.0f32, f32::max);
        let total_intensity = raw.intensities.iter().sum();

        Ok(Self {
            sample_id: raw.sample_id,
            sample_name: raw.sample_name,
            scans: raw.scans,
            retention_times: raw.retention_times,
            intensities: raw.intensities,
            mzs: raw.mzs,
            rt_min,
            rt_max,
            mz_min,
            mz_max,
            max_intensity,
            total_intensity,
        })
    }
}

impl From<Series> for RawSeries {
    fn from(series: Series) -> Self {
        RawSeries {
            sample_id: series.sample_id,
            sample_name: series.sample_name,
            scans: series.scans,
            retention_times: series.retention_times,
            intensities: series.intensities,
            mzs: series.mzs,
        }
    }
}

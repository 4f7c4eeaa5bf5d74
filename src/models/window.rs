use serde::{
    Deserialize,
    Serialize,
};

/// An m/z by retention time window to extract one series from one sample.
///
/// Deciding which windows to extract is up to the caller (the mass slicer),
/// this only describes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionWindow {
    pub id: u64,
    pub mz_range: (f64, f64),
    pub rt_range: (f32, f32),
}

impl ExtractionWindow {
    pub fn from_ppm(id: u64, mz: f64, ppm: f64, rt_range: (f32, f32)) -> Self {
        let utol = mz * (ppm / 1e6);
        Self {
            id,
            mz_range: (mz - utol, mz + utol),
            rt_range,
        }
    }

    pub fn contains(&self, mz: f64, rt: f32) -> bool {
        (self.mz_range.0..=self.mz_range.1).contains(&mz)
            && (self.rt_range.0..=self.rt_range.1).contains(&rt)
    }
}

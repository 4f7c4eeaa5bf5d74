use crate::errors::Result;
use crate::models::series::Series;
use crate::models::window::ExtractionWindow;

/// Anything that can cut a series out of a sample.
///
/// Implementations are shared between worker threads, extraction of
/// different samples may run at the same time.
pub trait SeriesProvider: Send + Sync {
    fn sample_ids(&self) -> Vec<usize>;
    fn extract(&self, sample_id: usize, window: &ExtractionWindow) -> Result<Series>;
}

// Re-export main structures
pub use crate::models::eic::{
    Eic,
    ProcessingStage,
};
pub use crate::models::grouping::group_peaks;
pub use crate::models::peak::Peak;
pub use crate::models::peak_group::PeakGroup;
pub use crate::models::series::Series;
pub use crate::models::settings::{
    EicSettings,
    GroupingSettings,
    GroupingStrategy,
    LinkageJoinPolicy,
};
pub use crate::models::smoothers::SmootherKind;
pub use crate::models::window::ExtractionWindow;

// Re-export traits
pub use crate::traits::series_provider::SeriesProvider;

// Declare modules
pub mod errors;
pub mod models;
pub mod traits;
pub mod utils;

pub mod baseline;
pub mod batch;
pub mod eic;
pub mod grouping;
pub mod merge;
pub mod peak;
pub mod peak_group;
pub mod provider;
pub mod series;
pub mod settings;
pub mod smoothers;
pub mod window;

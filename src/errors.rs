use std::fmt::Display;

#[derive(Debug)]
pub enum PeakPickingError {
    DataReadingError(DataReadingError),
    DataProcessingError(DataProcessingError),
    Other(String),
}

pub type Result<T> = std::result::Result<T, PeakPickingError>;

impl Display for PeakPickingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for PeakPickingError {}

impl PeakPickingError {
    pub fn custom(msg: impl Display) -> Self {
        Self::Other(msg.to_string())
    }
}

#[derive(Debug)]
pub enum DataReadingError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    MsgpackError(rmp_serde::encode::Error),
}

impl From<std::io::Error> for DataReadingError {
    fn from(e: std::io::Error) -> Self {
        DataReadingError::IoError(e)
    }
}

impl From<serde_json::Error> for DataReadingError {
    fn from(e: serde_json::Error) -> Self {
        DataReadingError::JsonError(e)
    }
}

impl From<rmp_serde::encode::Error> for DataReadingError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        DataReadingError::MsgpackError(e)
    }
}

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedVectorSameLength(usize, usize),
    ExpectedNonEmptyData,
    UnsortedRetentionTimes { index: usize },
    AllocationFailure { requested: usize },
    InsufficientData { real: usize, expected: usize },
}

impl Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<DataProcessingError> for PeakPickingError {
    fn from(e: DataProcessingError) -> Self {
        PeakPickingError::DataProcessingError(e)
    }
}

impl From<DataReadingError> for PeakPickingError {
    fn from(e: DataReadingError) -> Self {
        PeakPickingError::DataReadingError(e)
    }
}

impl From<std::io::Error> for PeakPickingError {
    fn from(e: std::io::Error) -> Self {
        PeakPickingError::DataReadingError(e.into())
    }
}

impl From<serde_json::Error> for PeakPickingError {
    fn from(e: serde_json::Error) -> Self {
        PeakPickingError::DataReadingError(e.into())
    }
}

impl From<rmp_serde::encode::Error> for PeakPickingError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        PeakPickingError::DataReadingError(e.into())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported data file '{0}': expected a .csv or .json file")]
    UnsupportedFormat(String),

    #[error("Expected a JSON array of row objects, found {0}")]
    NotAnArray(String),

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    #[error("Page numbers start at 1, got {0}")]
    InvalidPageNumber(usize),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

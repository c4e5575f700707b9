//! Custom error types for the tool layer.

use thiserror::Error;

use crate::domains::SummaryError;

/// Tool layer errors. Converted to `{"error": ...}` objects only at the tool
/// boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Api(#[from] strava_activity_client::StravaError),

    #[error("{0}")]
    Summary(#[from] SummaryError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

//! Error types for gradeboard-core

use thiserror::Error;

/// Errors raised while decoding a grade-statistics payload
#[derive(Error, Debug)]
pub enum StatsError {
    /// The payload did not match the expected shape
    #[error("invalid grade statistics payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result type alias for payload decoding
pub type StatsResult<T> = Result<T, StatsError>;

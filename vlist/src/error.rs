use thiserror::Error;

/// Rejected list configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("item count must be a non-negative integer, got {0}")]
    InvalidItemCount(f64),

    #[error("item size must be at least 1")]
    ZeroItemSize,

    #[error("item size must be a positive finite number, got {0}")]
    InvalidItemSize(f64),

    #[error("overscan must be a non-negative integer, got {0}")]
    InvalidOverscan(f64),
}

/// Rejected size measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("index {index} out of bounds (item count {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("measured size of item {index} must be at least 1")]
    ZeroSize { index: usize },
}

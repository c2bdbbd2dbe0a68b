use thiserror::Error;

/// Errors raised while turning input files into typed data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("dataset is missing column '{0}'")]
    MissingColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("feature {index}: {reason}")]
    BadGeometry { index: usize, reason: String },

    #[error("unknown metric '{0}' (expected price, area or unit-price)")]
    UnknownMetric(String),
}

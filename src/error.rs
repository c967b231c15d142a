use thiserror::Error;

/// Failures raised by the analytical pipeline before or while computing a heatmap.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient data: {candles} candles cannot confirm swings with window {window}")]
    InsufficientData { candles: usize, window: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl AnalysisError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidConfiguration(msg.into())
    }
}

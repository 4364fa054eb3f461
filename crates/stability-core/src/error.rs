use thiserror::Error;

#[derive(Error, Debug)]
pub enum StabilityError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Model not ready: forecast requested before training")]
    ModelNotReady,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StabilityError {
    /// Client errors propagate to the caller; everything else is expected
    /// to be recovered locally with degraded data.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StabilityError::InvalidInput(_))
    }
}

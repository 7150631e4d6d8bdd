use thiserror::Error;

pub type Result<T, E = DedupError> = std::result::Result<T, E>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DedupError {
    /// A token set had no members, so no minimum hash exists.
    #[error("empty input: {0}")]
    EmptyInput(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DedupError {
    pub(crate) fn invalid_threshold(threshold: f64) -> Self {
        DedupError::InvalidArgument(format!("threshold {threshold} is outside [0, 1]"))
    }
}

/// Rejects thresholds outside `[0, 1]`, including NaN.
pub(crate) fn check_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(DedupError::invalid_threshold(threshold))
    }
}

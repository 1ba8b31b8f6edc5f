use thiserror::Error;

/// Errors emitted by the analysis core.
///
/// `InsufficientData` and `BadConfig` abort a run before any signal is
/// touched; `NumericFailure` is reported by the driver when a downstream
/// stage produced non-finite values that had to be zeroed.
#[derive(Error, Debug)]
pub enum CardiaError {
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("bad configuration: {0}")]
    BadConfig(String),

    #[error("numeric failure in {stage}: produced non-finite values")]
    NumericFailure { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, CardiaError>;

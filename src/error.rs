use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Error returned from any stage of the transit pipeline
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum TransitError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] MalformedInputError),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("no significant periodic signal: best depth S/N {snr:.3} is below {min_snr:.3}")]
    NoSignalFound { snr: f64, min_snr: f64 },

    #[error("transit fit did not converge: {0}")]
    NonConvergentFit(#[from] NonConvergenceReason),

    #[error(
        "transit model produced non-finite flux in {unstable} of {evaluations} prior-valid evaluations"
    )]
    NumericalInstability { unstable: usize, evaluations: usize },
}

impl TransitError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::NoSignalFound { .. } => ErrorKind::NoSignalFound,
            Self::NonConvergentFit(_) => ErrorKind::NonConvergentFit,
            Self::NumericalInstability { .. } => ErrorKind::NumericalInstability,
        }
    }
}

/// Reason of [TransitError::MalformedInput]
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedInputError {
    #[error("time series is empty")]
    Empty,

    #[error("time-series' length {actual} is smaller than the minimum required length {minimum}")]
    ShortTimeSeries { actual: usize, minimum: usize },

    #[error("non-finite {array} value at index {index}")]
    NonFinite { array: &'static str, index: usize },

    #[error("time is not strictly increasing at index {index}")]
    NonIncreasingTime { index: usize },

    #[error("flux error is not positive at index {index}")]
    NonPositiveError { index: usize },

    #[error("flux trend is not positive at index {index}")]
    NonPositiveTrend { index: usize },
}

/// Reason of [TransitError::NonConvergentFit]
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum NonConvergenceReason {
    #[error("every retained sample has zero posterior probability")]
    DegenerateChain,

    #[error("posterior median of {parameter} = {value} is outside of the prior support")]
    MedianOutsidePrior { parameter: &'static str, value: f64 },
}

/// Serializable classification of [TransitError] used in batch reports
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    InvalidParameter,
    NoSignalFound,
    NonConvergentFit,
    NumericalInstability,
}

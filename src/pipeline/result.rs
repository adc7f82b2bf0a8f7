use crate::bls::CandidatePeriod;
use crate::error::{ErrorKind, TransitError};
use crate::preprocess::SeriesStatistics;
use crate::transit::NPARAMS;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Free transit parameters, used for posterior medians and their spreads
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransitEstimate {
    pub t0: f64,
    pub rp_over_rs: f64,
    pub a_over_rs: f64,
    pub inclination_deg: f64,
}

impl TransitEstimate {
    /// Values in the order of [FREE_PARAMETER_NAMES](crate::transit::FREE_PARAMETER_NAMES)
    pub fn from_free([t0, rp_over_rs, a_over_rs, inclination_deg]: [f64; NPARAMS]) -> Self {
        Self {
            t0,
            rp_over_rs,
            a_over_rs,
            inclination_deg,
        }
    }

    pub fn free(&self) -> [f64; NPARAMS] {
        [
            self.t0,
            self.rp_over_rs,
            self.a_over_rs,
            self.inclination_deg,
        ]
    }
}

/// Reliability tag of a [PipelineResult]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum Confidence {
    Normal,
    /// The period candidate is not significant, the fit is done for the best available one
    Low,
}

/// Advisory problem recorded in a result or a batch report
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TransitError> for Diagnostic {
    fn from(error: &TransitError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Final record of one light curve
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PipelineResult {
    pub id: String,
    /// Statistics of the smoothed flux
    pub statistics: SeriesStatistics,
    /// Best period of the box search
    pub candidate: CandidatePeriod,
    /// Posterior medians
    pub medians: TransitEstimate,
    /// Posterior interquartile ranges
    pub iqrs: TransitEstimate,
    pub n_samples: usize,
    /// Mean acceptance fraction of the ensemble walkers
    pub acceptance_fraction: f64,
    pub confidence: Confidence,
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineResult {
    pub fn period(&self) -> f64 {
        self.candidate.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_test::{Token, assert_tokens};

    #[test]
    fn diagnostic_from_error() {
        let error = TransitError::NoSignalFound {
            snr: 3.0,
            min_snr: 7.0,
        };
        let diagnostic = Diagnostic::from(&error);
        assert_eq!(diagnostic.kind, ErrorKind::NoSignalFound);
        assert_eq!(diagnostic.message, error.to_string());
    }

    #[test]
    fn confidence_tokens() {
        assert_tokens(
            &Confidence::Low,
            &[Token::UnitVariant {
                name: "Confidence",
                variant: "Low",
            }],
        );
    }

    #[test]
    fn estimate_free_order() {
        let free = [1.3, 0.1, 9.0, 89.0];
        let estimate = TransitEstimate::from_free(free);
        assert_eq!(estimate.rp_over_rs, 0.1);
        assert_eq!(estimate.free(), free);
    }
}

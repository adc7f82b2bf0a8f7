use crate::array_stats::pearson_correlation;
use crate::data::DataSample;
use crate::error::TransitError;
use crate::pipeline::result::{Diagnostic, PipelineResult};

use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one light curve of a batch
#[derive(Clone, Debug)]
pub struct BatchEntry {
    pub id: String,
    pub outcome: Result<PipelineResult, TransitError>,
}

/// Diagnostic attributed to a light curve
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BatchDiagnostic {
    pub id: String,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Per-light-curve outcomes of [Pipeline::run_batch](crate::pipeline::Pipeline::run_batch), in
/// the input order
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &PipelineResult> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TransitError)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Ok(_) => None,
            Err(error) => Some((entry.id.as_str(), error)),
        })
    }

    /// Every failure and every advisory diagnostic of successful results, in the input order
    pub fn diagnostics(&self) -> Vec<BatchDiagnostic> {
        self.entries
            .iter()
            .flat_map(|entry| {
                let diagnostics = match &entry.outcome {
                    Ok(result) => result.diagnostics.clone(),
                    Err(error) => vec![error.into()],
                };
                diagnostics.into_iter().map(|diagnostic| BatchDiagnostic {
                    id: entry.id.clone(),
                    diagnostic,
                })
            })
            .collect()
    }

    /// Population statistics of the successfully fitted planets, [None] if there are none
    pub fn catalog_summary(&self) -> Option<CatalogSummary> {
        let results: Vec<_> = self.successes().collect();
        if results.is_empty() {
            return None;
        }
        let column = |f: fn(&PipelineResult) -> f64| -> Array1<f64> {
            results.iter().map(|&result| f(result)).collect()
        };
        let rp_over_rs = column(|r| r.medians.rp_over_rs);
        let a_over_rs = column(|r| r.medians.a_over_rs);
        let inclination_deg = column(|r| r.medians.inclination_deg);
        let period = column(PipelineResult::period);

        let correlated = [&rp_over_rs, &a_over_rs, &period];
        let mut correlation = [[f64::NAN; 3]; 3];
        for (i, x) in correlated.iter().enumerate() {
            for (j, y) in correlated.iter().enumerate() {
                correlation[i][j] = pearson_correlation(x.view(), y.view()).unwrap_or(f64::NAN);
            }
        }

        let transit_probabilities: Vec<f64> = a_over_rs.iter().map(|a| a.recip()).collect();
        let occurrence_rate =
            results.len() as f64 / transit_probabilities.iter().sum::<f64>();

        Some(CatalogSummary {
            rp_over_rs: ColumnSummary::new(rp_over_rs),
            a_over_rs: ColumnSummary::new(a_over_rs),
            inclination_deg: ColumnSummary::new(inclination_deg),
            period: ColumnSummary::new(period),
            correlation,
            transit_probabilities,
            occurrence_rate,
        })
    }
}

/// Descriptive statistics of a catalog column
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: f64,
    /// Standard deviation with one degree of freedom, NaN for a single value
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn new(values: Array1<f64>) -> Self {
        let mut ds = DataSample::new(values);
        let (q25, q75) = {
            let sorted = ds.get_sorted();
            (sorted.ppf(0.25), sorted.ppf(0.75))
        };
        Self {
            count: ds.len(),
            mean: ds.get_mean(),
            std: ds.get_std(),
            min: ds.get_min(),
            q25,
            median: ds.get_median(),
            q75,
            max: ds.get_max(),
        }
    }
}

/// Population view of a batch of fitted planets
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CatalogSummary {
    pub rp_over_rs: ColumnSummary,
    pub a_over_rs: ColumnSummary,
    pub inclination_deg: ColumnSummary,
    pub period: ColumnSummary,
    /// Pearson correlation matrix of `rp_over_rs`, `a_over_rs` and `period`, NaN where undefined
    pub correlation: [[f64; 3]; 3],
    /// Geometric transit probability $R_\star / a$ of every planet
    pub transit_probabilities: Vec<f64>,
    /// Number of planets corrected for the transit probability,
    /// $N / \sum_i (R_\star / a)_i$
    pub occurrence_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::bls::CandidatePeriod;
    use crate::error::{ErrorKind, MalformedInputError};
    use crate::pipeline::result::{Confidence, TransitEstimate};
    use crate::preprocess::SeriesStatistics;

    use approx::assert_relative_eq;

    fn result(id: &str, period: f64, rp_over_rs: f64, a_over_rs: f64) -> PipelineResult {
        PipelineResult {
            id: id.to_owned(),
            statistics: SeriesStatistics {
                mean: 1.0,
                std: 1e-3,
                n_points: 1000,
            },
            candidate: CandidatePeriod {
                period,
                t0: 1.0,
                duration: 0.1,
                depth: rp_over_rs.powi(2),
                power: 100.0,
                depth_snr: 14.1,
            },
            medians: TransitEstimate {
                t0: 1.0,
                rp_over_rs,
                a_over_rs,
                inclination_deg: 89.0,
            },
            iqrs: TransitEstimate::from_free([1e-3; 4]),
            n_samples: 1000,
            acceptance_fraction: 0.3,
            confidence: Confidence::Normal,
            diagnostics: vec![],
        }
    }

    fn report() -> BatchReport {
        let mut low = result("c", 4.0, 0.15, 12.0);
        low.confidence = Confidence::Low;
        low.diagnostics.push(Diagnostic::from(&TransitError::NoSignalFound {
            snr: 5.0,
            min_snr: 7.0,
        }));
        BatchReport {
            entries: vec![
                BatchEntry {
                    id: "a".to_owned(),
                    outcome: Ok(result("a", 3.0, 0.05, 8.0)),
                },
                BatchEntry {
                    id: "b".to_owned(),
                    outcome: Err(MalformedInputError::Empty.into()),
                },
                BatchEntry {
                    id: "c".to_owned(),
                    outcome: Ok(low),
                },
                BatchEntry {
                    id: "d".to_owned(),
                    outcome: Ok(result("d", 5.0, 0.1, 10.0)),
                },
            ],
        }
    }

    #[test]
    fn successes_and_failures() {
        let report = report();
        assert_eq!(report.len(), 4);
        let ids: Vec<_> = report.successes().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "d"]);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "b");
        assert_eq!(failures[0].1.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn diagnostics_include_failures_and_advisories() {
        let diagnostics = report().diagnostics();
        let kinds: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.id.as_str(), d.diagnostic.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                ("b", ErrorKind::MalformedInput),
                ("c", ErrorKind::NoSignalFound)
            ]
        );
    }

    #[test]
    fn diagnostic_json_is_flat() {
        let diagnostic = BatchDiagnostic {
            id: "b".to_owned(),
            diagnostic: Diagnostic::from(&TransitError::from(MalformedInputError::Empty)),
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["id"], "b");
        assert_eq!(json["kind"], "MalformedInput");
        assert_eq!(json["message"], "malformed input: time series is empty");
    }

    #[test]
    fn catalog_summary() {
        let summary = report().catalog_summary().unwrap();

        assert_eq!(summary.period.count, 3);
        assert_relative_eq!(summary.period.mean, 4.0);
        assert_relative_eq!(summary.period.std, 1.0);
        assert_eq!(summary.period.min, 3.0);
        assert_eq!(summary.period.median, 4.0);
        assert_eq!(summary.period.max, 5.0);
        assert_eq!(summary.inclination_deg.std, 0.0);

        // rp and a deviate from their means proportionally
        assert_relative_eq!(summary.correlation[0][0], 1.0, max_relative = 1e-10);
        assert_relative_eq!(summary.correlation[0][1], 1.0, max_relative = 1e-10);
        assert_relative_eq!(summary.correlation[1][2], 0.5, max_relative = 1e-10);
        assert_relative_eq!(summary.correlation[0][2], 0.5, max_relative = 1e-10);
        assert_eq!(summary.correlation[0][2], summary.correlation[2][0]);

        assert_eq!(
            summary.transit_probabilities,
            [1.0 / 8.0, 1.0 / 12.0, 1.0 / 10.0]
        );
        let expected_rate = 3.0 / (1.0 / 8.0 + 1.0 / 12.0 + 1.0 / 10.0);
        assert_relative_eq!(summary.occurrence_rate, expected_rate, max_relative = 1e-12);
    }

    #[test]
    fn empty_catalog() {
        let report = BatchReport {
            entries: vec![BatchEntry {
                id: "b".to_owned(),
                outcome: Err(MalformedInputError::Empty.into()),
            }],
        };
        assert!(report.catalog_summary().is_none());
    }
}

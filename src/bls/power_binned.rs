use crate::bls::power_trait::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Binned box search executor
///
/// Observations are accumulated into phase bins, and in-box sums are differences of cumulative
/// sums over the bins extended by one period to handle boxes wrapping over phase zero. The time
/// per period is $O(N + N_\mathrm{bins} N_\mathrm{widths})$.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Binned")]
pub struct BlsPowerBinned;

impl BlsPowerTrait for BlsPowerBinned {
    fn best_box(&self, folded: &FoldedSeries<'_>, boxes: &BoxGrid) -> BoxFit {
        let n_bins = boxes.n_bins;
        let mut bin_weight = vec![0.0; n_bins];
        let mut bin_residual = vec![0.0; n_bins];
        for ((&bin, &w), &r) in folded.bins.iter().zip(folded.weight).zip(folded.residual) {
            bin_weight[bin] += w;
            bin_residual[bin] += w * r;
        }

        let cumsum = |values: &[f64]| -> Vec<f64> {
            std::iter::once(0.0)
                .chain(values.iter().chain(values).scan(0.0, |acc, &x| {
                    *acc += x;
                    Some(*acc)
                }))
                .collect()
        };
        let cum_weight = cumsum(&bin_weight);
        let cum_residual = cumsum(&bin_residual);

        let mut best = BoxFit::null(boxes.widths[0]);
        for &width in &boxes.widths {
            for start in 0..n_bins {
                let end = start + width;
                best.keep_best(BoxFit::evaluate(
                    start,
                    width,
                    cum_weight[end] - cum_weight[start],
                    cum_residual[end] - cum_residual[start],
                    folded.total_weight,
                ));
            }
        }
        best
    }
}

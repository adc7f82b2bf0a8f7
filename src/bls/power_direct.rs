use crate::bls::power_trait::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Direct box search executor
///
/// Every trial box is evaluated by a pass over all observations, so the time per period is
/// $O(N N_\mathrm{bins} N_\mathrm{widths})$. It is recommended to use
/// [BlsPowerBinned](crate::bls::BlsPowerBinned) instead, this executor gives the same boxes and is
/// kept as a reference.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Direct")]
pub struct BlsPowerDirect;

impl BlsPowerTrait for BlsPowerDirect {
    fn best_box(&self, folded: &FoldedSeries<'_>, boxes: &BoxGrid) -> BoxFit {
        let n_bins = boxes.n_bins;
        let mut best = BoxFit::null(boxes.widths[0]);
        for &width in &boxes.widths {
            for start in 0..n_bins {
                let (weight_in, residual_in) = folded
                    .bins
                    .iter()
                    .zip(folded.weight)
                    .zip(folded.residual)
                    .filter(|&((&bin, _), _)| (bin + n_bins - start) % n_bins < width)
                    .fold((0.0, 0.0), |(w_sum, r_sum), ((_, &w), &r)| {
                        (w_sum + w, r_sum + w * r)
                    });
                best.keep_best(BoxFit::evaluate(
                    start,
                    width,
                    weight_in,
                    residual_in,
                    folded.total_weight,
                ));
            }
        }
        best
    }
}

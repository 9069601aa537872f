use crate::combine::{CombineFunction, Combined};
use crate::consts::MAD_TO_SIGMA;

use super::stats::median_in_place;

/// Median of all unmasked samples. Weights are ignored.
///
/// Variance channel: `(1.4826 * MAD)^2`, the squared robust sigma.
/// Uses `select_nth_unstable` for O(n) selection without a full sort.
#[derive(Clone, Copy, Debug, Default)]
pub struct Median;

impl CombineFunction for Median {
    type Config = ();

    fn name(&self) -> &'static str {
        "median"
    }

    fn reduce(&self, values: &mut [f64], weights: &mut [f64], _config: &()) -> Combined {
        let n = values.len();
        let median = median_in_place(values);

        // Weights are unused here, so their buffer holds the deviations.
        for (dev, &v) in weights.iter_mut().zip(values.iter()) {
            *dev = (v - median).abs();
        }
        let sigma = MAD_TO_SIGMA * median_in_place(weights);

        Combined::new(median, sigma * sigma, n)
    }
}

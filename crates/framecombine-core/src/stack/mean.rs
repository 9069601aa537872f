use crate::combine::{CombineFunction, Combined};

use super::stats::weighted_mean_variance;

/// Weighted mean of all unmasked samples.
///
/// Variance channel: unbiased weighted sample variance of the samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean;

impl CombineFunction for Mean {
    type Config = ();

    fn name(&self) -> &'static str {
        "mean"
    }

    fn reduce(&self, values: &mut [f64], weights: &mut [f64], _config: &()) -> Combined {
        let (mean, variance) = weighted_mean_variance(values, weights);
        Combined::new(mean, variance, values.len())
    }
}

use serde::{Deserialize, Serialize};

use crate::combine::{CombineFunction, Combined};

use super::stats::weighted_mean_variance;

/// Number of extreme samples dropped at each end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxParams {
    pub nlow: usize,
    pub nhigh: usize,
}

impl Default for MinMaxParams {
    fn default() -> Self {
        Self { nlow: 1, nhigh: 1 }
    }
}

/// Weighted mean after dropping the `nlow` lowest and `nhigh` highest
/// samples. When a pixel has no more than `nlow + nhigh` samples nothing is
/// dropped there.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinMax;

impl CombineFunction for MinMax {
    type Config = MinMaxParams;

    fn name(&self) -> &'static str {
        "min-max"
    }

    fn reduce(&self, values: &mut [f64], weights: &mut [f64], params: &MinMaxParams) -> Combined {
        let n = values.len();
        if params.nlow + params.nhigh >= n {
            let (mean, variance) = weighted_mean_variance(values, weights);
            return Combined::new(mean, variance, n);
        }

        // Partial selection: O(n * (nlow + nhigh)), cheap for the usual
        // one or two rejections per end.
        for k in 0..params.nlow {
            let i = k + position_of(&values[k..], |a, b| a < b);
            values.swap(k, i);
            weights.swap(k, i);
        }
        for k in 0..params.nhigh {
            let end = n - k;
            let i = params.nlow + position_of(&values[params.nlow..end], |a, b| a > b);
            values.swap(end - 1, i);
            weights.swap(end - 1, i);
        }

        let kept = params.nlow..n - params.nhigh;
        let (mean, variance) =
            weighted_mean_variance(&values[kept.clone()], &weights[kept.clone()]);
        Combined::new(mean, variance, kept.len())
    }
}

/// Index of the first element that beats every other under `better`.
fn position_of(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_picks_first_extreme() {
        assert_eq!(position_of(&[3.0, 1.0, 1.0, 5.0], |a, b| a < b), 1);
        assert_eq!(position_of(&[3.0, 5.0, 5.0, 1.0], |a, b| a > b), 1);
    }

    #[test]
    fn test_drops_one_each_end() {
        let mut values = [5.0, 100.0, 4.0, -50.0, 6.0];
        let mut weights = [1.0; 5];
        let out = MinMax.reduce(&mut values, &mut weights, &MinMaxParams::default());
        assert_eq!(out.count, 3);
        assert!((out.value - 5.0).abs() < 1e-12);
        assert!((out.variance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_keeps_weights_paired() {
        // The dropped high sample carries the large weight.
        let mut values = [1.0, 2.0, 3.0, 10.0];
        let mut weights = [1.0, 1.0, 1.0, 100.0];
        let params = MinMaxParams { nlow: 0, nhigh: 1 };
        let out = MinMax.reduce(&mut values, &mut weights, &params);
        assert_eq!(out.count, 3);
        assert!((out.value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_samples_keeps_all() {
        let mut values = [1.0, 3.0];
        let mut weights = [1.0, 1.0];
        let out = MinMax.reduce(&mut values, &mut weights, &MinMaxParams::default());
        assert_eq!(out.count, 2);
        assert!((out.value - 2.0).abs() < 1e-12);
    }
}

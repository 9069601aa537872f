use crate::consts::EPSILON;

/// Weighted mean and unbiased weighted sample variance.
///
/// Uses reliability weights: `var = sum(w * (x - m)^2) / (V1 - V2 / V1)` with
/// `V1 = sum(w)` and `V2 = sum(w^2)`, which reduces to the usual `n - 1`
/// denominator for unit weights. Falls back to unit weights when every
/// weight is zero. Variance is 0 for a single sample or a single nonzero
/// weight.
pub(crate) fn weighted_mean_variance(values: &[f64], weights: &[f64]) -> (f64, f64) {
    debug_assert_eq!(values.len(), weights.len());
    let n = values.len();
    if n == 0 {
        return (0.0, 0.0);
    }

    let v1: f64 = weights.iter().sum();
    if v1 <= 0.0 {
        return unweighted_mean_variance(values);
    }

    let mean = values
        .iter()
        .zip(weights)
        .map(|(&x, &w)| w * x)
        .sum::<f64>()
        / v1;

    let v2: f64 = weights.iter().map(|&w| w * w).sum();
    // Relative to V1 so the result does not depend on the weights' scale.
    let denom = v1 - v2 / v1;
    if n < 2 || denom <= EPSILON * v1 {
        return (mean, 0.0);
    }

    let ss: f64 = values
        .iter()
        .zip(weights)
        .map(|(&x, &w)| {
            let d = x - mean;
            w * d * d
        })
        .sum();
    (mean, ss / denom)
}

fn unweighted_mean_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|&x| (x - mean) * (x - mean)).sum();
    (mean, ss / (n - 1) as f64)
}

/// Median via `select_nth_unstable`, reordering `values`.
pub(crate) fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    match n {
        0 => 0.0,
        1 => values[0],
        _ if n % 2 == 1 => *values.select_nth_unstable_by(n / 2, |a, b| a.total_cmp(b)).1,
        _ => {
            let mid = n / 2;
            values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            let upper = values[mid];
            let lower = *values[..mid]
                .select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b))
                .1;
            (lower + upper) / 2.0
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::combine::{CombineFunction, Combined};
use crate::consts::{DEFAULT_CLIP_ITERATIONS, DEFAULT_CLIP_SIGMA, EPSILON, MIN_CLIP_SAMPLES};
use crate::error::{CombineError, Result};

use super::stats::weighted_mean_variance;

/// Parameters for sigma-clipped mean combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigmaClipParams {
    /// Values below mean - sigma_low * stddev are rejected (default: 3.0).
    pub sigma_low: f32,
    /// Values above mean + sigma_high * stddev are rejected (default: 3.0).
    pub sigma_high: f32,
    /// Maximum number of rejection passes (default: 3).
    pub iterations: usize,
}

impl Default for SigmaClipParams {
    fn default() -> Self {
        Self {
            sigma_low: DEFAULT_CLIP_SIGMA,
            sigma_high: DEFAULT_CLIP_SIGMA,
            iterations: DEFAULT_CLIP_ITERATIONS,
        }
    }
}

impl SigmaClipParams {
    pub fn symmetric(sigma: f32, iterations: usize) -> Self {
        Self {
            sigma_low: sigma,
            sigma_high: sigma,
            iterations,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sigma_low > 0.0 && self.sigma_high > 0.0) {
            return Err(CombineError::InvalidParameter(format!(
                "sigma thresholds must be positive (low {}, high {})",
                self.sigma_low, self.sigma_high
            )));
        }
        if self.iterations == 0 {
            return Err(CombineError::InvalidParameter(
                "sigma clipping needs at least one iteration".into(),
            ));
        }
        Ok(())
    }
}

/// Iterative sigma-clipped weighted mean.
///
/// Each pass computes the weighted mean and standard deviation of the
/// surviving samples and rejects those outside
/// `[mean - sigma_low * std, mean + sigma_high * std]`. Stops when a pass
/// rejects nothing, the spread collapses, fewer than three samples remain,
/// or a pass would reject everything.
///
/// Variance channel: weighted sample variance of the survivors.
/// Count channel: number of survivors.
#[derive(Clone, Copy, Debug, Default)]
pub struct SigmaClip;

impl CombineFunction for SigmaClip {
    type Config = SigmaClipParams;

    fn name(&self) -> &'static str {
        "sigma-clip"
    }

    fn reduce(
        &self,
        values: &mut [f64],
        weights: &mut [f64],
        params: &SigmaClipParams,
    ) -> Combined {
        let mut len = values.len();

        for _ in 0..params.iterations {
            if len < MIN_CLIP_SAMPLES {
                break;
            }
            let (mean, variance) = weighted_mean_variance(&values[..len], &weights[..len]);
            let stddev = variance.sqrt();
            if stddev < EPSILON {
                break;
            }
            let lo = mean - params.sigma_low as f64 * stddev;
            let hi = mean + params.sigma_high as f64 * stddev;

            let survivors = values[..len]
                .iter()
                .filter(|&&v| v >= lo && v <= hi)
                .count();
            if survivors == len || survivors == 0 {
                break;
            }

            // Compact survivors to the front, keeping weights paired.
            let mut write = 0;
            for read in 0..len {
                let v = values[read];
                if v >= lo && v <= hi {
                    values[write] = v;
                    weights[write] = weights[read];
                    write += 1;
                }
            }
            len = write;
        }

        let (mean, variance) = weighted_mean_variance(&values[..len], &weights[..len]);
        Combined::new(mean, variance, len)
    }
}

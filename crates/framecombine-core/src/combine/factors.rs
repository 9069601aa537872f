use serde::{Deserialize, Serialize};

/// Per-frame zero offsets, scale factors and weights.
///
/// Sample `raw` of frame `i` enters the combine function as
/// `(raw - zeros[i]) * scales[i]` together with `weights[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameFactors {
    pub zeros: Vec<f64>,
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
}

impl FrameFactors {
    pub fn new(zeros: Vec<f64>, scales: Vec<f64>, weights: Vec<f64>) -> Self {
        Self {
            zeros,
            scales,
            weights,
        }
    }

    /// Identity transform with unit weights for `n` frames.
    pub fn uniform(n: usize) -> Self {
        Self {
            zeros: vec![0.0; n],
            scales: vec![1.0; n],
            weights: vec![1.0; n],
        }
    }

    /// Replace the weights, keeping zeros and scales.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn len(&self) -> usize {
        self.zeros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zeros.is_empty()
    }

    #[inline]
    pub fn transform(&self, frame: usize, raw: f64) -> f64 {
        (raw - self.zeros[frame]) * self.scales[frame]
    }
}

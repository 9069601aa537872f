//! Per-frame zero/scale factors derived from each frame's masked median.

use std::fmt;

use ndarray::{ArrayView, Dimension};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combine::FrameFactors;
use crate::consts::EPSILON;
use crate::error::{CombineError, Result};
use crate::stack::median_of;

/// How frames are brought to a common level before combining.
///
/// The reference level is the median of the first frame that has at least
/// one unmasked pixel. Fully masked frames keep identity factors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    #[default]
    None,
    /// Subtract `median_i - median_ref` (additive sky/bias level matching).
    Zero,
    /// Multiply by `median_ref / median_i` (multiplicative level matching).
    Scale,
    /// Multiply by `1 / median_i`, so every frame has unit median (flat fields).
    Unit,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::None => write!(f, "None"),
            Normalization::Zero => write!(f, "Zero Offset"),
            Normalization::Scale => write!(f, "Scale"),
            Normalization::Unit => write!(f, "Unit Median"),
        }
    }
}

/// Median of the unmasked pixels, or `None` if every pixel is masked.
pub fn masked_median<A, D>(
    image: &ArrayView<'_, A, D>,
    mask: &ArrayView<'_, bool, D>,
) -> Result<Option<f64>>
where
    A: AsPrimitive<f64>,
    D: Dimension,
{
    if image.shape() != mask.shape() {
        return Err(CombineError::ShapeMismatch {
            what: "mask",
            index: 0,
            expected: image.shape().to_vec(),
            actual: mask.shape().to_vec(),
        });
    }

    let mut values: Vec<f64> = image
        .iter()
        .zip(mask.iter())
        .filter(|(_, masked)| !**masked)
        .map(|(&v, _)| v.as_())
        .collect();

    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(median_of(&mut values)))
}

/// Compute identity-weighted factors for `normalization`.
///
/// Weights are always 1; callers that weight frames replace them with
/// [`FrameFactors::with_weights`].
pub fn frame_factors<A, D>(
    images: &[ArrayView<'_, A, D>],
    masks: &[ArrayView<'_, bool, D>],
    normalization: Normalization,
) -> Result<FrameFactors>
where
    A: AsPrimitive<f64>,
    D: Dimension,
{
    if images.is_empty() {
        return Err(CombineError::EmptyStack);
    }
    if masks.len() != images.len() {
        return Err(CombineError::LengthMismatch {
            what: "masks",
            expected: images.len(),
            actual: masks.len(),
        });
    }

    let mut factors = FrameFactors::uniform(images.len());
    if normalization == Normalization::None {
        return Ok(factors);
    }

    let mut medians = Vec::with_capacity(images.len());
    for (frame, (image, mask)) in images.iter().zip(masks).enumerate() {
        if image.shape() != mask.shape() {
            return Err(CombineError::ShapeMismatch {
                what: "mask",
                index: frame,
                expected: image.shape().to_vec(),
                actual: mask.shape().to_vec(),
            });
        }
        let median = masked_median(image, mask)?;
        debug!(frame, median = ?median, "Frame median");
        medians.push(median);
    }

    let Some(reference) = medians.iter().flatten().copied().next() else {
        info!("Every frame is fully masked, normalization skipped");
        return Ok(factors);
    };

    for (frame, median) in medians.iter().enumerate() {
        let Some(median) = *median else {
            continue;
        };
        match normalization {
            Normalization::None => {}
            Normalization::Zero => factors.zeros[frame] = median - reference,
            Normalization::Scale => {
                factors.scales[frame] = reference / checked_divisor(frame, median)?
            }
            Normalization::Unit => factors.scales[frame] = 1.0 / checked_divisor(frame, median)?,
        }
    }

    info!(
        method = %normalization,
        frames = images.len(),
        reference,
        "Frame factors computed"
    );
    Ok(factors)
}

fn checked_divisor(frame: usize, median: f64) -> Result<f64> {
    if median.is_finite() && median.abs() > EPSILON {
        Ok(median)
    } else {
        Err(CombineError::InvalidParameter(format!(
            "frame {frame} has median {median}, cannot scale-normalize"
        )))
    }
}

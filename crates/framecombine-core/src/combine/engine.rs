use ndarray::{ArrayView, ArrayViewMut, Axis, Dimension, IntoDimension};
use num_traits::AsPrimitive;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{CombineError, Result};

use super::factors::FrameFactors;
use super::function::{CombineFunction, Combined};
use super::outputs::{CombineOutputs, CombineResult, OutputChannel};

/// Tuning knobs for a combine call.
#[derive(Clone, Debug, PartialEq)]
pub struct CombineOptions {
    /// Written to every position where all frames are masked.
    pub blank: Combined,
    /// Pixel count at or above which the loop runs on the Rayon pool.
    pub parallel_threshold: usize,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            blank: Combined::BLANK,
            parallel_threshold: PARALLEL_PIXEL_THRESHOLD,
        }
    }
}

/// Combine a stack of frames into `outputs` with the default options.
///
/// See [`combine_with_options`].
pub fn combine<A, D, F>(
    images: &[ArrayView<'_, A, D>],
    masks: &[ArrayView<'_, bool, D>],
    factors: &FrameFactors,
    outputs: &mut CombineOutputs<'_, D>,
    function: &F,
    config: &F::Config,
) -> Result<usize>
where
    A: AsPrimitive<f64> + Sync,
    D: Dimension + ndarray::RemoveAxis,
    F: CombineFunction,
{
    combine_with_options(
        images,
        masks,
        factors,
        outputs,
        function,
        config,
        &CombineOptions::default(),
    )
}

/// Combine a stack of frames into `outputs`.
///
/// For every pixel position, samples whose mask is `true` are skipped, the
/// rest are transformed to `(raw - zero) * scale` and handed to `function`
/// with their weights. The returned value, variance and count are written to
/// the matching output channels. Positions where every frame is masked get
/// `options.blank` and never reach `function`.
///
/// All shape and length checks run before the first output element is
/// written. The stack size is `images.len()`. Returns the number of
/// positions that received the blank sentinel.
pub fn combine_with_options<A, D, F>(
    images: &[ArrayView<'_, A, D>],
    masks: &[ArrayView<'_, bool, D>],
    factors: &FrameFactors,
    outputs: &mut CombineOutputs<'_, D>,
    function: &F,
    config: &F::Config,
    options: &CombineOptions,
) -> Result<usize>
where
    A: AsPrimitive<f64> + Sync,
    D: Dimension + ndarray::RemoveAxis,
    F: CombineFunction,
{
    validate_stack(images, masks, factors, outputs)?;

    let gather = PixelGather {
        images,
        masks,
        factors,
        function,
        config,
        blank: options.blank,
    };
    let stack_size = images.len();
    let pixels = outputs.value.len();
    let template = outputs.value.raw_dim();
    let CombineOutputs {
        value,
        variance,
        count,
    } = outputs;

    if pixels >= options.parallel_threshold && template.ndim() > 0 {
        // One slab per index along the first axis; each worker reuses its
        // working set and index buffer across slabs.
        value
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(variance.axis_iter_mut(Axis(0)))
            .zip(count.axis_iter_mut(Axis(0)))
            .enumerate()
            .map_init(
                || (WorkingSet::with_capacity(stack_size), template.clone()),
                |(working, index), (outer, ((value, variance), count))| {
                    index[0] = outer;
                    gather.reduce_block(index, 1, value, variance, count, working)
                },
            )
            .try_reduce(|| 0, |a, b| Ok(a + b))
    } else {
        let mut working = WorkingSet::with_capacity(stack_size);
        let mut index = template;
        gather.reduce_block(
            &mut index,
            0,
            value.view_mut(),
            variance.view_mut(),
            count.view_mut(),
            &mut working,
        )
    }
}

/// Allocate output arrays shaped like the first frame and combine into them.
///
/// The blank position count is kept in [`CombineResult::blank`].
pub fn combine_owned<A, D, F>(
    images: &[ArrayView<'_, A, D>],
    masks: &[ArrayView<'_, bool, D>],
    factors: &FrameFactors,
    function: &F,
    config: &F::Config,
    options: &CombineOptions,
) -> Result<CombineResult<D>>
where
    A: AsPrimitive<f64> + Sync,
    D: Dimension + ndarray::RemoveAxis,
    F: CombineFunction,
{
    let first = images.first().ok_or(CombineError::EmptyStack)?;
    let mut result = CombineResult::zeros(first.raw_dim());
    result.blank = combine_with_options(
        images,
        masks,
        factors,
        &mut result.outputs_mut(),
        function,
        config,
        options,
    )?;
    Ok(result)
}

fn validate_stack<A, D>(
    images: &[ArrayView<'_, A, D>],
    masks: &[ArrayView<'_, bool, D>],
    factors: &FrameFactors,
    outputs: &CombineOutputs<'_, D>,
) -> Result<()>
where
    D: Dimension,
{
    let first = images.first().ok_or(CombineError::EmptyStack)?;
    let stack_size = images.len();

    check_len("masks", stack_size, masks.len())?;
    check_len("zeros", stack_size, factors.zeros.len())?;
    check_len("scales", stack_size, factors.scales.len())?;
    check_len("weights", stack_size, factors.weights.len())?;

    let shape = first.shape();
    for (index, image) in images.iter().enumerate().skip(1) {
        check_shape("image", index, shape, image.shape())?;
    }
    for (index, mask) in masks.iter().enumerate() {
        check_shape("mask", index, shape, mask.shape())?;
    }
    for channel in OutputChannel::ALL {
        let actual = outputs.shape(channel);
        if actual != shape {
            return Err(CombineError::OutputShapeMismatch {
                channel: channel.name(),
                expected: shape.to_vec(),
                actual: actual.to_vec(),
            });
        }
    }

    for (frame, (zero, scale)) in factors.zeros.iter().zip(&factors.scales).enumerate() {
        if !zero.is_finite() || !scale.is_finite() {
            return Err(CombineError::InvalidParameter(format!(
                "frame {frame}: zero offset ({zero}) and scale ({scale}) must be finite"
            )));
        }
    }
    for (frame, &weight) in factors.weights.iter().enumerate() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(CombineError::InvalidParameter(format!(
                "frame {frame}: weight must be finite and non-negative, got {weight}"
            )));
        }
    }

    Ok(())
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CombineError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn check_shape(what: &'static str, index: usize, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CombineError::ShapeMismatch {
            what,
            index,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

#[inline]
fn store(combined: Combined, value: &mut f32, variance: &mut f32, count: &mut u32) {
    *value = combined.value as f32;
    *variance = combined.variance as f32;
    *count = combined.count as u32;
}

/// Per-pixel scratch buffers, reused across positions.
struct WorkingSet {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl WorkingSet {
    fn with_capacity(stack_size: usize) -> Self {
        Self {
            values: Vec::with_capacity(stack_size),
            weights: Vec::with_capacity(stack_size),
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.weights.clear();
    }
}

struct PixelGather<'s, 'i, 'm, A, D: Dimension, F: CombineFunction> {
    images: &'s [ArrayView<'i, A, D>],
    masks: &'s [ArrayView<'m, bool, D>],
    factors: &'s FrameFactors,
    function: &'s F,
    config: &'s F::Config,
    blank: Combined,
}

impl<A, D, F> PixelGather<'_, '_, '_, A, D, F>
where
    A: AsPrimitive<f64>,
    D: Dimension,
    F: CombineFunction,
{
    /// Reduce every position of a block of the outputs.
    ///
    /// `index[..prefix]` already holds the block's position in the full
    /// arrays; the remaining axes are filled in per position. Returns the
    /// number of blank positions written.
    fn reduce_block<E: Dimension>(
        &self,
        index: &mut D,
        prefix: usize,
        mut value: ArrayViewMut<'_, f32, E>,
        mut variance: ArrayViewMut<'_, f32, E>,
        mut count: ArrayViewMut<'_, u32, E>,
        working: &mut WorkingSet,
    ) -> Result<usize> {
        let mut blank = 0;
        let positions = value
            .indexed_iter_mut()
            .zip(variance.iter_mut())
            .zip(count.iter_mut());
        for (((inner, value), variance), count) in positions {
            index.slice_mut()[prefix..].copy_from_slice(inner.into_dimension().slice());
            let combined = match self.reduce_at(index, working)? {
                Some(combined) => combined,
                None => {
                    blank += 1;
                    self.blank
                }
            };
            store(combined, value, variance, count);
        }
        Ok(blank)
    }

    /// `None` when every frame is masked at `index`.
    fn reduce_at(&self, index: &D, working: &mut WorkingSet) -> Result<Option<Combined>> {
        working.clear();
        for (frame, (image, mask)) in self.images.iter().zip(self.masks).enumerate() {
            if mask[index.clone()] {
                continue;
            }
            let raw: f64 = image[index.clone()].as_();
            working.values.push(self.factors.transform(frame, raw));
            working.weights.push(self.factors.weights[frame]);
        }

        if working.values.is_empty() {
            return Ok(None);
        }

        let available = working.values.len();
        let combined = self
            .function
            .reduce(&mut working.values, &mut working.weights, self.config);
        if combined.count > available {
            return Err(CombineError::PluginContract {
                function: self.function.name(),
                reason: format!(
                    "reported {} contributing samples from a working set of {}",
                    combined.count, available
                ),
            });
        }
        Ok(Some(combined))
    }
}

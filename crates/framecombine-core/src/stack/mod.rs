//! Concrete combine functions and a serializable registry to select them.

pub mod mean;
pub mod median;
pub mod minmax;
pub mod sigma_clip;
mod stats;

pub(crate) use self::stats::median_in_place as median_of;

use std::fmt;

use ndarray::{ArrayView, Dimension};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combine::{
    combine_owned, combine_with_options, CombineOptions, CombineOutputs, CombineResult,
    FrameFactors,
};
use crate::error::Result;

use self::mean::Mean;
use self::median::Median;
use self::minmax::{MinMax, MinMaxParams};
use self::sigma_clip::{SigmaClip, SigmaClipParams};

/// A combine function together with its configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CombineMethod {
    #[default]
    Mean,
    Median,
    SigmaClip(SigmaClipParams),
    MinMax(MinMaxParams),
}

impl fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMethod::Mean => write!(f, "Mean"),
            CombineMethod::Median => write!(f, "Median"),
            CombineMethod::SigmaClip(p) => write!(
                f,
                "Sigma Clip (low {:.1}, high {:.1}, {} iter)",
                p.sigma_low, p.sigma_high, p.iterations
            ),
            CombineMethod::MinMax(p) => {
                write!(f, "Min/Max (drop {} low, {} high)", p.nlow, p.nhigh)
            }
        }
    }
}

impl CombineMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CombineMethod::Mean => "mean",
            CombineMethod::Median => "median",
            CombineMethod::SigmaClip(_) => "sigma-clip",
            CombineMethod::MinMax(_) => "min-max",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CombineMethod::SigmaClip(params) => params.validate(),
            CombineMethod::Mean | CombineMethod::Median | CombineMethod::MinMax(_) => Ok(()),
        }
    }

    /// Run the combine engine with this method into caller-owned outputs.
    ///
    /// Returns the number of positions that received the blank sentinel.
    pub fn combine<A, D>(
        &self,
        images: &[ArrayView<'_, A, D>],
        masks: &[ArrayView<'_, bool, D>],
        factors: &FrameFactors,
        outputs: &mut CombineOutputs<'_, D>,
        options: &CombineOptions,
    ) -> Result<usize>
    where
        A: AsPrimitive<f64> + Sync,
        D: Dimension + ndarray::RemoveAxis,
    {
        self.validate()?;
        debug!(method = %self, frames = images.len(), "Combining stack");

        match self {
            CombineMethod::Mean => {
                combine_with_options(images, masks, factors, outputs, &Mean, &(), options)
            }
            CombineMethod::Median => {
                combine_with_options(images, masks, factors, outputs, &Median, &(), options)
            }
            CombineMethod::SigmaClip(params) => {
                combine_with_options(images, masks, factors, outputs, &SigmaClip, params, options)
            }
            CombineMethod::MinMax(params) => {
                combine_with_options(images, masks, factors, outputs, &MinMax, params, options)
            }
        }
    }

    /// Run the combine engine with this method into freshly allocated outputs.
    pub fn combine_owned<A, D>(
        &self,
        images: &[ArrayView<'_, A, D>],
        masks: &[ArrayView<'_, bool, D>],
        factors: &FrameFactors,
        options: &CombineOptions,
    ) -> Result<CombineResult<D>>
    where
        A: AsPrimitive<f64> + Sync,
        D: Dimension + ndarray::RemoveAxis,
    {
        self.validate()?;
        debug!(method = %self, frames = images.len(), "Combining stack");

        match self {
            CombineMethod::Mean => combine_owned(images, masks, factors, &Mean, &(), options),
            CombineMethod::Median => combine_owned(images, masks, factors, &Median, &(), options),
            CombineMethod::SigmaClip(params) => {
                combine_owned(images, masks, factors, &SigmaClip, params, options)
            }
            CombineMethod::MinMax(params) => {
                combine_owned(images, masks, factors, &MinMax, params, options)
            }
        }
    }
}

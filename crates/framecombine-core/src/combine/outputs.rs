use std::fmt;

use ndarray::{Array, ArrayViewMut, Dimension};

use crate::consts::OUTPUT_CHANNELS;

/// One of the arrays written by the combine engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputChannel {
    Value,
    Variance,
    Count,
}

impl OutputChannel {
    pub const ALL: [OutputChannel; OUTPUT_CHANNELS] = [
        OutputChannel::Value,
        OutputChannel::Variance,
        OutputChannel::Count,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OutputChannel::Value => "value",
            OutputChannel::Variance => "variance",
            OutputChannel::Count => "count",
        }
    }
}

impl fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-owned output buffers, borrowed mutably for one combine call.
pub struct CombineOutputs<'a, D: Dimension> {
    pub value: ArrayViewMut<'a, f32, D>,
    pub variance: ArrayViewMut<'a, f32, D>,
    pub count: ArrayViewMut<'a, u32, D>,
}

impl<'a, D: Dimension> CombineOutputs<'a, D> {
    pub fn new(
        value: ArrayViewMut<'a, f32, D>,
        variance: ArrayViewMut<'a, f32, D>,
        count: ArrayViewMut<'a, u32, D>,
    ) -> Self {
        Self {
            value,
            variance,
            count,
        }
    }

    pub fn shape(&self, channel: OutputChannel) -> &[usize] {
        match channel {
            OutputChannel::Value => self.value.shape(),
            OutputChannel::Variance => self.variance.shape(),
            OutputChannel::Count => self.count.shape(),
        }
    }
}

/// Owned output arrays for callers that do not manage their own buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct CombineResult<D: Dimension> {
    pub value: Array<f32, D>,
    pub variance: Array<f32, D>,
    pub count: Array<u32, D>,
    /// Positions where every frame was masked, as reported by the engine
    /// call that filled this result.
    pub blank: usize,
}

impl<D: Dimension> CombineResult<D> {
    pub fn zeros(dim: D) -> Self {
        Self {
            value: Array::zeros(dim.clone()),
            variance: Array::zeros(dim.clone()),
            count: Array::zeros(dim),
            blank: 0,
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub fn outputs_mut(&mut self) -> CombineOutputs<'_, D> {
        CombineOutputs::new(
            self.value.view_mut(),
            self.variance.view_mut(),
            self.count.view_mut(),
        )
    }
}

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{ArrayView, Dimension};
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::combine::FrameFactors;
use crate::error::{CombineError, Result};
use crate::normalize::{frame_factors, Normalization};
use crate::stack::CombineMethod;

/// A complete combine job: which frames, how to weigh them, how to reduce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombineConfig {
    /// Output prefix; channels are written to `<output>_<channel>.<ext>`.
    pub output: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub method: CombineMethod,
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Tiff,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tiff => "tiff",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Tiff => write!(f, "TIFF (32-bit float)"),
            OutputFormat::Png => write!(f, "PNG (16-bit)"),
        }
    }
}

/// One input frame with its optional mask and calibration factors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<PathBuf>,
    #[serde(default)]
    pub zero: f64,
    #[serde(default = "unit")]
    pub scale: f64,
    #[serde(default = "unit")]
    pub weight: f64,
}

fn unit() -> f64 {
    1.0
}

impl FrameEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mask: None,
            zero: 0.0,
            scale: 1.0,
            weight: 1.0,
        }
    }

    pub fn with_mask(mut self, mask: impl Into<PathBuf>) -> Self {
        self.mask = Some(mask.into());
        self
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("combined"),
            format: OutputFormat::default(),
            normalization: Normalization::default(),
            method: CombineMethod::default(),
            frames: Vec::new(),
        }
    }
}

impl CombineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(CombineError::EmptyStack);
        }
        self.method.validate()?;
        for (i, frame) in self.frames.iter().enumerate() {
            if !frame.zero.is_finite() || !frame.scale.is_finite() {
                return Err(CombineError::Config(format!(
                    "frame {i} ({}): zero and scale must be finite",
                    frame.path.display()
                )));
            }
            if !frame.weight.is_finite() || frame.weight < 0.0 {
                return Err(CombineError::Config(format!(
                    "frame {i} ({}): weight must be finite and non-negative",
                    frame.path.display()
                )));
            }
        }
        Ok(())
    }

    /// Make relative frame and mask paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output);
        for frame in &mut self.frames {
            resolve(&mut frame.path);
            if let Some(mask) = frame.mask.as_mut() {
                resolve(mask);
            }
        }
    }

    /// Factors exactly as listed per frame.
    pub fn factors(&self) -> FrameFactors {
        FrameFactors::new(
            self.frames.iter().map(|f| f.zero).collect(),
            self.frames.iter().map(|f| f.scale).collect(),
            self.frames.iter().map(|f| f.weight).collect(),
        )
    }

    /// Factors after applying `normalization` to the loaded stack.
    ///
    /// The normalized component (zeros for `Zero`, scales for `Scale` and
    /// `Unit`) replaces the listed one; the other component and the weights
    /// come from the frame entries.
    pub fn resolve_factors<A, D>(
        &self,
        images: &[ArrayView<'_, A, D>],
        masks: &[ArrayView<'_, bool, D>],
    ) -> Result<FrameFactors>
    where
        A: AsPrimitive<f64>,
        D: Dimension,
    {
        let mut factors = self.factors();
        let derived = frame_factors(images, masks, self.normalization)?;
        match self.normalization {
            Normalization::None => {}
            Normalization::Zero => factors.zeros = derived.zeros,
            Normalization::Scale | Normalization::Unit => factors.scales = derived.scales,
        }
        Ok(factors)
    }
}

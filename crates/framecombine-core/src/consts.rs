/// Minimum pixel count at which the combine loop runs on the Rayon pool.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of output channels written per pixel (value, variance, count).
pub const OUTPUT_CHANNELS: usize = 3;

/// Scale factor from median absolute deviation to the standard deviation
/// of a normal distribution.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Standard deviations below this are treated as zero spread.
pub const EPSILON: f64 = 1e-12;

/// Default low/high rejection threshold for sigma clipping.
pub const DEFAULT_CLIP_SIGMA: f32 = 3.0;

/// Default number of sigma-clipping passes.
pub const DEFAULT_CLIP_ITERATIONS: usize = 3;

/// Minimum working-set size for which sigma clipping still rejects.
pub const MIN_CLIP_SAMPLES: usize = 3;

/// Largest count representable in a 16-bit output image.
pub const MAX_COUNT_PIXEL: u32 = u16::MAX as u32;

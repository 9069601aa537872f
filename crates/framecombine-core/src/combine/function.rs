/// Result of reducing one pixel's working set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Combined {
    /// Combined pixel value.
    pub value: f64,
    /// Variance estimate as defined by the combine function.
    pub variance: f64,
    /// Number of samples that contributed to `value`.
    pub count: usize,
}

impl Combined {
    /// Written to positions where every frame is masked.
    pub const BLANK: Combined = Combined {
        value: 0.0,
        variance: 0.0,
        count: 0,
    };

    pub fn new(value: f64, variance: f64, count: usize) -> Self {
        Self {
            value,
            variance,
            count,
        }
    }
}

/// A per-pixel reduction strategy plugged into the combine engine.
///
/// The engine calls [`reduce`](CombineFunction::reduce) once for every pixel
/// position that has at least one unmasked sample. `values` holds the
/// transformed samples `(raw - zero) * scale` and `weights` the matching
/// per-frame weights; both have the same, non-zero length.
///
/// The slices are a scratch working set owned by the engine and rebuilt for
/// every pixel. Implementations may reorder or overwrite them, but must not
/// keep state between calls: the engine may call `reduce` from several
/// threads at once and relies on each result depending only on its inputs.
///
/// `config` is the caller's configuration payload, passed through unchanged
/// on every call.
pub trait CombineFunction: Sync {
    type Config: Sync;

    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    fn reduce(&self, values: &mut [f64], weights: &mut [f64], config: &Self::Config) -> Combined;
}

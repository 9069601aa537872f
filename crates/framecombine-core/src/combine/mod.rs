//! Generic stack combination: gather, transform, reduce, write back.

pub mod engine;
pub mod factors;
pub mod function;
pub mod outputs;

pub use engine::{combine, combine_owned, combine_with_options, CombineOptions};
pub use factors::FrameFactors;
pub use function::{CombineFunction, Combined};
pub use outputs::{CombineOutputs, CombineResult, OutputChannel};

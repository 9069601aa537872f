use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Empty frame stack")]
    EmptyStack,

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch for {what} {index}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Output channel '{channel}' has shape {actual:?}, expected {expected:?}")]
    OutputShapeMismatch {
        channel: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Combine function '{function}' broke its contract: {reason}")]
    PluginContract {
        function: &'static str,
        reason: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CombineError>;

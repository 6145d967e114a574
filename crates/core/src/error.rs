//! Error types for the vellum rendering library.

use thiserror::Error;

/// Primary error type for SVG rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid SVG dimensions: {width} x {height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("unknown shading pattern type: {0}")]
    UnknownShadingType(String),

    #[error("bitmap-backed image data is unsupported")]
    UnsupportedBitmapImage,

    #[error("dependency not preloaded: {0}")]
    MissingDependency(String),

    #[error("state stack underflow in {0}")]
    StackUnderflow(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("png encode error: {0}")]
    Png(#[from] png::EncodingError),

    #[error("malformed page bundle: {0}")]
    Bundle(String),
}

/// Convenience Result type alias for RenderError.
pub type Result<T> = std::result::Result<T, RenderError>;

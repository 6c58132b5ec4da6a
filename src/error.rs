use thiserror::Error;

/// Failures reported by the palette pipeline.
///
/// Color conversions are total and never fail; everything else reports
/// synchronously to the immediate caller.
#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PaletteError>;

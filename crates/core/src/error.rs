//! Error types for terrakit

use thiserror::Error;

/// Main error type for terrakit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("degenerate affine transform (determinant {det}): {coeffs:?}")]
    DegenerateTransform { det: f64, coeffs: [f64; 6] },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid arguments: {name} ({reason})")]
    InvalidArguments { name: &'static str, reason: String },

    #[error("cannot save {count} bands to an image-backed format (1, 3 or 4 supported)")]
    BandCount { count: usize },

    #[error("band index {band} out of range for raster with {count} bands")]
    BandIndex { band: usize, count: usize },

    #[error("index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch {
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    #[error("expression error: {0}")]
    Expression(String),

    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for terrakit operations
pub type Result<T> = std::result::Result<T, Error>;

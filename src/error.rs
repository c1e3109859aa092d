//! Error types for the PDF workbench library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF workbench library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// ZIP packaging error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Input format is not one we can convert
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// No usable conversion engine on this machine
    #[error("LibreOffice not found; install it or put soffice on PATH")]
    EngineNotFound,

    /// The conversion engine ran and reported failure
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// The conversion engine did not finish in time
    #[error("Conversion timed out: {}", .0.display())]
    ConversionTimeout(PathBuf),

    /// The engine exited cleanly but the output file never appeared
    #[error("Converted output missing: {}", .0.display())]
    MissingOutput(PathBuf),

    /// Rotation must be a cardinal increment
    #[error("Invalid rotation: {0} (must be 90, 180 or 270)")]
    InvalidRotation(u32),

    /// Overlay and base documents must pair pages 1:1
    #[error("Page count mismatch: base has {base} pages, overlay has {overlay}")]
    PageCountMismatch { base: usize, overlay: usize },

    /// General error
    #[error("{0}")]
    General(String),
}

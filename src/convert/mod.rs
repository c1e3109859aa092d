//! Conversion of non-PDF input files to PDF
//!
//! Images are converted in process by embedding the bitmap in a one-page
//! PDF; office documents go through a headless LibreOffice run. PDF input
//! passes through untouched.

pub mod office;
pub mod raster;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// Re-export commonly used items
pub use office::convert_office_to_pdf;
pub use raster::convert_image_to_pdf;

/// Input categories the converter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Already a PDF; passed through untouched
    Pdf,
    /// Bitmap image, converted in process
    Image,
    /// Office document, converted by the external engine
    Office,
}

impl SourceFormat {
    /// Classify a file by its extension; `None` for anything unsupported.
    pub fn from_path(path: &Path) -> Option<SourceFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "jpg" | "jpeg" | "png" => Some(SourceFormat::Image),
            "docx" | "doc" | "xlsx" | "xls" | "pptx" | "ppt" | "odt" | "ods" | "odp" => {
                Some(SourceFormat::Office)
            }
            _ => None,
        }
    }
}

/// All file extensions accepted as conversion input.
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "jpg", "jpeg", "png", "pdf", "xlsx", "xls", "docx", "doc", "pptx", "ppt", "odt", "ods",
        "odp",
    ]
}

/// Convert a file to PDF, writing the result into `output_dir`.
///
/// Returns the path of the resulting PDF. PDF input is returned as-is
/// without touching the bytes. Blocking; office conversions can take tens
/// of seconds.
pub fn convert_to_pdf(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    match SourceFormat::from_path(input) {
        Some(SourceFormat::Pdf) => Ok(input.to_path_buf()),
        Some(SourceFormat::Image) => raster::convert_image_to_pdf(input, output_dir),
        Some(SourceFormat::Office) => office::convert_office_to_pdf(input, output_dir),
        None => Err(Error::UnsupportedFormat(
            input
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("(none)")
                .to_string(),
        )),
    }
}

/// Output path for converting `input` into `output_dir`: same stem, `.pdf`.
pub(crate) fn pdf_output_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::General(format!("Unusable file name: {}", input.display())))?;
    Ok(output_dir.join(format!("{}.pdf", stem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_classification() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a.pdf")),
            Some(SourceFormat::Pdf)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("photo.JPG")),
            Some(SourceFormat::Image)
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("sheet.xlsx")),
            Some(SourceFormat::Office)
        );
        assert_eq!(SourceFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "plain text").unwrap();

        let result = convert_to_pdf(&input, dir.path());
        assert!(matches!(result, Err(Error::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_pdf_passthrough_returns_input_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("already.pdf");
        std::fs::write(&input, b"%PDF-1.5 stub").unwrap();

        let result = convert_to_pdf(&input, dir.path()).unwrap();
        assert_eq!(result, input);
        assert_eq!(std::fs::read(&input).unwrap(), b"%PDF-1.5 stub");
    }

    #[test]
    fn test_supported_extensions_cover_all_formats() {
        for ext in supported_extensions() {
            let name = format!("file.{}", ext);
            assert!(SourceFormat::from_path(Path::new(&name)).is_some(), "{}", ext);
        }
    }
}

//! Direct bitmap-to-PDF conversion
//!
//! Wraps a decoded image in a one-page PDF. JPEG data is embedded as-is
//! (DCTDecode); everything else is flattened to RGB8 and deflated
//! (FlateDecode). The page is sized at 100 dpi, so a 1000px-wide image
//! becomes a 720pt-wide page.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::Result;

/// Pixels-per-inch assumed when sizing the page around the bitmap.
const RASTER_DPI: f32 = 100.0;

/// Convert a single image file to a one-page PDF in `output_dir`.
pub fn convert_image_to_pdf(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let bytes = std::fs::read(input)?;
    let format = image::guess_format(&bytes)?;
    let decoded = image::load_from_memory(&bytes)?;
    let (pixel_width, pixel_height) = decoded.dimensions();

    let (color_space, filter, data) = if format == image::ImageFormat::Jpeg {
        // JPEG entropy data is already what DCTDecode expects.
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "DeviceGray",
            _ => "DeviceRGB",
        };
        (color_space, "DCTDecode", bytes)
    } else {
        // Flatten to RGB8; alpha is discarded the way the original
        // converter's RGB mode conversion did.
        let rgb = decoded.to_rgb8();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        ("DeviceRGB", "FlateDecode", encoder.finish()?)
    };

    let page_width = pixel_width as f32 * 72.0 / RASTER_DPI;
    let page_height = pixel_height as f32 * 72.0 / RASTER_DPI;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Object::Stream(Stream {
        dict: dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => pixel_width as i64,
            "Height" => pixel_height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8i64,
            "Filter" => filter,
        },
        content: data,
        // The payload is already encoded; lopdf must not deflate it again.
        allows_compression: false,
        start_position: None,
    }));

    let content = format!(
        "q\n{:.2} 0 0 {:.2} 0 0 cm\n/Im0 Do\nQ\n",
        page_width, page_height
    );
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(page_width),
            Object::Real(page_height),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let output_path = super::pdf_output_path(input, output_dir)?;
    doc.save(&output_path)?;

    log::info!(
        "Converted {} ({}x{} px) to {}",
        input.display(),
        pixel_width,
        pixel_height,
        output_path.display()
    );

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_png_becomes_one_page_pdf_at_100_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("swatch.png");
        write_png(&input, 200, 100);

        let output = convert_image_to_pdf(&input, dir.path()).unwrap();
        assert_eq!(output, dir.path().join("swatch.pdf"));

        let doc = Document::load(&output).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let (width, height) = crate::pdf::page_size(&doc, pages[&1]);
        assert_eq!((width, height), (144.0, 72.0));
    }
}

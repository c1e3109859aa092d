//! Overlay page generation
//!
//! Builds a synthetic document with exactly one overlay page per source page,
//! sized to match the corresponding source page. The overlay is later
//! composited 1:1 by [`overlay_document`], so page order here must follow
//! source-page order. Generation only looks at page dimensions, never at
//! page content.
//!
//! Two variants share this machinery: a page-number label near the top-right
//! corner, and a rotated semi-transparent watermark across the page center.

use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};
use crate::pdf::transform::{overlay_document, page_size};

/// Inset of the page-number label from the top and right page edges, in points.
const PAGE_NUMBER_INSET: f32 = 15.0;

/// Font size of the page-number label, in points.
const PAGE_NUMBER_FONT_SIZE: f32 = 8.0;

/// Gray level used for watermark text; only the alpha varies.
const WATERMARK_GRAY: f32 = 0.5;

/// Options for generating a watermark overlay
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Text drawn across each page
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Opacity between 0.0 (invisible) and 1.0 (opaque)
    pub opacity: f32,
    /// Counter-clockwise rotation around the page midpoint, 0-90 degrees
    pub angle: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 48.0,
            opacity: 0.3,
            angle: 45.0,
        }
    }
}

/// Generate a page-number overlay for `source`.
///
/// Overlay page `i` carries the label `"{i}/{total}"` in Helvetica 8pt,
/// right-aligned 15 points in from the top-right corner of the matching
/// source page.
pub fn page_number_overlay(source: &Document) -> Result<Document> {
    let total = source.get_pages().len();

    build_overlay(source, "Helvetica", None, |page_number, width, height| {
        let label = format!("{}/{}", page_number, total);
        let label_width = text_width(&label, PAGE_NUMBER_FONT_SIZE);

        // Wide pages get a landscape canvas; the label anchor is the same
        // inset from the top-right corner in both orientations.
        let (x_anchor, y_anchor);
        if width > height {
            x_anchor = width - PAGE_NUMBER_INSET;
            y_anchor = height - PAGE_NUMBER_INSET;
        } else {
            x_anchor = width - PAGE_NUMBER_INSET;
            y_anchor = height - PAGE_NUMBER_INSET;
        }

        let mut content = String::new();
        content.push_str("BT\n");
        content.push_str(&format!("/OvF1 {} Tf\n", PAGE_NUMBER_FONT_SIZE));
        content.push_str(&format!(
            "1 0 0 1 {:.2} {:.2} Tm\n",
            x_anchor - label_width,
            y_anchor
        ));
        content.push_str(&format!("({}) Tj\n", escape_pdf_text(&label)));
        content.push_str("ET\n");
        content
    })
}

/// Generate a watermark overlay for `source`.
///
/// Every overlay page draws the configured text in Helvetica-Bold, centered
/// on the page midpoint and rotated around it, as semi-transparent gray.
pub fn watermark_overlay(source: &Document, options: &WatermarkOptions) -> Result<Document> {
    if options.text.is_empty() {
        return Err(Error::General("Watermark text is empty".to_string()));
    }
    if !(0.0..=1.0).contains(&options.opacity) {
        return Err(Error::General(format!(
            "Watermark opacity out of range: {} (must be 0.0-1.0)",
            options.opacity
        )));
    }
    if !(0.0..=90.0).contains(&options.angle) {
        return Err(Error::General(format!(
            "Watermark angle out of range: {} (must be 0-90)",
            options.angle
        )));
    }

    let text = options.text.clone();
    let font_size = options.font_size;
    let (sin, cos) = options.angle.to_radians().sin_cos();

    build_overlay(
        source,
        "Helvetica-Bold",
        Some(options.opacity),
        move |_, width, height| {
            let half_width = text_width(&text, font_size) / 2.0;

            let mut content = String::new();
            content.push_str("q\n");
            content.push_str("/OvGS1 gs\n");
            content.push_str(&format!("{} g\n", WATERMARK_GRAY));
            content.push_str("BT\n");
            content.push_str(&format!("/OvF1 {} Tf\n", font_size));
            // Rotate the text space around the page midpoint, then back the
            // pen off by half the text width so the run straddles the center.
            content.push_str(&format!(
                "{:.4} {:.4} {:.4} {:.4} {:.2} {:.2} Tm\n",
                cos,
                sin,
                -sin,
                cos,
                width / 2.0,
                height / 2.0
            ));
            content.push_str(&format!("{:.2} 0 Td\n", -half_width));
            content.push_str(&format!("({}) Tj\n", escape_pdf_text(&text)));
            content.push_str("ET\n");
            content.push_str("Q\n");
            content
        },
    )
}

/// Overlay `"{i}/{total}"` page numbers onto every page of `doc`.
pub fn add_page_numbers(doc: &mut Document) -> Result<()> {
    let overlay = page_number_overlay(doc)?;
    overlay_document(doc, overlay)
}

/// Overlay a watermark onto every page of `doc`.
pub fn apply_watermark(doc: &mut Document, options: &WatermarkOptions) -> Result<()> {
    let overlay = watermark_overlay(doc, options)?;
    overlay_document(doc, overlay)
}

/// Build an overlay document with one page per source page, in source order.
///
/// Each overlay page copies the dimensions of its source page and draws the
/// content produced by `make_content(page_number, width, height)`. Resources
/// use overlay-specific names (`OvF1`, `OvGS1`) so merging them into a page
/// cannot shadow the page's own resources.
fn build_overlay<F>(
    source: &Document,
    base_font: &str,
    opacity: Option<f32>,
    make_content: F,
) -> Result<Document>
where
    F: Fn(usize, f32, f32) -> String,
{
    let source_pages = source.get_pages();

    let mut overlay = Document::with_version("1.5");
    let pages_id = overlay.new_object_id();

    let font_id = overlay.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    });

    let gstate_id = opacity.map(|alpha| {
        overlay.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(alpha),
            "CA" => Object::Real(alpha),
        })
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, (_, &source_page_id)) in source_pages.iter().enumerate() {
        let (width, height) = page_size(source, source_page_id);

        let content = make_content(i + 1, width, height);
        let content_id = overlay.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut resources = dictionary! {
            "Font" => dictionary! { "OvF1" => font_id },
        };
        if let Some(gstate_id) = gstate_id {
            resources.set("ExtGState", dictionary! { "OvGS1" => gstate_id });
        }

        let page_id = overlay.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(width),
                Object::Real(height),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len();
    overlay.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = overlay.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    overlay.trailer.set("Root", catalog_id);

    Ok(overlay)
}

/// Escape special characters in PDF string literals
fn escape_pdf_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Measure a string in Helvetica at the given size, in points.
///
/// Widths are the standard Helvetica advance widths in 1/1000ths of the em
/// square; characters outside the printable ASCII range fall back to an
/// average advance. Bold runs a touch wider, which slightly over-insets the
/// watermark centering; acceptable for display text.
fn text_width(text: &str, font_size: f32) -> f32 {
    let milli_ems: i32 = text
        .chars()
        .map(|c| match c as u32 {
            32..=126 => HELVETICA_WIDTHS[(c as usize) - 32],
            _ => 556,
        })
        .sum();
    milli_ems as f32 / 1000.0 * font_size
}

/// Helvetica advance widths for characters 32-126, in 1/1000ths of the em
const HELVETICA_WIDTHS: [i32; 95] = [
    278,  // 32 space
    278,  // 33 !
    355,  // 34 "
    556,  // 35 #
    556,  // 36 $
    889,  // 37 %
    667,  // 38 &
    191,  // 39 '
    333,  // 40 (
    333,  // 41 )
    389,  // 42 *
    584,  // 43 +
    278,  // 44 ,
    333,  // 45 -
    278,  // 46 .
    278,  // 47 /
    556,  // 48 0
    556,  // 49 1
    556,  // 50 2
    556,  // 51 3
    556,  // 52 4
    556,  // 53 5
    556,  // 54 6
    556,  // 55 7
    556,  // 56 8
    556,  // 57 9
    278,  // 58 :
    278,  // 59 ;
    584,  // 60 <
    584,  // 61 =
    584,  // 62 >
    556,  // 63 ?
    1015, // 64 @
    667,  // 65 A
    667,  // 66 B
    722,  // 67 C
    722,  // 68 D
    667,  // 69 E
    611,  // 70 F
    778,  // 71 G
    722,  // 72 H
    278,  // 73 I
    500,  // 74 J
    667,  // 75 K
    556,  // 76 L
    833,  // 77 M
    722,  // 78 N
    778,  // 79 O
    667,  // 80 P
    778,  // 81 Q
    722,  // 82 R
    667,  // 83 S
    611,  // 84 T
    722,  // 85 U
    667,  // 86 V
    944,  // 87 W
    667,  // 88 X
    667,  // 89 Y
    611,  // 90 Z
    278,  // 91 [
    278,  // 92 \
    278,  // 93 ]
    469,  // 94 ^
    556,  // 95 _
    333,  // 96 `
    556,  // 97 a
    556,  // 98 b
    500,  // 99 c
    556,  // 100 d
    556,  // 101 e
    278,  // 102 f
    556,  // 103 g
    556,  // 104 h
    222,  // 105 i
    222,  // 106 j
    500,  // 107 k
    222,  // 108 l
    833,  // 109 m
    556,  // 110 n
    556,  // 111 o
    556,  // 112 p
    556,  // 113 q
    333,  // 114 r
    500,  // 115 s
    278,  // 116 t
    556,  // 117 u
    500,  // 118 v
    722,  // 119 w
    500,  // 120 x
    500,  // 121 y
    500,  // 122 z
    334,  // 123 {
    260,  // 124 |
    334,  // 125 }
    584,  // 126 ~
];

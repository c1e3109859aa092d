//! PDF metadata probes

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Basic information about a PDF file
#[derive(Debug, Clone)]
pub struct PdfInfo {
    /// Number of pages
    pub page_count: usize,
    /// Document title from the Info dictionary, if present
    pub title: Option<String>,
    /// Document author from the Info dictionary, if present
    pub author: Option<String>,
}

/// Number of pages in an in-memory document.
///
/// Prefers the Count entry of the root Pages node, which handles nested page
/// trees; falls back to walking the page tree when the catalog is unusual.
pub fn page_count(doc: &Document) -> usize {
    catalog_page_count(doc).unwrap_or_else(|| doc.get_pages().len())
}

fn catalog_page_count(doc: &Document) -> Option<usize> {
    let catalog_id = match doc.trailer.get(b"Root").ok()? {
        Object::Reference(id) => *id,
        _ => return None,
    };
    let catalog = doc.get_object(catalog_id).ok()?.as_dict().ok()?;

    let pages_id = match catalog.get(b"Pages").ok()? {
        Object::Reference(id) => *id,
        _ => return None,
    };
    let pages = doc.get_object(pages_id).ok()?.as_dict().ok()?;

    let count = pages.get(b"Count").ok()?.as_i64().ok()?;
    usize::try_from(count).ok()
}

/// Load a PDF file and report its page count, title and author.
pub fn probe(path: &Path) -> Result<PdfInfo> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = page_count(&doc);
    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(PdfInfo {
        page_count,
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
    })
}

/// A text entry from the trailer's Info dictionary.
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => *id,
        _ => return None,
    };
    let info = doc.get_object(info_id).ok()?.as_dict().ok()?;
    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}
